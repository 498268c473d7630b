//! Match-side control for games that play on their own thread
//!
//! `MatchControl` is the state shared between a match thread and whoever
//! drives it: a running flag, a pending single-round request, and the
//! interrupted / over flags. Waiting uses a condition variable, so neither
//! side spins while the match is paused.
//!
//! Games usually call [`spawn_match`] with a closure that loops
//! `control.await_round()?; play_round();` and commits fitness at the end.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use crate::contract::{MatchHandle, SharedMatch};
use crate::error::{EngineError, Result};

/// Lock a mutex, recovering the data if a panicking thread poisoned it.
/// Everything guarded in this workspace is plain flags and counters.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returned to a match body when it has been told to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("match interrupted")]
pub struct MatchInterrupted;

#[derive(Debug, Default)]
struct ControlState {
    running: bool,
    round_requested: bool,
    interrupted: bool,
    over: bool,
}

/// Shared control state of one match
#[derive(Debug, Default)]
pub struct MatchControl {
    state: Mutex<ControlState>,
    changed: Condvar,
}

impl MatchControl {
    pub fn new(start_running: bool) -> Self {
        Self {
            state: Mutex::new(ControlState {
                running: start_running,
                ..Default::default()
            }),
            changed: Condvar::new(),
        }
    }

    /// Block the match thread until it may play a round.
    ///
    /// Returns immediately while running; otherwise waits for a round
    /// request (which it consumes) or for `set_running(true)`.
    pub fn await_round(&self) -> std::result::Result<(), MatchInterrupted> {
        let mut state = lock(&self.state);
        loop {
            if state.interrupted {
                return Err(MatchInterrupted);
            }
            if state.running || state.round_requested {
                state.round_requested = false;
                return Ok(());
            }
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Cheap checkpoint for use inside a long round
    pub fn check_interrupted(&self) -> std::result::Result<(), MatchInterrupted> {
        if lock(&self.state).interrupted {
            Err(MatchInterrupted)
        } else {
            Ok(())
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    /// Mark the match over. Call only after fitness has been written.
    pub fn finish(&self) {
        let mut state = lock(&self.state);
        state.over = true;
        state.running = false;
        self.changed.notify_all();
    }

    /// Mark the match as abnormally ended (unless it already finished)
    pub fn abandon(&self) {
        let mut state = lock(&self.state);
        if !state.over {
            state.interrupted = true;
        }
        self.changed.notify_all();
    }
}

impl MatchHandle for MatchControl {
    fn game_over(&self) -> bool {
        lock(&self.state).over
    }

    fn interrupted(&self) -> bool {
        lock(&self.state).interrupted
    }

    fn run_round(&self) {
        let mut state = lock(&self.state);
        state.round_requested = true;
        self.changed.notify_all();
    }

    fn set_running(&self, running: bool) {
        let mut state = lock(&self.state);
        state.running = running;
        self.changed.notify_all();
    }

    fn interrupt(&self) {
        self.abandon();
    }

    fn await_completion(&self, timeout: Duration) -> bool {
        let state = lock(&self.state);
        let (state, _) = self
            .changed
            .wait_timeout_while(state, timeout, |s| !(s.over || s.interrupted))
            .unwrap_or_else(PoisonError::into_inner);
        state.over || state.interrupted
    }
}

/// Marks the match abandoned if its thread exits without finishing,
/// including by panic.
struct ExitGuard(Arc<MatchControl>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.abandon();
    }
}

/// A match running on its own thread
struct ThreadedMatch {
    control: Arc<MatchControl>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl MatchHandle for ThreadedMatch {
    fn game_over(&self) -> bool {
        self.control.game_over()
    }

    fn interrupted(&self) -> bool {
        self.control.interrupted()
    }

    fn run_round(&self) {
        self.control.run_round();
    }

    fn set_running(&self, running: bool) {
        self.control.set_running(running);
    }

    fn interrupt(&self) {
        self.control.interrupt();
    }

    fn await_completion(&self, timeout: Duration) -> bool {
        self.control.await_completion(timeout)
    }
}

impl Drop for ThreadedMatch {
    fn drop(&mut self) {
        self.control.interrupt();
        if let Some(handle) = lock(&self.thread).take() {
            let _ = handle.join();
        }
    }
}

/// Run `body` on a new thread as one match.
///
/// The body returns `Ok` after committing fitness, which marks the match
/// over; returning `Err(MatchInterrupted)` or panicking marks it
/// interrupted.
pub fn spawn_match<F>(name: &str, start_running: bool, body: F) -> Result<SharedMatch>
where
    F: FnOnce(&MatchControl) -> std::result::Result<(), MatchInterrupted> + Send + 'static,
{
    let control = Arc::new(MatchControl::new(start_running));
    let guard = ExitGuard(Arc::clone(&control));

    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            if body(guard.0.as_ref()).is_ok() {
                guard.0.finish();
            }
        })
        .map_err(|e| EngineError::contract(format!("could not start match thread: {}", e)))?;

    Ok(Arc::new(ThreadedMatch {
        control,
        thread: Mutex::new(Some(handle)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WAIT: Duration = Duration::from_secs(5);

    fn counting_match(rounds: usize, start_running: bool) -> (SharedMatch, Arc<AtomicUsize>) {
        let played = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&played);
        let handle = spawn_match("test-match", start_running, move |control| {
            for _ in 0..rounds {
                control.await_round()?;
                counter.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        })
        .unwrap();
        (handle, played)
    }

    /// Wait until `played` reaches `n` or give up
    fn wait_for_count(played: &AtomicUsize, n: usize) -> bool {
        let deadline = std::time::Instant::now() + WAIT;
        while std::time::Instant::now() < deadline {
            if played.load(Ordering::SeqCst) >= n {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_running_match_plays_to_completion() {
        let (handle, played) = counting_match(5, true);
        assert!(handle.await_completion(WAIT));
        assert!(handle.game_over());
        assert!(!handle.interrupted());
        assert_eq!(played.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_paused_match_plays_one_round_per_request() {
        let (handle, played) = counting_match(3, false);
        assert!(!handle.await_completion(Duration::from_millis(20)));
        assert_eq!(played.load(Ordering::SeqCst), 0);

        handle.run_round();
        assert!(wait_for_count(&played, 1));
        assert!(!handle.await_completion(Duration::from_millis(20)));
        assert_eq!(played.load(Ordering::SeqCst), 1);

        handle.set_running(true);
        assert!(handle.await_completion(WAIT));
        assert_eq!(played.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_interrupt_paused_match() {
        let (handle, played) = counting_match(3, false);
        handle.interrupt();
        assert!(handle.await_completion(WAIT));
        assert!(handle.interrupted());
        assert!(!handle.game_over());
        assert_eq!(played.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_interrupt_after_finish_is_ignored() {
        let (handle, _) = counting_match(1, true);
        assert!(handle.await_completion(WAIT));
        handle.interrupt();
        assert!(handle.game_over());
        assert!(!handle.interrupted());
    }

    #[test]
    fn test_panicking_match_reports_interrupted() {
        let handle = spawn_match("panics", true, |_control| -> std::result::Result<(), MatchInterrupted> {
            panic!("game bug")
        })
        .unwrap();
        assert!(handle.await_completion(WAIT));
        assert!(handle.interrupted());
    }
}
