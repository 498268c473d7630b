//! The coordinator between the evolution thread and the active match
//!
//! Level 3 - Step-level implementation
//!
//! Holds the only cross-thread mutable state of the engine: the run flags
//! set by the shell and the slot for the (at most one) active match. Both
//! live behind one mutex; waiting is done on a condition variable so the
//! evolution thread sleeps until a command arrives instead of polling.

use std::sync::{Condvar, Mutex, PoisonError};

use gengames_core::control::lock;
use gengames_core::{EngineError, Result, SharedMatch};

/// Advisory run commands, consumed between matches and rounds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunFlags {
    /// Run continuously
    pub running: bool,
    /// Finish the current (or next) generation, then pause
    pub step_generation: bool,
    /// Play the next match, then pause
    pub step_game: bool,
    /// Play exactly one round of the active match
    pub step_round: bool,
}

impl RunFlags {
    /// Any kind of work authorized
    pub fn any(&self) -> bool {
        self.running || self.step_generation || self.step_game || self.step_round
    }

    /// Whether a newly started match should begin unpaused
    pub fn match_should_run(&self) -> bool {
        self.running || self.step_generation || self.step_game
    }
}

#[derive(Default)]
struct CoordinatorState {
    flags: RunFlags,
    /// Clear the run commands once the active match is released
    pause_after_match: bool,
    abort: bool,
    shutdown: bool,
    active: Option<SharedMatch>,
}

/// Run flags plus the single active-match slot
#[derive(Default)]
pub struct Coordinator {
    state: Mutex<CoordinatorState>,
    changed: Condvar,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Shell commands
    // ========================================================================

    /// Run continuously (`true`) or pause (`false`)
    pub fn set_running(&self, running: bool) {
        let mut state = lock(&self.state);
        state.flags.running = running;
        state.pause_after_match = false;
        if let Some(active) = &state.active {
            active.set_running(running);
        }
        self.changed.notify_all();
    }

    /// Authorize one generation
    pub fn step_generation(&self) {
        let mut state = lock(&self.state);
        state.flags.step_generation = true;
        state.pause_after_match = false;
        if let Some(active) = &state.active {
            active.set_running(true);
        }
        self.changed.notify_all();
    }

    /// Authorize one match. An unfinished active match is resumed and
    /// everything pauses once it is released; otherwise the next match
    /// starts running and pauses the same way.
    pub fn step_game(&self) {
        let mut state = lock(&self.state);
        let resumed = match &state.active {
            Some(active) if !active.game_over() => {
                active.set_running(true);
                true
            }
            _ => false,
        };
        if resumed {
            state.pause_after_match = true;
        } else {
            state.flags.step_game = true;
        }
        self.changed.notify_all();
    }

    /// Authorize one round. Forwarded to the active match if there is one,
    /// otherwise it starts the next match paused and plays its first round.
    pub fn step_round(&self) {
        let mut state = lock(&self.state);
        let forwarded = match &state.active {
            Some(active) if !active.game_over() => {
                active.run_round();
                true
            }
            _ => false,
        };
        if !forwarded {
            state.flags.step_round = true;
        }
        self.changed.notify_all();
    }

    /// Clear every run command and pause the active match
    pub fn pause(&self) {
        let mut state = lock(&self.state);
        state.flags = RunFlags::default();
        state.pause_after_match = false;
        if let Some(active) = &state.active {
            active.set_running(false);
        }
        self.changed.notify_all();
    }

    /// Forced stop: clear run commands, interrupt the active match, and make
    /// the evolution thread abandon what it is doing.
    pub fn request_abort(&self) {
        let mut state = lock(&self.state);
        state.flags = RunFlags::default();
        state.pause_after_match = false;
        state.abort = true;
        if let Some(active) = &state.active {
            active.interrupt();
        }
        self.changed.notify_all();
    }

    /// Terminal stop of the evolution thread
    pub fn shutdown(&self) {
        let mut state = lock(&self.state);
        state.flags = RunFlags::default();
        state.pause_after_match = false;
        state.shutdown = true;
        if let Some(active) = &state.active {
            active.interrupt();
        }
        self.changed.notify_all();
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn flags(&self) -> RunFlags {
        lock(&self.state).flags
    }

    /// An unfinished match holds the slot
    pub fn match_in_progress(&self) -> bool {
        lock(&self.state)
            .active
            .as_ref()
            .map_or(false, |m| !m.game_over())
    }

    pub fn abort_requested(&self) -> bool {
        let state = lock(&self.state);
        state.abort || state.shutdown
    }

    pub fn is_shut_down(&self) -> bool {
        lock(&self.state).shutdown
    }

    // ========================================================================
    // Evolution-thread side
    // ========================================================================

    /// Block until some work is authorized.
    ///
    /// Fails with `Interrupted` if a forced stop is pending and with
    /// `Shutdown` once the controller is shutting down.
    pub fn wait_for_authorization(&self) -> Result<RunFlags> {
        let mut state = lock(&self.state);
        loop {
            if state.shutdown {
                return Err(EngineError::Shutdown);
            }
            if state.abort {
                return Err(EngineError::Interrupted);
            }
            if state.flags.any() {
                return Ok(state.flags);
            }
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Forget a forced stop once it has been handled
    pub fn clear_abort(&self) {
        lock(&self.state).abort = false;
    }

    /// Fail unless the match slot is free
    pub fn ensure_idle(&self) -> Result<()> {
        match &lock(&self.state).active {
            Some(active) if !active.game_over() => Err(EngineError::ConcurrencyViolation(
                "tried to start a new match while another was running".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Put a freshly constructed match in the slot.
    ///
    /// Consumes the single-match and single-round commands and applies the
    /// run state current at this moment, so a pause that arrived while the
    /// match was being constructed is not lost.
    pub fn install(&self, handle: SharedMatch) -> Result<()> {
        let mut state = lock(&self.state);
        if let Some(active) = &state.active {
            if !active.game_over() {
                return Err(EngineError::ConcurrencyViolation(
                    "tried to start a new match while another was running".to_string(),
                ));
            }
        }

        if state.abort || state.shutdown {
            handle.interrupt();
        } else {
            handle.set_running(state.flags.match_should_run());
            if state.flags.step_round {
                handle.run_round();
            }
        }
        state.flags.step_game = false;
        state.flags.step_round = false;
        state.active = Some(handle);
        Ok(())
    }

    /// Empty the match slot, applying a pending pause-after-match
    pub fn release(&self) {
        let mut state = lock(&self.state);
        state.active = None;
        if state.pause_after_match {
            state.pause_after_match = false;
            state.flags = RunFlags::default();
        }
        self.changed.notify_all();
    }

    /// The generation that was authorized has completed
    pub fn finish_generation(&self) {
        lock(&self.state).flags.step_generation = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gengames_core::{MatchControl, MatchHandle};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_flags_start_cleared() {
        let coordinator = Coordinator::new();
        assert!(!coordinator.flags().any());
        assert!(!coordinator.match_in_progress());
    }

    #[test]
    fn test_second_match_is_rejected() {
        let coordinator = Coordinator::new();
        let first: SharedMatch = Arc::new(MatchControl::new(false));
        let second: SharedMatch = Arc::new(MatchControl::new(false));

        coordinator.install(first).unwrap();
        assert!(coordinator.match_in_progress());
        assert!(matches!(
            coordinator.install(second),
            Err(EngineError::ConcurrencyViolation(_))
        ));
        assert!(matches!(
            coordinator.ensure_idle(),
            Err(EngineError::ConcurrencyViolation(_))
        ));
    }

    #[test]
    fn test_finished_match_frees_the_slot() {
        let coordinator = Coordinator::new();
        let first = Arc::new(MatchControl::new(true));
        coordinator.install(first.clone()).unwrap();
        first.finish();
        assert!(coordinator.ensure_idle().is_ok());
        coordinator.release();
        assert!(!coordinator.match_in_progress());
    }

    #[test]
    fn test_install_consumes_game_and_round_steps() {
        let coordinator = Coordinator::new();
        coordinator.step_game();
        coordinator.step_round();
        let handle = Arc::new(MatchControl::new(false));
        coordinator.install(handle.clone()).unwrap();

        let flags = coordinator.flags();
        assert!(!flags.step_game);
        assert!(!flags.step_round);
        assert!(handle.is_running());
    }

    #[test]
    fn test_step_game_on_active_match_pauses_at_release() {
        let coordinator = Coordinator::new();
        coordinator.step_round();
        let handle = Arc::new(MatchControl::new(false));
        coordinator.install(handle.clone()).unwrap();

        coordinator.step_game();
        assert!(handle.is_running());
        assert!(!coordinator.flags().step_game);

        handle.finish();
        coordinator.release();
        assert!(!coordinator.flags().any());
    }

    #[test]
    fn test_step_game_without_active_match_sets_flag() {
        let coordinator = Coordinator::new();
        coordinator.step_game();
        assert!(coordinator.flags().step_game);
        coordinator.release();
        assert!(coordinator.flags().step_game);
    }

    #[test]
    fn test_later_run_command_cancels_pause_after_match() {
        let coordinator = Coordinator::new();
        let handle = Arc::new(MatchControl::new(false));
        coordinator.install(handle.clone()).unwrap();

        coordinator.step_game();
        coordinator.step_generation();
        handle.finish();
        coordinator.release();
        assert!(coordinator.flags().step_generation);
    }

    #[test]
    fn test_commands_are_forwarded_to_active_match() {
        let coordinator = Coordinator::new();
        let handle = Arc::new(MatchControl::new(false));
        coordinator.install(handle.clone()).unwrap();

        coordinator.set_running(true);
        assert!(handle.is_running());
        coordinator.pause();
        assert!(!handle.is_running());

        coordinator.request_abort();
        assert!(handle.interrupted());
        assert!(coordinator.abort_requested());
    }

    #[test]
    fn test_wait_for_authorization_wakes_on_command() {
        let coordinator = Arc::new(Coordinator::new());
        let waiter = {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || coordinator.wait_for_authorization())
        };
        thread::sleep(Duration::from_millis(10));
        coordinator.step_generation();
        let flags = waiter.join().unwrap().unwrap();
        assert!(flags.step_generation);
    }

    #[test]
    fn test_wait_for_authorization_reports_abort_and_shutdown() {
        let coordinator = Coordinator::new();
        coordinator.request_abort();
        assert_eq!(coordinator.wait_for_authorization(), Err(EngineError::Interrupted));
        coordinator.clear_abort();

        coordinator.shutdown();
        assert_eq!(coordinator.wait_for_authorization(), Err(EngineError::Shutdown));
    }
}
