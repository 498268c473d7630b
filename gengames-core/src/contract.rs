//! The Game Execution Contract
//!
//! A pluggable game hands the engine two capabilities:
//! - a side-effect free probe describing the game (seat count, player
//!   factories, which direction of fitness wins)
//! - a match constructor that starts one match between a fixed group of
//!   players and returns a handle to control it
//!
//! The match runs by the game's own logic, usually on its own thread, and
//! writes each participant's fitness before it reports `game_over()`.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{EngineError, Result};
use crate::gene::Gene;
use crate::player::{FitnessOrder, Player, PlayerFactory};
use crate::run_level::Fidelity;
use crate::sink::LogSink;

/// Interval used by handles that can only be polled
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Handle to a running match
pub type SharedMatch = Arc<dyn MatchHandle>;

/// Lifecycle queries and controls of one match.
pub trait MatchHandle: Send + Sync {
    /// Terminal state reached and fitness already committed
    fn game_over(&self) -> bool;

    /// The match terminated abnormally and will never finish
    fn interrupted(&self) -> bool;

    /// Play exactly one unit of play, then pause again
    fn run_round(&self);

    /// Pause (`false`) or resume (`true`)
    fn set_running(&self, running: bool);

    /// Ask the match to stop immediately. A finished match ignores this.
    fn interrupt(&self);

    /// Block for at most `timeout` waiting for the match to end.
    /// Returns `true` once the match is over or interrupted.
    ///
    /// The default polls; handles with a wake-up mechanism override it.
    fn await_completion(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.game_over() || self.interrupted() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

/// Everything a game receives when asked to start a match
pub struct MatchSetup<T: Gene> {
    /// Exactly `num_players` players, borrowed for fitness writes only
    pub players: Vec<Arc<Player<T>>>,
    /// The match-level log
    pub sink: Arc<dyn LogSink>,
    /// Whether play may begin without waiting for a run/round command
    pub start_running: bool,
    /// Seed for any randomness the match needs
    pub seed: u64,
}

/// What a game declares about itself, obtained without starting a match
#[derive(Debug)]
pub struct GameProbe<T: Gene> {
    /// Seats per match
    pub num_players: usize,
    /// Factory for real players
    pub players: PlayerFactory<T>,
    /// Factory for cheap players with a short genome
    pub dummy_players: PlayerFactory<T>,
    /// Whether higher or lower fitness wins
    pub fitness_order: FitnessOrder,
}

impl<T: Gene> GameProbe<T> {
    /// The factory matching a fidelity
    pub fn factory(&self, fidelity: Fidelity) -> &PlayerFactory<T> {
        match fidelity {
            Fidelity::Real => &self.players,
            Fidelity::Dummy => &self.dummy_players,
        }
    }

    /// Reject probes the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.num_players == 0 {
            return Err(EngineError::contract("a game must seat at least one player"));
        }
        if self.players.genome_len() == 0 || self.dummy_players.genome_len() == 0 {
            return Err(EngineError::contract("player genomes must not be empty"));
        }
        Ok(())
    }
}

/// A pluggable game.
pub trait Game: Send + Sync + 'static {
    /// The gene type of this game's players
    type Gene: Gene;

    /// Display name
    fn name(&self) -> &str;

    /// Describe the game. Must not start a match or have other side effects.
    fn probe(&self) -> Result<GameProbe<Self::Gene>>;

    /// Start one match between exactly `num_players` players.
    fn create_match(&self, setup: MatchSetup<Self::Gene>) -> Result<SharedMatch>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::tests::Play;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountdownMatch {
        polls_left: AtomicUsize,
    }

    impl MatchHandle for CountdownMatch {
        fn game_over(&self) -> bool {
            let left = self.polls_left.load(Ordering::SeqCst);
            if left > 0 {
                self.polls_left.store(left - 1, Ordering::SeqCst);
            }
            left == 0
        }
        fn interrupted(&self) -> bool {
            false
        }
        fn run_round(&self) {}
        fn set_running(&self, _running: bool) {}
        fn interrupt(&self) {}
    }

    #[test]
    fn test_default_await_completion_polls_until_over() {
        let handle = CountdownMatch {
            polls_left: AtomicUsize::new(2),
        };
        assert!(handle.await_completion(Duration::from_secs(5)));
    }

    #[test]
    fn test_default_await_completion_times_out() {
        let handle = CountdownMatch {
            polls_left: AtomicUsize::new(usize::MAX),
        };
        assert!(!handle.await_completion(Duration::from_millis(10)));
    }

    #[test]
    fn test_probe_validation() {
        let probe = GameProbe {
            num_players: 0,
            players: PlayerFactory::new(vec![Play::High]),
            dummy_players: PlayerFactory::new(vec![Play::High]),
            fitness_order: FitnessOrder::HigherIsBetter,
        };
        assert!(matches!(probe.validate(), Err(EngineError::ContractViolation(_))));

        let probe = GameProbe {
            num_players: 2,
            players: PlayerFactory::new(vec![Play::High; 3]),
            dummy_players: PlayerFactory::new(Vec::new()),
            fitness_order: FitnessOrder::HigherIsBetter,
        };
        assert!(probe.validate().is_err());
    }

    #[test]
    fn test_probe_factory_by_fidelity() {
        let probe = GameProbe {
            num_players: 2,
            players: PlayerFactory::new(vec![Play::High; 5]),
            dummy_players: PlayerFactory::new(vec![Play::High]),
            fitness_order: FitnessOrder::HigherIsBetter,
        };
        assert!(probe.validate().is_ok());
        assert_eq!(probe.factory(Fidelity::Real).genome_len(), 5);
        assert_eq!(probe.factory(Fidelity::Dummy).genome_len(), 1);
    }
}
