//! Match runner - plays one match through the game contract
//!
//! Level 2 - Phase-level implementation

use std::sync::Arc;
use std::time::Duration;

use gengames_core::{
    DummyMatch, EngineError, Fidelity, Game, LogSink, MatchSetup, Player, PlayerId, Result,
    SharedMatch,
};
use tracing::debug;

use crate::coordinator::Coordinator;

/// How long the runner sleeps on a match before re-checking for a forced stop
const COMPLETION_SLICE: Duration = Duration::from_millis(100);

/// Anything that can play one match for a tournament
pub trait MatchExecutor<T: gengames_core::Gene> {
    /// Play one match between `group`, writing fitness into the players
    fn play(&mut self, group: Vec<Arc<Player<T>>>) -> Result<()>;
}

/// Fitness gained by each participant of one completed match
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    pub scores: Vec<(PlayerId, u64)>,
}

impl MatchResult {
    /// Highest single score of the match
    pub fn top_score(&self) -> Option<u64> {
        self.scores.iter().map(|(_, s)| *s).max()
    }
}

/// Plays matches one at a time, honouring the coordinator's run flags
pub struct MatchRunner<G: Game> {
    game: Arc<G>,
    game_fidelity: Fidelity,
    num_players: usize,
    coordinator: Arc<Coordinator>,
    sink: Arc<dyn LogSink>,
    seed_counter: u64,
    matches_played: u64,
}

impl<G: Game> MatchRunner<G> {
    /// Create a runner for `game`. With `Fidelity::Dummy` the game's own
    /// matches are replaced by the instant dummy match.
    pub fn new(
        game: Arc<G>,
        game_fidelity: Fidelity,
        num_players: usize,
        coordinator: Arc<Coordinator>,
        sink: Arc<dyn LogSink>,
        seed: u64,
    ) -> Self {
        Self {
            game,
            game_fidelity,
            num_players,
            coordinator,
            sink,
            seed_counter: seed,
            matches_played: 0,
        }
    }

    pub fn matches_played(&self) -> u64 {
        self.matches_played
    }

    /// Play one match.
    ///
    /// Blocks until the coordinator authorizes play, runs the match to
    /// completion, and reports `Interrupted` if it ended abnormally.
    pub fn play_match(&mut self, players: Vec<Arc<Player<G::Gene>>>) -> Result<MatchResult> {
        if players.len() != self.num_players {
            return Err(EngineError::contract(format!(
                "a match of {} needs exactly {} players, got {}",
                self.game.name(),
                self.num_players,
                players.len()
            )));
        }

        let flags = self.coordinator.wait_for_authorization()?;
        self.coordinator.ensure_idle()?;

        let before: Vec<u64> = players.iter().map(|p| p.fitness()).collect();
        let ids: Vec<PlayerId> = players.iter().map(|p| p.id()).collect();
        let handle = self.start(players.clone(), flags.match_should_run())?;
        self.coordinator.install(Arc::clone(&handle))?;

        while !handle.await_completion(COMPLETION_SLICE) {
            if self.coordinator.abort_requested() {
                handle.interrupt();
            }
        }
        self.coordinator.release();

        if !handle.game_over() {
            debug!(game = self.game.name(), "match interrupted");
            if self.coordinator.is_shut_down() {
                return Err(EngineError::Shutdown);
            }
            return Err(EngineError::Interrupted);
        }

        self.matches_played += 1;
        let scores = ids
            .into_iter()
            .zip(players.iter().zip(before))
            .map(|(id, (p, b))| (id, p.fitness().saturating_sub(b)))
            .collect();
        let result = MatchResult { scores };
        debug!(
            game = self.game.name(),
            matches = self.matches_played,
            top = ?result.top_score(),
            "match finished"
        );
        Ok(result)
    }

    fn start(&mut self, players: Vec<Arc<Player<G::Gene>>>, start_running: bool) -> Result<SharedMatch> {
        let setup = MatchSetup {
            players,
            sink: Arc::clone(&self.sink),
            start_running,
            seed: self.next_seed(),
        };
        match self.game_fidelity {
            Fidelity::Dummy => Ok(DummyMatch::start(setup)),
            Fidelity::Real => self.game.create_match(setup).map_err(|e| match e {
                EngineError::ContractViolation(_) => e,
                other => EngineError::contract(format!(
                    "{} failed to start a match: {}",
                    self.game.name(),
                    other
                )),
            }),
        }
    }

    fn next_seed(&mut self) -> u64 {
        let seed = self.seed_counter;
        self.seed_counter = self.seed_counter.wrapping_add(1);
        seed
    }
}

impl<G: Game> MatchExecutor<G::Gene> for MatchRunner<G> {
    fn play(&mut self, group: Vec<Arc<Player<G::Gene>>>) -> Result<()> {
        self.play_match(group).map(|_| ())
    }
}
