//! The dummy match - finishes instantly with a fixed score per seat
//!
//! Used by the engine self-test run level so the GA can be exercised
//! without any real game logic.

use std::sync::Arc;
use std::time::Duration;

use crate::contract::{MatchHandle, MatchSetup, SharedMatch};
use crate::gene::Gene;

/// A match that scored its players during construction
#[derive(Debug, Default)]
pub struct DummyMatch;

impl DummyMatch {
    /// Seat `i` scores `2 * i + 2`.
    pub fn start<T: Gene>(setup: MatchSetup<T>) -> SharedMatch {
        let lines: Vec<String> = setup
            .players
            .iter()
            .enumerate()
            .map(|(seat, player)| {
                player.add_to_fitness(seat as u32 * 2 + 2);
                format!("Player {} has {} points.", seat, player.fitness())
            })
            .collect();
        setup.sink.replace(&lines.join("\n"));

        Arc::new(DummyMatch)
    }
}

impl MatchHandle for DummyMatch {
    fn game_over(&self) -> bool {
        true
    }

    fn interrupted(&self) -> bool {
        false
    }

    fn run_round(&self) {}

    fn set_running(&self, _running: bool) {}

    fn interrupt(&self) {}

    fn await_completion(&self, _timeout: Duration) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::tests::Play;
    use crate::player::PlayerFactory;
    use crate::sink::MemorySink;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_dummy_match_scores_by_seat() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let factory = PlayerFactory::new(vec![Play::High; 2]);
        let players: Vec<_> = (0..4).map(|_| Arc::new(factory.random(&mut rng))).collect();
        let sink = Arc::new(MemorySink::new());

        let handle = DummyMatch::start(MatchSetup {
            players: players.clone(),
            sink: sink.clone(),
            start_running: false,
            seed: 7,
        });

        assert!(handle.game_over());
        let fitness: Vec<u64> = players.iter().map(|p| p.fitness()).collect();
        assert_eq!(fitness, vec![2, 4, 6, 8]);
        assert!(sink.contains("Player 3 has 8 points."));
    }
}
