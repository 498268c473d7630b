//! High Card - a small trick-taking game
//!
//! Four players are dealt thirteen cards each. Every round is one trick:
//! each seat plays a card chosen by the gene for that trick, the highest
//! card takes the trick (ties go to the earlier seat), and each trick is
//! worth one point. The match ends when the hands are empty.

use std::fmt;
use std::sync::Arc;

use gengames_core::{
    spawn_match, EngineError, FitnessOrder, Game, GameProbe, Gene, LogSink, MatchSetup,
    PlayerFactory, Result, SharedMatch,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const SEATS: usize = 4;
pub const HAND_SIZE: usize = 13;
pub const GENOME_LEN: usize = 5;
pub const DUMMY_GENOME_LEN: usize = 1;

/// Which card to play from the hand
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayStyle {
    Lowest,
    Highest,
    Random,
    Middle,
}

impl PlayStyle {
    pub const ALL: [PlayStyle; 4] = [
        PlayStyle::Lowest,
        PlayStyle::Highest,
        PlayStyle::Random,
        PlayStyle::Middle,
    ];

    /// Index of the card to play from a hand sorted ascending
    pub fn choose<R: Rng + ?Sized>(self, hand_len: usize, rng: &mut R) -> usize {
        match self {
            PlayStyle::Lowest => 0,
            PlayStyle::Highest => hand_len.saturating_sub(1),
            PlayStyle::Middle => hand_len / 2,
            PlayStyle::Random => rng.gen_range(0..hand_len.max(1)),
        }
    }
}

impl fmt::Display for PlayStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayStyle::Lowest => "low",
            PlayStyle::Highest => "high",
            PlayStyle::Random => "random",
            PlayStyle::Middle => "middle",
        };
        write!(f, "{}", name)
    }
}

impl Gene for PlayStyle {
    fn domain(&self) -> &'static [Self] {
        &Self::ALL
    }
}

/// Seat that takes the trick: highest card, earliest seat on ties
pub fn trick_winner(cards: &[u8]) -> Option<usize> {
    cards
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, u8)>, (seat, &card)| match best {
            Some((_, top)) if top >= card => best,
            _ => Some((seat, card)),
        })
        .map(|(seat, _)| seat)
}

/// Hands, strategies and points of one match
struct Table {
    hands: Vec<Vec<u8>>,
    strategies: Vec<Vec<PlayStyle>>,
    points: Vec<u32>,
    rng: ChaCha8Rng,
}

impl Table {
    fn deal(strategies: Vec<Vec<PlayStyle>>, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut deck: Vec<u8> = (0..SEATS as u8)
            .flat_map(|_| 1..=HAND_SIZE as u8)
            .collect();
        deck.shuffle(&mut rng);

        let hands = deck
            .chunks(HAND_SIZE)
            .map(|chunk| {
                let mut hand = chunk.to_vec();
                hand.sort_unstable();
                hand
            })
            .collect();

        Self {
            hands,
            points: vec![0; strategies.len()],
            strategies,
            rng,
        }
    }

    /// Play trick number `trick`; returns the cards played and the winner
    fn play_trick(&mut self, trick: usize) -> (Vec<u8>, Option<usize>) {
        let mut cards = Vec::with_capacity(self.hands.len());
        for (hand, genome) in self.hands.iter_mut().zip(&self.strategies) {
            if hand.is_empty() || genome.is_empty() {
                continue;
            }
            let style = genome[trick % genome.len()];
            let index = style.choose(hand.len(), &mut self.rng);
            cards.push(hand.remove(index));
        }
        let winner = trick_winner(&cards);
        if let Some(seat) = winner {
            self.points[seat] += 1;
        }
        (cards, winner)
    }
}

/// The High Card game
#[derive(Clone, Copy, Debug, Default)]
pub struct HighCard;

impl HighCard {
    pub fn new() -> Self {
        Self
    }
}

impl Game for HighCard {
    type Gene = PlayStyle;

    fn name(&self) -> &str {
        "highcard"
    }

    fn probe(&self) -> Result<GameProbe<PlayStyle>> {
        Ok(GameProbe {
            num_players: SEATS,
            players: PlayerFactory::new(vec![PlayStyle::Lowest; GENOME_LEN]),
            dummy_players: PlayerFactory::new(vec![PlayStyle::Lowest; DUMMY_GENOME_LEN]),
            fitness_order: FitnessOrder::HigherIsBetter,
        })
    }

    fn create_match(&self, setup: MatchSetup<PlayStyle>) -> Result<SharedMatch> {
        if setup.players.len() != SEATS {
            return Err(EngineError::contract(format!(
                "highcard seats {} players, got {}",
                SEATS,
                setup.players.len()
            )));
        }

        let strategies = setup.players.iter().map(|p| p.genome().to_vec()).collect();
        let mut table = Table::deal(strategies, setup.seed);
        let sink: Arc<dyn LogSink> = Arc::clone(&setup.sink);
        let players = setup.players;

        sink.replace("New game of High Card");
        for (seat, p) in players.iter().enumerate() {
            sink.append_line(&format!("Seat {}: {}", seat, p));
        }

        spawn_match("highcard", setup.start_running, move |control| {
            for trick in 0..HAND_SIZE {
                control.await_round()?;
                let (cards, winner) = table.play_trick(trick);
                let shown: Vec<String> = cards.iter().map(|c| c.to_string()).collect();
                match winner {
                    Some(seat) => sink.append_line(&format!(
                        "Trick {}: [{}], seat {} takes it",
                        trick + 1,
                        shown.join(", "),
                        seat
                    )),
                    None => sink.append_line(&format!("Trick {}: no cards played", trick + 1)),
                }
            }

            control.check_interrupted()?;
            for (seat, (player, points)) in players.iter().zip(&table.points).enumerate() {
                player.add_to_fitness(*points);
                sink.append_line(&format!("Player {} has {} points.", seat, points));
            }
            debug!(points = ?table.points, "highcard match finished");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gengames_core::{MatchHandle, MemorySink, Player};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(10);

    fn seated(genomes: [Vec<PlayStyle>; 4]) -> Vec<Arc<Player<PlayStyle>>> {
        let factory = HighCard.probe().unwrap().players;
        genomes
            .into_iter()
            .map(|g| Arc::new(factory.from_genome(g).unwrap()))
            .collect()
    }

    fn setup(players: Vec<Arc<Player<PlayStyle>>>, sink: Arc<MemorySink>, running: bool) -> MatchSetup<PlayStyle> {
        MatchSetup {
            players,
            sink,
            start_running: running,
            seed: 42,
        }
    }

    #[test]
    fn test_trick_winner() {
        assert_eq!(trick_winner(&[3, 9, 2, 9]), Some(1));
        assert_eq!(trick_winner(&[13]), Some(0));
        assert_eq!(trick_winner(&[]), None);
    }

    #[test]
    fn test_choose_by_style() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(PlayStyle::Lowest.choose(5, &mut rng), 0);
        assert_eq!(PlayStyle::Highest.choose(5, &mut rng), 4);
        assert_eq!(PlayStyle::Middle.choose(5, &mut rng), 2);
        for _ in 0..100 {
            assert!(PlayStyle::Random.choose(5, &mut rng) < 5);
        }
    }

    #[test]
    fn test_mutation_never_repeats() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for style in PlayStyle::ALL {
            for _ in 0..1000 {
                assert_ne!(style.mutate(&mut rng), style);
            }
        }
    }

    #[test]
    fn test_deal_is_complete() {
        let table = Table::deal(vec![vec![PlayStyle::Lowest]; SEATS], 7);
        assert_eq!(table.hands.len(), SEATS);
        assert!(table.hands.iter().all(|h| h.len() == HAND_SIZE));
        let total: u32 = table.hands.iter().flatten().map(|&c| c as u32).sum();
        assert_eq!(total, 4 * (1..=13).sum::<u32>());
    }

    #[test]
    fn test_probe() {
        let probe = HighCard.probe().unwrap();
        assert!(probe.validate().is_ok());
        assert_eq!(probe.num_players, 4);
        assert_eq!(probe.players.genome_len(), GENOME_LEN);
        assert_eq!(probe.dummy_players.genome_len(), DUMMY_GENOME_LEN);
    }

    #[test]
    fn test_wrong_player_count_is_rejected() {
        let mut players = seated(std::array::from_fn(|_| vec![PlayStyle::Lowest; GENOME_LEN]));
        players.pop();
        let result = HighCard.create_match(setup(players, Arc::new(MemorySink::new()), true));
        assert!(matches!(result, Err(EngineError::ContractViolation(_))));
    }

    #[test]
    fn test_running_match_awards_every_trick() {
        let players = seated([
            vec![PlayStyle::Highest; GENOME_LEN],
            vec![PlayStyle::Lowest; GENOME_LEN],
            vec![PlayStyle::Middle; GENOME_LEN],
            vec![PlayStyle::Random; GENOME_LEN],
        ]);
        let sink = Arc::new(MemorySink::new());
        let handle = HighCard.create_match(setup(players.clone(), sink.clone(), true)).unwrap();
        assert!(handle.await_completion(WAIT));
        assert!(handle.game_over());

        let total: u64 = players.iter().map(|p| p.fitness()).sum();
        assert_eq!(total, HAND_SIZE as u64);
        assert!(sink.contains("Player 0 has"));
    }

    #[test]
    fn test_paused_match_plays_one_trick_per_round() {
        let players = seated(std::array::from_fn(|_| vec![PlayStyle::Highest; GENOME_LEN]));
        let sink = Arc::new(MemorySink::new());
        let handle = HighCard.create_match(setup(players.clone(), sink.clone(), false)).unwrap();

        handle.run_round();
        let deadline = std::time::Instant::now() + WAIT;
        while !sink.contains("Trick 1:") && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(sink.contains("Trick 1:"));
        assert!(!handle.game_over());
        assert!(!sink.contains("Trick 2:"));

        handle.set_running(true);
        assert!(handle.await_completion(WAIT));
        assert!(handle.game_over());
    }

    #[test]
    fn test_interrupted_match_commits_nothing() {
        let players = seated(std::array::from_fn(|_| vec![PlayStyle::Highest; GENOME_LEN]));
        let handle = HighCard
            .create_match(setup(players.clone(), Arc::new(MemorySink::new()), false))
            .unwrap();
        handle.interrupt();
        assert!(handle.await_completion(WAIT));
        assert!(handle.interrupted());
        assert!(!handle.game_over());
        assert!(players.iter().all(|p| p.fitness() == 0));
    }
}
