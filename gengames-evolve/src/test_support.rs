//! Shared fixtures for unit tests

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gengames_core::{
    spawn_match, FitnessOrder, Game, GameProbe, Gene, MatchSetup, Player, PlayerFactory,
    Population, Result, SharedMatch,
};

pub const GENOME_LEN: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bit {
    Zero,
    One,
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bit::Zero => write!(f, "0"),
            Bit::One => write!(f, "1"),
        }
    }
}

impl Gene for Bit {
    fn domain(&self) -> &'static [Self] {
        &[Bit::Zero, Bit::One]
    }
}

pub fn factory() -> PlayerFactory<Bit> {
    PlayerFactory::new(vec![Bit::Zero; GENOME_LEN])
}

/// One player per score, all-zero genomes, fitness already applied
pub fn scored_population(scores: &[u32]) -> Population<Bit> {
    let factory = factory();
    let players: Vec<Player<Bit>> = scores
        .iter()
        .map(|&s| {
            let p = factory
                .from_genome(vec![Bit::Zero; GENOME_LEN])
                .unwrap();
            p.add_to_fitness(s);
            p
        })
        .collect();
    Population::from_players(players)
}

/// Two seats; each player scores one point per `One` gene after a few rounds
pub struct OnesGame {
    pub rounds: usize,
}

impl Game for OnesGame {
    type Gene = Bit;

    fn name(&self) -> &str {
        "ones"
    }

    fn probe(&self) -> Result<GameProbe<Bit>> {
        Ok(GameProbe {
            num_players: 2,
            players: factory(),
            dummy_players: PlayerFactory::new(vec![Bit::Zero]),
            fitness_order: FitnessOrder::HigherIsBetter,
        })
    }

    fn create_match(&self, setup: MatchSetup<Bit>) -> Result<SharedMatch> {
        let rounds = self.rounds;
        spawn_match("ones", setup.start_running, move |control| {
            for _ in 0..rounds {
                control.await_round()?;
            }
            for p in &setup.players {
                let ones = p.genome().iter().filter(|g| **g == Bit::One).count();
                p.add_to_fitness(ones as u32);
            }
            Ok(())
        })
    }
}

/// `OnesGame` that counts how many matches started and finished
pub struct CountingGame {
    pub inner: OnesGame,
    pub started: Arc<AtomicUsize>,
    pub finished: Arc<AtomicUsize>,
}

impl CountingGame {
    pub fn new(rounds: usize) -> Self {
        Self {
            inner: OnesGame { rounds },
            started: Arc::new(AtomicUsize::new(0)),
            finished: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Game for CountingGame {
    type Gene = Bit;

    fn name(&self) -> &str {
        "counting ones"
    }

    fn probe(&self) -> Result<GameProbe<Bit>> {
        self.inner.probe()
    }

    fn create_match(&self, setup: MatchSetup<Bit>) -> Result<SharedMatch> {
        let rounds = self.inner.rounds;
        let started = Arc::clone(&self.started);
        let finished = Arc::clone(&self.finished);
        spawn_match("counting ones", setup.start_running, move |control| {
            started.fetch_add(1, Ordering::SeqCst);
            for _ in 0..rounds {
                control.await_round()?;
            }
            for p in &setup.players {
                let ones = p.genome().iter().filter(|g| **g == Bit::One).count();
                p.add_to_fitness(ones as u32);
            }
            finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
