//! Players, their fitness, and the factory that builds them

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::gene::Gene;

/// Opaque player identity. Two players with equal genomes are still
/// different players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A strategy-encoded agent.
///
/// The genome is fixed-length for the player's whole lifetime. Fitness only
/// grows while matches are played and is cleared between generations. It is
/// stored atomically because the match writing it runs on its own thread.
#[derive(Debug)]
pub struct Player<T: Gene> {
    id: PlayerId,
    genome: Vec<T>,
    fitness: AtomicU64,
}

impl<T: Gene> Player<T> {
    fn new(id: PlayerId, genome: Vec<T>) -> Self {
        Self {
            id,
            genome,
            fitness: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// The player's strategy
    pub fn genome(&self) -> &[T] {
        &self.genome
    }

    /// Accumulated fitness since the last reset
    pub fn fitness(&self) -> u64 {
        self.fitness.load(AtomicOrdering::Acquire)
    }

    /// Record a match score. Scores never decrease fitness; games where a
    /// low score is good say so through their [`FitnessOrder`].
    pub fn add_to_fitness(&self, score: u32) {
        let _ = self
            .fitness
            .fetch_update(AtomicOrdering::AcqRel, AtomicOrdering::Acquire, |f| {
                Some(f.saturating_add(u64::from(score)))
            });
    }

    /// Reset fitness to zero (between generations only)
    pub fn clear_fitness(&self) {
        self.fitness.store(0, AtomicOrdering::Release);
    }

    /// Mutate exactly one uniformly chosen gene. Returns the position changed.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        if self.genome.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.genome.len());
        self.genome[index] = self.genome[index].mutate(rng);
        Some(index)
    }

    /// Long description of the strategy, one gene per entry
    pub fn trait_description(&self) -> String {
        self.genome
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<T: Gene> Clone for Player<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            genome: self.genome.clone(),
            fitness: AtomicU64::new(self.fitness()),
        }
    }
}

impl<T: Gene> fmt::Display for Player<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {} [{}]", self.id, self.trait_description())
    }
}

/// Which direction of fitness wins, as declared by the game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FitnessOrder {
    /// Bigger scores are better (most games)
    #[default]
    HigherIsBetter,
    /// Smaller scores are better (e.g. penalty-point card games)
    LowerIsBetter,
}

impl FitnessOrder {
    /// Ordering that sorts the better player first
    pub fn best_first<T: Gene>(&self, a: &Player<T>, b: &Player<T>) -> Ordering {
        self.compare_scores(a.fitness(), b.fitness())
    }

    /// Same ordering, on raw fitness values
    pub fn compare_scores(&self, a: u64, b: u64) -> Ordering {
        match self {
            FitnessOrder::HigherIsBetter => b.cmp(&a),
            FitnessOrder::LowerIsBetter => a.cmp(&b),
        }
    }
}

/// Builds players for one game, either randomized or from a given genome.
///
/// The template holds one representative gene per position; random players
/// draw each position uniformly from that gene's domain.
#[derive(Debug)]
pub struct PlayerFactory<T: Gene> {
    template: Vec<T>,
    next_id: AtomicU64,
}

impl<T: Gene> PlayerFactory<T> {
    pub fn new(template: Vec<T>) -> Self {
        Self {
            template,
            next_id: AtomicU64::new(1),
        }
    }

    /// Genome length every player from this factory has
    pub fn genome_len(&self) -> usize {
        self.template.len()
    }

    /// A freshly randomized genome
    pub fn random_genome<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<T> {
        self.template.iter().map(|g| g.pick_one(rng)).collect()
    }

    /// A player with a freshly randomized genome
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Player<T> {
        let genome = self.random_genome(rng);
        Player::new(self.next_id(), genome)
    }

    /// A player with an explicit genome (reproduction)
    pub fn from_genome(&self, genome: Vec<T>) -> Result<Player<T>> {
        if genome.len() != self.genome_len() {
            return Err(EngineError::contract(format!(
                "genome of length {} given to a factory expecting {}",
                genome.len(),
                self.genome_len()
            )));
        }
        Ok(Player::new(self.next_id(), genome))
    }

    fn next_id(&self) -> PlayerId {
        PlayerId(self.next_id.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::tests::Play;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn factory() -> PlayerFactory<Play> {
        PlayerFactory::new(vec![Play::High; 6])
    }

    #[test]
    fn test_factory_builds_players_of_declared_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let f = factory();
        for _ in 0..20 {
            assert_eq!(f.random(&mut rng).genome().len(), f.genome_len());
        }
    }

    #[test]
    fn test_factory_rejects_wrong_genome_length() {
        let f = factory();
        let err = f.from_genome(vec![Play::Low; 3]).unwrap_err();
        assert!(matches!(err, EngineError::ContractViolation(_)));
    }

    #[test]
    fn test_factory_ids_are_unique() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let f = factory();
        let a = f.random(&mut rng);
        let b = f.from_genome(a.genome().to_vec()).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.genome(), b.genome());
    }

    #[test]
    fn test_fitness_accumulates_and_clears() {
        let p = factory().from_genome(vec![Play::Low; 6]).unwrap();
        p.add_to_fitness(3);
        p.add_to_fitness(4);
        assert_eq!(p.fitness(), 7);
        p.clear_fitness();
        assert_eq!(p.fitness(), 0);
    }

    #[test]
    fn test_mutate_changes_exactly_one_gene() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut p = factory().from_genome(vec![Play::Low; 6]).unwrap();
        let before = p.genome().to_vec();
        let index = p.mutate(&mut rng).unwrap();
        let changed: Vec<usize> = (0..6).filter(|&i| before[i] != p.genome()[i]).collect();
        assert_eq!(changed, vec![index]);
    }

    #[test]
    fn test_fitness_order() {
        let f = factory();
        let a = f.from_genome(vec![Play::Low; 6]).unwrap();
        let b = f.from_genome(vec![Play::Low; 6]).unwrap();
        a.add_to_fitness(10);
        b.add_to_fitness(2);

        assert_eq!(FitnessOrder::HigherIsBetter.best_first(&a, &b), Ordering::Less);
        assert_eq!(FitnessOrder::LowerIsBetter.best_first(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_display_lists_genes() {
        let p = factory().from_genome(vec![Play::Low, Play::High, Play::Low, Play::Low, Play::Low, Play::Middle]).unwrap();
        let shown = p.to_string();
        assert!(shown.starts_with("Player #"));
        assert!(shown.contains("Low, High"));
    }
}
