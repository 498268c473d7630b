//! Population - the ordered collection of players the GA evolves

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{EngineError, Result};
use crate::gene::Gene;
use crate::player::{FitnessOrder, Player, PlayerFactory};

/// Ordered sequence of players.
///
/// Players are held behind `Arc` so a match can borrow a fixed group of them
/// for fitness writes while the population itself stays owned by the
/// evolution thread.
#[derive(Debug, Clone)]
pub struct Population<T: Gene> {
    players: Vec<Arc<Player<T>>>,
}

impl<T: Gene> Population<T> {
    /// Seed `size` random players from `factory`.
    pub fn seed<R: Rng + ?Sized>(
        factory: &PlayerFactory<T>,
        size: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let players: Vec<Arc<Player<T>>> =
            (0..size).map(|_| Arc::new(factory.random(rng))).collect();

        if players.len() != size {
            return Err(EngineError::contract(format!(
                "the population was not completely initialized: wanted {}, built {}",
                size,
                players.len()
            )));
        }

        Ok(Self { players })
    }

    pub fn from_players(players: Vec<Player<T>>) -> Self {
        Self {
            players: players.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Arc<Player<T>>] {
        &self.players
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Player<T>>> {
        self.players.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Player<T>>> {
        self.players.get(index)
    }

    /// Mutate one gene of the player at `index`, keeping its identity.
    ///
    /// A player still shared with a match is copied first. Returns the gene
    /// position changed, or `None` if `index` is out of range.
    pub fn mutate_at<R: Rng + ?Sized>(&mut self, index: usize, rng: &mut R) -> Option<usize> {
        let player = self.players.get_mut(index)?;
        Arc::make_mut(player).mutate(rng)
    }

    pub fn push(&mut self, player: Player<T>) {
        self.players.push(Arc::new(player));
    }

    /// Uniform random permutation
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.players.shuffle(rng);
    }

    /// Stable sort, best player first
    pub fn rank(&mut self, order: FitnessOrder) {
        self.players.sort_by(|a, b| order.best_first(a, b));
    }

    pub fn truncate(&mut self, len: usize) {
        self.players.truncate(len);
    }

    /// Shared handles to the players at `indices`, in that order
    pub fn group(&self, indices: &[usize]) -> Vec<Arc<Player<T>>> {
        indices
            .iter()
            .filter_map(|&i| self.players.get(i).cloned())
            .collect()
    }

    pub fn clear_fitness(&self) {
        for p in &self.players {
            p.clear_fitness();
        }
    }

    /// Copy of every genome, in population order
    pub fn genomes(&self) -> Vec<Vec<T>> {
        self.players.iter().map(|p| p.genome().to_vec()).collect()
    }
}
