//! GA configuration and its validation
//!
//! Every range check lives here. The external surface works in percent
//! (mating pool, mutation); the stored configuration holds rates in `[0, 1]`.

use gengames_core::{EngineError, Result};
use gengames_tournament::TournamentStyle;
use serde::{Deserialize, Serialize};

pub const DEFAULT_POPULATION_SIZE: usize = 16;
pub const DEFAULT_MATING_POOL_PERCENT: f64 = 60.0;
pub const DEFAULT_MUTATION_PERCENT: f64 = 5.0;
pub const DEFAULT_CROSSOVER_POINTS: usize = 1;

// Survival rates are fixed to eight decimal places before counting survivors
const RATE_SCALE: u64 = 100_000_000;

/// What the active game allows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenomeLimits {
    /// Seats per match
    pub num_players: usize,
    /// Genome length of the players being evolved
    pub genome_len: usize,
}

impl GenomeLimits {
    /// Smallest legal population
    pub fn min_population(&self) -> usize {
        self.num_players.max(2)
    }
}

/// Genetic algorithm parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Players alive at the end of every generation
    pub population_size: usize,
    /// Fraction kept after pruning, in (0, 1]
    pub survival_rate: f64,
    /// Per-player chance of one mutation per generation, in [0, 1]
    pub mutation_rate: f64,
    /// Crossover points; 0 disables recombination
    pub crossover_points: usize,
    pub tournament_style: TournamentStyle,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: DEFAULT_POPULATION_SIZE,
            survival_rate: DEFAULT_MATING_POOL_PERCENT / 100.0,
            mutation_rate: DEFAULT_MUTATION_PERCENT / 100.0,
            crossover_points: DEFAULT_CROSSOVER_POINTS,
            tournament_style: TournamentStyle::Linear,
        }
    }
}

impl GaConfig {
    /// Defaults adjusted so they are legal for the given game
    pub fn for_game(num_players: usize, genome_len: usize) -> Self {
        let limits = GenomeLimits {
            num_players,
            genome_len,
        };
        let defaults = Self::default();
        Self {
            population_size: defaults.population_size.max(limits.min_population()),
            crossover_points: defaults.crossover_points.min(genome_len),
            ..defaults
        }
    }

    /// Check every field against the game's limits
    pub fn validate(&self, limits: &GenomeLimits) -> Result<()> {
        validate_population_size(self.population_size, limits)?;
        validate_survival_rate(self.survival_rate)?;
        validate_mutation_rate(self.mutation_rate)?;
        validate_crossover_points(self.crossover_points, limits)?;
        Ok(())
    }

    pub fn mating_pool_percent(&self) -> f64 {
        self.survival_rate * 100.0
    }

    pub fn mutation_percent(&self) -> f64 {
        self.mutation_rate * 100.0
    }

    /// Players that survive pruning: `floor(population_size * survival_rate)`
    pub fn survivors(&self) -> usize {
        survivor_count(self.population_size, self.survival_rate)
    }
}

/// `floor(population_size * survival_rate)`, in integer arithmetic on the
/// rate rounded to eight decimal places
pub fn survivor_count(population_size: usize, survival_rate: f64) -> usize {
    let units = (survival_rate.clamp(0.0, 1.0) * RATE_SCALE as f64).round() as u128;
    (population_size as u128 * units / RATE_SCALE as u128) as usize
}

pub fn validate_population_size(size: usize, limits: &GenomeLimits) -> Result<usize> {
    if size < limits.min_population() {
        return Err(EngineError::config(format!(
            "population must be at least as large as the number of players in a game ({}) and no less than 2, got {}",
            limits.num_players, size
        )));
    }
    Ok(size)
}

/// Mating pool percent in (0, 100], returned as a rate
pub fn validate_mating_pool_percent(percent: f64) -> Result<f64> {
    if !percent.is_finite() || percent <= 0.0 || percent > 100.0 {
        return Err(EngineError::config(format!(
            "the mating pool requires a percentage greater than 0 and at most 100, got {}",
            percent
        )));
    }
    Ok(percent / 100.0)
}

/// Mutation percent in [0, 100], returned as a rate
pub fn validate_mutation_percent(percent: f64) -> Result<f64> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(EngineError::config(format!(
            "mutation requires a percentage between 0 and 100, got {}",
            percent
        )));
    }
    Ok(percent / 100.0)
}

pub fn validate_survival_rate(rate: f64) -> Result<f64> {
    validate_mating_pool_percent(rate * 100.0).map(|_| rate)
}

pub fn validate_mutation_rate(rate: f64) -> Result<f64> {
    validate_mutation_percent(rate * 100.0).map(|_| rate)
}

pub fn validate_crossover_points(points: usize, limits: &GenomeLimits) -> Result<usize> {
    if points > limits.genome_len {
        return Err(EngineError::config(format!(
            "crossover requires an integer between 0 and {}, got {}",
            limits.genome_len, points
        )));
    }
    Ok(points)
}
