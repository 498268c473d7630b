//! Selection operators: pruning to the survivor pool and picking parents

use gengames_core::{EngineError, FitnessOrder, Gene, Population, Result};
use rand::Rng;

use crate::config::survivor_count;

/// Rank the population best-first and keep the top
/// `floor(target_size * survival_rate)` players.
///
/// # Arguments
/// * `population` - Players with this generation's fitness applied
/// * `target_size` - Configured population size (may differ from the current length)
/// * `survival_rate` - Fraction to keep, in (0, 1]
/// * `order` - The game's fitness ordering
///
/// # Returns
/// Number of survivors, or `FatalPopulation` if that number is zero.
/// Nothing is removed in the fatal case.
pub fn prune<T: Gene>(
    population: &mut Population<T>,
    target_size: usize,
    survival_rate: f64,
    order: FitnessOrder,
) -> Result<usize> {
    let survivors = survivor_count(target_size, survival_rate);
    if survivors == 0 {
        return Err(EngineError::FatalPopulation {
            population_size: target_size,
            survival_rate,
        });
    }

    population.rank(order);
    population.truncate(survivors);
    Ok(population.len())
}

/// Two distinct indices below `len`, uniformly.
///
/// Distinct by position, which is distinct by identity: two survivors with
/// the same genome may still be picked together. `None` when `len < 2`.
pub fn pick_two_distinct<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Option<(usize, usize)> {
    if len < 2 {
        return None;
    }
    let a = rng.gen_range(0..len);
    let mut b = rng.gen_range(0..len - 1);
    if b >= a {
        b += 1;
    }
    Some((a, b))
}
