//! Mutation operator
//!
//! Each player independently gets at most one mutation per generation:
//! one uniformly chosen gene resampled to a different variant.

use gengames_core::{Gene, Population};
use rand::Rng;

/// Mutate each player with probability `rate`.
///
/// One uniform draw in `[0, 1)` is consumed per player regardless of the
/// rate, so 0 never mutates and 1 always does.
///
/// # Returns
/// Number of players mutated
pub fn mutate_population<T, R>(population: &mut Population<T>, rate: f64, rng: &mut R) -> usize
where
    T: Gene,
    R: Rng + ?Sized,
{
    let mut mutated = 0;
    for index in 0..population.len() {
        let roll: f64 = rng.gen();
        if roll < rate && population.mutate_at(index, rng).is_some() {
            mutated += 1;
        }
    }
    mutated
}
