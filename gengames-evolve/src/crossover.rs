//! Crossover operators for genome recombination
//!
//! k-point crossover: the genome is cut into `k + 1` contiguous slices and
//! the child takes even slices from one parent and odd slices from the other.

use gengames_core::{Gene, PlayerFactory, Population, Result};
use rand::Rng;

use crate::selection::pick_two_distinct;

/// End index of each of the `points + 1` slices.
///
/// Cut `i` is drawn uniformly from the bin `[i * range, (i + 1) * range)`
/// where `range = genome_len / points`, so cuts strictly increase. The last
/// entry is always `genome_len`.
pub fn slice_points<R: Rng + ?Sized>(genome_len: usize, points: usize, rng: &mut R) -> Vec<usize> {
    let points = points.min(genome_len);
    if points == 0 {
        return vec![genome_len];
    }
    let range = genome_len / points;
    (0..points)
        .map(|i| i * range + rng.gen_range(0..range))
        .chain(std::iter::once(genome_len))
        .collect()
}

/// Build a child from slice ends: even slices from `a`, odd slices from `b`.
pub fn combine<T: Copy>(a: &[T], b: &[T], ends: &[usize]) -> Vec<T> {
    let mut child = Vec::with_capacity(a.len());
    let mut start = 0;
    for (i, &end) in ends.iter().enumerate() {
        let parent = if i % 2 == 0 { a } else { b };
        child.extend_from_slice(&parent[start..end]);
        start = end;
    }
    child
}

/// k-point crossover of two equal-length genomes
pub fn crossover_genomes<T: Copy, R: Rng + ?Sized>(
    a: &[T],
    b: &[T],
    points: usize,
    rng: &mut R,
) -> Vec<T> {
    let ends = slice_points(a.len(), points, rng);
    combine(a, b, &ends)
}

/// Fill the population up to `target_size` with children of the survivor pool.
///
/// The survivor pool is the first `survivors` players. Does nothing when
/// crossover is disabled or fewer than two survivors exist.
///
/// # Returns
/// Number of children added
pub fn breed<T, R>(
    population: &mut Population<T>,
    survivors: usize,
    target_size: usize,
    points: usize,
    factory: &PlayerFactory<T>,
    rng: &mut R,
) -> Result<usize>
where
    T: Gene,
    R: Rng + ?Sized,
{
    let pool = survivors.min(population.len());
    if points == 0 || pool < 2 {
        return Ok(0);
    }

    let mut children = 0;
    while population.len() < target_size {
        let Some((a, b)) = pick_two_distinct(pool, rng) else {
            break;
        };
        let genome = {
            let players = population.players();
            crossover_genomes(players[a].genome(), players[b].genome(), points, rng)
        };
        population.push(factory.from_genome(genome)?);
        children += 1;
    }
    Ok(children)
}
