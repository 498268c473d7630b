//! Refill - asexual replication of survivors

use gengames_core::{Gene, PlayerFactory, Population, Result};
use rand::Rng;

/// Fill the population up to `target_size` with verbatim copies of random
/// survivors (the first `survivors` players).
///
/// # Returns
/// Number of clones added
pub fn refill<T, R>(
    population: &mut Population<T>,
    survivors: usize,
    target_size: usize,
    factory: &PlayerFactory<T>,
    rng: &mut R,
) -> Result<usize>
where
    T: Gene,
    R: Rng + ?Sized,
{
    let pool = survivors.min(population.len());
    if pool == 0 {
        return Ok(0);
    }

    let mut clones = 0;
    while population.len() < target_size {
        let genome = population.players()[rng.gen_range(0..pool)].genome().to_vec();
        population.push(factory.from_genome(genome)?);
        clones += 1;
    }
    Ok(clones)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{factory, Bit, GENOME_LEN};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_refill_clones_survivor_genomes() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let f = factory();
        let a = vec![Bit::One; GENOME_LEN];
        let b = vec![Bit::Zero, Bit::One, Bit::Zero, Bit::One, Bit::Zero, Bit::One];
        let mut pop = Population::from_players(vec![
            f.from_genome(a.clone()).unwrap(),
            f.from_genome(b.clone()).unwrap(),
        ]);

        let clones = refill(&mut pop, 2, 7, &f, &mut rng).unwrap();
        assert_eq!(clones, 5);
        assert_eq!(pop.len(), 7);
        for p in pop.iter() {
            assert!(p.genome() == a.as_slice() || p.genome() == b.as_slice());
        }
    }

    #[test]
    fn test_refill_full_population_is_noop() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let f = factory();
        let mut pop = Population::seed(&f, 4, &mut rng).unwrap();
        assert_eq!(refill(&mut pop, 2, 4, &f, &mut rng).unwrap(), 0);
        assert_eq!(pop.len(), 4);
    }
}
