//! Genes - the finite, game-defined building blocks of a strategy
//!
//! A game describes each position of its genome with a closed set of
//! variants. Usually that is a plain enum; when different positions draw
//! from different sets, the game wraps them in one sum type and each
//! value reports the domain of its own position.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

/// One gene of a player's strategy.
pub trait Gene: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Every variant the position holding this gene may take.
    fn domain(&self) -> &'static [Self];

    /// Uniform draw over the whole domain. May return the current value.
    fn pick_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        pick_uniform(self.domain(), rng).unwrap_or(*self)
    }

    /// Uniform draw over the domain excluding the current value.
    ///
    /// A single-variant domain has nothing to mutate into, so the current
    /// value is returned unchanged.
    fn mutate<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        pick_excluding(self.domain(), self, rng)
    }
}

/// Pick one value uniformly. `None` only for an empty domain.
pub fn pick_uniform<T: Copy, R: Rng + ?Sized>(domain: &[T], rng: &mut R) -> Option<T> {
    domain.choose(rng).copied()
}

/// Pick one value uniformly among those different from `current`.
pub fn pick_excluding<T, R>(domain: &[T], current: &T, rng: &mut R) -> T
where
    T: Copy + PartialEq,
    R: Rng + ?Sized,
{
    let others = domain.iter().filter(|&v| v != current).count();
    if others == 0 {
        return *current;
    }

    let k = rng.gen_range(0..others);
    domain
        .iter()
        .filter(|&v| v != current)
        .nth(k)
        .copied()
        .unwrap_or(*current)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Four-variant gene used by tests across this crate
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum Play {
        High,
        Low,
        Middle,
        Random,
    }

    impl fmt::Display for Play {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Gene for Play {
        fn domain(&self) -> &'static [Self] {
            &[Play::High, Play::Low, Play::Middle, Play::Random]
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Only {
        One,
    }

    impl fmt::Display for Only {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("one")
        }
    }

    impl Gene for Only {
        fn domain(&self) -> &'static [Self] {
            &[Only::One]
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Mixed {
        Keep(bool),
        Play(Play),
    }

    impl fmt::Display for Mixed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    const KEEP: [Mixed; 2] = [Mixed::Keep(true), Mixed::Keep(false)];
    const PLAY: [Mixed; 4] = [
        Mixed::Play(Play::High),
        Mixed::Play(Play::Low),
        Mixed::Play(Play::Middle),
        Mixed::Play(Play::Random),
    ];

    impl Gene for Mixed {
        fn domain(&self) -> &'static [Self] {
            match self {
                Mixed::Keep(_) => &KEEP,
                Mixed::Play(_) => &PLAY,
            }
        }
    }

    #[test]
    fn test_mutate_never_returns_current_value() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for start in Play::High.domain() {
            let self_matches = (0..10_000)
                .filter(|_| start.mutate(&mut rng) == *start)
                .count();
            assert_eq!(self_matches, 0, "{} mutated into itself", start);
        }
    }

    #[test]
    fn test_mutate_reaches_every_other_variant() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(Play::High.mutate(&mut rng));
        }
        assert_eq!(seen.len(), 3);
        assert!(!seen.contains(&Play::High));
    }

    #[test]
    fn test_pick_one_can_reproduce_current_value() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(Play::Low.pick_one(&mut rng));
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_single_variant_domain_mutates_to_itself() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(Only::One.mutate(&mut rng), Only::One);
        assert_eq!(Only::One.pick_one(&mut rng), Only::One);
    }

    #[test]
    fn test_sum_type_stays_within_its_position_domain() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..200 {
            assert_eq!(Mixed::Keep(true).mutate(&mut rng), Mixed::Keep(false));
            assert!(matches!(Mixed::Play(Play::Low).mutate(&mut rng), Mixed::Play(_)));
        }
    }

    #[test]
    fn test_pick_uniform_empty_domain() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let empty: [u8; 0] = [];
        assert_eq!(pick_uniform(&empty, &mut rng), None);
        assert_eq!(pick_excluding(&empty, &7, &mut rng), 7);
    }
}
