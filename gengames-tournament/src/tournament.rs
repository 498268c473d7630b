//! Tournament scheduling - who plays whom in one generation
//!
//! Level 1 - Orchestration

use gengames_core::{Gene, Population, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TournamentStyle;
use crate::match_play::MatchExecutor;

/// What one generation's tournament did
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentResult {
    pub style: TournamentStyle,
    pub matches_played: usize,
}

/// Seat groups for one tournament over a population of `len`.
///
/// Each pass plays `len` matches; match `i` seats `group_size` consecutive
/// players starting at offset `i`, wrapping at the end, so every player sits
/// in exactly `group_size` matches per pass. Quadratic tournaments run `len`
/// passes, each shifted one seat further than the last.
pub fn schedule(len: usize, group_size: usize, style: TournamentStyle) -> Vec<Vec<usize>> {
    if len == 0 {
        return Vec::new();
    }
    (0..style.passes(len))
        .flat_map(|pass| {
            (0..len).map(move |offset| {
                (0..group_size)
                    .map(|seat| (pass + offset + seat) % len)
                    .collect()
            })
        })
        .collect()
}

/// Shuffle the population and play every scheduled match, strictly one at a time.
///
/// Stops at the first failed match; fitness already written stays written.
pub fn run_tournament<T, E, R>(
    population: &mut Population<T>,
    group_size: usize,
    style: TournamentStyle,
    executor: &mut E,
    rng: &mut R,
) -> Result<TournamentResult>
where
    T: Gene,
    E: MatchExecutor<T> + ?Sized,
    R: Rng + ?Sized,
{
    population.shuffle(rng);
    let groups = schedule(population.len(), group_size, style);
    debug!(matches = groups.len(), ?style, "tournament scheduled");

    let mut matches_played = 0;
    for group in &groups {
        executor.play(population.group(group))?;
        matches_played += 1;
    }

    Ok(TournamentResult {
        style,
        matches_played,
    })
}
