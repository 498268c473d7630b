//! Configuration types for tournament play
//!
//! Level 4 - Utilities and configuration

use serde::{Deserialize, Serialize};

/// How densely a generation's matches cover the population
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TournamentStyle {
    /// One pass: N matches, every player seated in `group_size` of them
    #[default]
    Linear,
    /// N passes with the seating rotated by one each time: N² matches.
    /// Worth the cost for games where luck decides a lot.
    Quadratic,
}

impl TournamentStyle {
    /// The boolean form used by the external configuration surface
    /// (`false` = linear, `true` = quadratic)
    pub fn from_flag(quadratic: bool) -> Self {
        if quadratic {
            TournamentStyle::Quadratic
        } else {
            TournamentStyle::Linear
        }
    }

    pub fn is_quadratic(self) -> bool {
        self == TournamentStyle::Quadratic
    }

    /// Number of passes over a population of `n`
    pub fn passes(self, n: usize) -> usize {
        match self {
            TournamentStyle::Linear => 1,
            TournamentStyle::Quadratic => n,
        }
    }

    /// Matches played per generation for a population of `n`
    pub fn matches_per_generation(self, n: usize) -> usize {
        self.passes(n) * n
    }
}
