//! Run levels - which parts of the system are real and which are dummies

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a component is the real thing or the cheap stand-in used for testing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fidelity {
    /// Cheap genome / instant match
    Dummy,
    /// The game's real genome / real match
    Real,
}

/// Operating mode, fixed when a controller is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunLevel {
    /// Evolve dummy players with the dummy match. Tests the GA itself.
    EngineSelfTest,
    /// One match of the real game between dummy players.
    SingleMatchDummyPlayers,
    /// One match of the real game between real players.
    SingleMatchRealPlayers,
    /// Evolve dummy players with the real game.
    SystemTest,
    /// Evolve real players with the real game.
    Full,
}

impl RunLevel {
    pub const ALL: [RunLevel; 5] = [
        RunLevel::EngineSelfTest,
        RunLevel::SingleMatchDummyPlayers,
        RunLevel::SingleMatchRealPlayers,
        RunLevel::SystemTest,
        RunLevel::Full,
    ];

    /// True for the levels that drive the generational loop
    pub fn is_evolution(self) -> bool {
        !self.is_single_match()
    }

    /// True for the diagnostic single-match levels
    pub fn is_single_match(self) -> bool {
        matches!(
            self,
            RunLevel::SingleMatchDummyPlayers | RunLevel::SingleMatchRealPlayers
        )
    }

    /// Which player factory seeds the population
    pub fn player_fidelity(self) -> Fidelity {
        match self {
            RunLevel::SingleMatchRealPlayers | RunLevel::Full => Fidelity::Real,
            _ => Fidelity::Dummy,
        }
    }

    /// Whether matches use the dummy match or the game's own
    pub fn game_fidelity(self) -> Fidelity {
        match self {
            RunLevel::EngineSelfTest => Fidelity::Dummy,
            _ => Fidelity::Real,
        }
    }
}

impl fmt::Display for RunLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunLevel::EngineSelfTest => "engine self-test (dummy game, dummy players)",
            RunLevel::SingleMatchDummyPlayers => "single match (dummy players)",
            RunLevel::SingleMatchRealPlayers => "single match (real players)",
            RunLevel::SystemTest => "system test (real game, dummy players)",
            RunLevel::Full => "full (real game, real players)",
        };
        f.write_str(name)
    }
}
