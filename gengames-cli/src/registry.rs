//! Game registry - display names to game implementations
//!
//! Level 4 - Configuration

use anyhow::Result;
use clap::ValueEnum;
use gengames_core::{Game, RunLevel};
use gengames_games::HighCard;
use serde::Serialize;

/// Every game the CLI knows about
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum GameKind {
    #[value(name = "highcard")]
    HighCard,
}

impl GameKind {
    pub const ALL: [GameKind; 1] = [GameKind::HighCard];

    pub fn describe(self) -> Result<GameInfo> {
        match self {
            GameKind::HighCard => GameInfo::of(&HighCard::new()),
        }
    }
}

/// What `games` prints for one game
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameInfo {
    pub name: String,
    pub seats: usize,
    pub genome_len: usize,
    pub dummy_genome_len: usize,
}

impl GameInfo {
    fn of<G: Game>(game: &G) -> Result<Self> {
        let probe = game.probe()?;
        Ok(Self {
            name: game.name().to_string(),
            seats: probe.num_players,
            genome_len: probe.players.genome_len(),
            dummy_genome_len: probe.dummy_players.genome_len(),
        })
    }
}

/// Run level names accepted on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    /// Dummy game, dummy players
    SelfTest,
    /// One match, dummy players
    MatchDummy,
    /// One match, real players
    MatchReal,
    /// Real game, dummy players
    SystemTest,
    /// Real game, real players
    Full,
}

impl From<LevelArg> for RunLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::SelfTest => RunLevel::EngineSelfTest,
            LevelArg::MatchDummy => RunLevel::SingleMatchDummyPlayers,
            LevelArg::MatchReal => RunLevel::SingleMatchRealPlayers,
            LevelArg::SystemTest => RunLevel::SystemTest,
            LevelArg::Full => RunLevel::Full,
        }
    }
}

pub fn print_games(json: bool) -> Result<()> {
    let infos = GameKind::ALL
        .iter()
        .map(|kind| kind.describe())
        .collect::<Result<Vec<_>>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    println!("{:<12} {:>6} {:>8} {:>8}", "game", "seats", "genome", "dummy");
    for info in &infos {
        println!(
            "{:<12} {:>6} {:>8} {:>8}",
            info.name, info.seats, info.genome_len, info.dummy_genome_len
        );
    }
    Ok(())
}
