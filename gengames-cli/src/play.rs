//! Play command - one diagnostic match, no evolution

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};

use gengames_core::{Game, RunLevel};
use gengames_evolve::{DiagnosticRun, Sinks};
use gengames_games::HighCard;

use crate::registry::GameKind;

/// Which players to seat
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Seating {
    /// Players with the cheap dummy genome
    Dummy,
    /// Players with the game's full genome
    Real,
}

#[derive(Args)]
pub struct PlayArgs {
    /// Game to play
    #[arg(long, value_enum, default_value = "highcard")]
    pub game: GameKind,

    /// Which players to seat
    #[arg(long, value_enum, default_value = "real")]
    pub players: Seating,

    /// Give up after this many seconds
    #[arg(long, default_value = "60")]
    pub timeout: u64,
}

pub fn run(args: PlayArgs, seed: u64) -> Result<()> {
    match args.game {
        GameKind::HighCard => play(Arc::new(HighCard::new()), &args, seed),
    }
}

fn play<G: Game>(game: Arc<G>, args: &PlayArgs, seed: u64) -> Result<()> {
    let level = match args.players {
        Seating::Dummy => RunLevel::SingleMatchDummyPlayers,
        Seating::Real => RunLevel::SingleMatchRealPlayers,
    };
    tracing::info!("Playing one match of {} ({}), seed={}", game.name(), level, seed);

    let run = DiagnosticRun::new(game, level, Sinks::tracing(), seed)?;
    let control = run.control();
    control.set_running(true)?;

    if !control.wait_until_finished(Duration::from_secs(args.timeout)) {
        control.force_interrupt();
        bail!("the match did not finish within {} seconds", args.timeout);
    }
    if let Some(err) = control.last_error() {
        return Err(err.into());
    }
    Ok(())
}
