//! Genetic Games CLI - Command-line interface
//!
//! Commands:
//! - evolve: Evolve players against a game for a number of generations
//! - play: Play a single diagnostic match
//! - shell: Interactive start/stop/step/configure session
//! - games: List the registered games

mod evolve;
mod play;
mod registry;
mod shell;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gengames")]
#[command(about = "Evolve game-playing strategies with a genetic algorithm")]
struct Cli {
    /// Random seed for reproducibility
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve players for a number of generations
    Evolve(evolve::EvolveArgs),
    /// Play one match without evolving
    Play(play::PlayArgs),
    /// Interactive session with step control
    Shell(shell::ShellArgs),
    /// List registered games
    Games {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(rand::random);

    match cli.command {
        Commands::Evolve(args) => evolve::run(args, seed),
        Commands::Play(args) => play::run(args, seed),
        Commands::Shell(args) => shell::run(args, seed),
        Commands::Games { json } => registry::print_games(json),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
