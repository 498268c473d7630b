//! Evolution command - run the GA for a number of generations
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: configure(), run_generations(), print_summary()
//! - Level 3: load_config(), apply_overrides()
//! - Level 4: argument definitions

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use gengames_core::{Game, RunLevel};
use gengames_evolve::{EvolutionCycle, GaConfig, GenerationSummary, Sinks};
use gengames_games::HighCard;
use gengames_tournament::TournamentStyle;

use crate::registry::GameKind;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

/// Run levels that evolve a population
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EvolveLevel {
    /// Dummy game, dummy players
    SelfTest,
    /// Real game, dummy players
    SystemTest,
    /// Real game, real players
    Full,
}

impl From<EvolveLevel> for RunLevel {
    fn from(level: EvolveLevel) -> Self {
        match level {
            EvolveLevel::SelfTest => RunLevel::EngineSelfTest,
            EvolveLevel::SystemTest => RunLevel::SystemTest,
            EvolveLevel::Full => RunLevel::Full,
        }
    }
}

#[derive(Args)]
pub struct EvolveArgs {
    /// Game to evolve players for
    #[arg(long, value_enum, default_value = "highcard")]
    pub game: GameKind,

    /// Which parts are real
    #[arg(long, value_enum, default_value = "full")]
    pub level: EvolveLevel,

    /// Number of generations to run
    #[arg(long, default_value = "10")]
    pub generations: u64,

    /// Load the GA configuration from a JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Population size
    #[arg(long)]
    pub population: Option<usize>,

    /// Mating pool, percent of the population surviving each generation
    #[arg(long)]
    pub mating_pool: Option<f64>,

    /// Mutation rate in percent
    #[arg(long)]
    pub mutation: Option<f64>,

    /// Crossover points (0 disables crossover)
    #[arg(long)]
    pub crossover: Option<usize>,

    /// Play a quadratic tournament (N² matches per generation)
    #[arg(long)]
    pub quadratic: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run evolution command
///
/// 1. Start an idle cycle for the chosen game
/// 2. Apply the configuration file and flag overrides
/// 3. Step through the requested generations
/// 4. Print the summaries
pub fn run(args: EvolveArgs, seed: u64) -> Result<()> {
    match args.game {
        GameKind::HighCard => run_game(Arc::new(HighCard::new()), &args, seed),
    }
}

fn run_game<G: Game>(game: Arc<G>, args: &EvolveArgs, seed: u64) -> Result<()> {
    let level = RunLevel::from(args.level);
    tracing::info!(
        "Starting evolution: game={}, level={}, generations={}, seed={}",
        game.name(),
        level,
        args.generations,
        seed
    );

    let cycle = EvolutionCycle::new(game, level, Sinks::tracing(), seed)?;
    configure(&cycle, args)?;
    let summaries = run_generations(&cycle, args.generations)?;
    print_summary(&summaries, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn configure<G: Game>(cycle: &EvolutionCycle<G>, args: &EvolveArgs) -> Result<()> {
    if let Some(path) = &args.config {
        let config = load_config(path)?;
        cycle
            .apply_config(config)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
    }
    apply_overrides(cycle, args)?;

    let config = cycle.config();
    tracing::info!(
        "Configuration: population={}, mating pool={}%, mutation={}%, crossover={}, tournament={:?}",
        config.population_size,
        config.mating_pool_percent(),
        config.mutation_percent(),
        config.crossover_points,
        config.tournament_style
    );
    Ok(())
}

/// Step one generation at a time so the cycle is quiescent between them
fn run_generations<G: Game>(cycle: &EvolutionCycle<G>, generations: u64) -> Result<Vec<GenerationSummary>> {
    let bar = ProgressBar::new(generations);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} generations {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let control = cycle.control();
    for generation in 1..=generations {
        control.step_generation()?;
        while !control.wait_for_generation(generation, Duration::from_secs(1))? {
            bar.tick();
        }
        if let Some(summary) = control.summaries().last() {
            bar.set_message(format!("best fitness {}", summary.best_fitness));
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    if !control.wait_until_quiescent(Duration::from_secs(5)) {
        bail!("the cycle did not settle after the last generation");
    }
    Ok(control.summaries())
}

fn print_summary(summaries: &[GenerationSummary], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summaries)?);
        return Ok(());
    }

    println!(
        "{:>5} {:>8} {:>9} {:>8} {:>6} {:>9} {:>6}",
        "gen", "matches", "survivors", "children", "clones", "mutations", "best"
    );
    for s in summaries {
        println!(
            "{:>5} {:>8} {:>9} {:>8} {:>6} {:>9} {:>6}",
            s.generation, s.matches_played, s.survivors, s.children, s.clones, s.mutations, s.best_fitness
        );
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn load_config(path: &Path) -> Result<GaConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn apply_overrides<G: Game>(cycle: &EvolutionCycle<G>, args: &EvolveArgs) -> Result<()> {
    if let Some(size) = args.population {
        cycle.set_population_size(size)?;
    }
    if let Some(pool) = args.mating_pool {
        cycle.set_mating_pool_percent(pool)?;
    }
    if let Some(mutation) = args.mutation {
        cycle.set_mutation_percent(mutation)?;
    }
    if let Some(points) = args.crossover {
        cycle.set_crossover_points(points)?;
    }
    if args.quadratic {
        cycle.set_tournament_style(TournamentStyle::Quadratic)?;
    }
    Ok(())
}
