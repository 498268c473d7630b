//! Shell command - drive a session interactively
//!
//! Reads one command per line from stdin. Run commands are advisory: the
//! session picks them up between matches and rounds.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use gengames_core::{EngineError, Game, RunLevel};
use gengames_evolve::{InterruptOutcome, Session, Sinks};
use gengames_games::HighCard;
use gengames_tournament::TournamentStyle;

use crate::registry::{GameKind, LevelArg};

const HELP: &str = "\
commands:
  start | pause              run continuously / stop at the next round
  gen | game | round         run one generation / match / round
  set population N           population size
  set pool P                 mating pool percent
  set mutation P             mutation percent
  set crossover K            crossover points
  set quadratic on|off       tournament style
  config | status | history  show configuration / state / generation summaries
  interrupt [--force]        stop; --force discards work in flight
  help | quit";

#[derive(Args)]
pub struct ShellArgs {
    /// Game to run
    #[arg(long, value_enum, default_value = "highcard")]
    pub game: GameKind,

    /// Run level, fixed for the session
    #[arg(long, value_enum, default_value = "full")]
    pub level: LevelArg,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Setting {
    Population(usize),
    MatingPool(f64),
    Mutation(f64),
    Crossover(usize),
    Quadratic(bool),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Start,
    Pause,
    Generation,
    Game,
    Round,
    Set(Setting),
    Config,
    Status,
    History,
    Interrupt { force: bool },
    Help,
    Quit,
}

/// Parse one input line. `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let command = match words.as_slice() {
        [] => return Ok(None),
        ["start" | "run"] => Command::Start,
        ["pause" | "stop"] => Command::Pause,
        ["gen" | "generation"] => Command::Generation,
        ["game" | "match"] => Command::Game,
        ["round"] => Command::Round,
        ["set", key, value] => Command::Set(parse_setting(key, value)?),
        ["config"] => Command::Config,
        ["status"] => Command::Status,
        ["history"] => Command::History,
        ["interrupt"] => Command::Interrupt { force: false },
        ["interrupt", "--force" | "-f"] => Command::Interrupt { force: true },
        ["help" | "?"] => Command::Help,
        ["quit" | "exit"] => Command::Quit,
        _ => return Err(format!("unknown command: {}", line.trim())),
    };
    Ok(Some(command))
}

fn parse_setting(key: &str, value: &str) -> std::result::Result<Setting, String> {
    let bad = |what: &str| format!("{} expects {}, got {}", key, what, value);
    match key {
        "population" => value.parse().map(Setting::Population).map_err(|_| bad("an integer")),
        "pool" => value.parse().map(Setting::MatingPool).map_err(|_| bad("a percentage")),
        "mutation" => value.parse().map(Setting::Mutation).map_err(|_| bad("a percentage")),
        "crossover" => value.parse().map(Setting::Crossover).map_err(|_| bad("an integer")),
        "quadratic" => match value {
            "on" | "true" => Ok(Setting::Quadratic(true)),
            "off" | "false" => Ok(Setting::Quadratic(false)),
            _ => Err(bad("on or off")),
        },
        _ => Err(format!("unknown setting: {}", key)),
    }
}

pub fn run(args: ShellArgs, seed: u64) -> Result<()> {
    match args.game {
        GameKind::HighCard => run_session(Arc::new(HighCard::new()), RunLevel::from(args.level), seed),
    }
}

fn run_session<G: Game>(game: Arc<G>, level: RunLevel, seed: u64) -> Result<()> {
    let session = Session::launch(game, level, Sinks::tracing(), seed)?;
    let stdin = io::stdin();
    let mut out = io::stdout();
    writeln!(out, "{} - type `help` for commands", level)?;

    for line in stdin.lock().lines() {
        let line = line?;
        match parse_command(&line) {
            Ok(None) => continue,
            Ok(Some(command)) => {
                if !execute(&session, command, &mut out)? {
                    break;
                }
            }
            Err(msg) => writeln!(out, "{}", msg)?,
        }
    }
    Ok(())
}

/// Carry out one command. Returns `false` when the shell should exit.
pub fn execute<G: Game, W: Write>(session: &Session<G>, command: Command, out: &mut W) -> Result<bool> {
    let control = session.control();
    let outcome: std::result::Result<(), EngineError> = match command {
        Command::Start => control.set_running(true),
        Command::Pause => {
            control.pause();
            Ok(())
        }
        Command::Generation => control.step_generation(),
        Command::Game => control.step_game(),
        Command::Round => control.step_round(),
        Command::Set(setting) => apply_setting(session, setting),
        Command::Config => {
            match session.evolution() {
                Some(cycle) => writeln!(out, "{}", serde_json::to_string_pretty(&cycle.config())?)?,
                None => writeln!(out, "single-match sessions have no GA configuration")?,
            }
            Ok(())
        }
        Command::Status => {
            writeln!(
                out,
                "phase: {:?}, generation: {}, quiescent: {}",
                control.phase(),
                control.generation(),
                control.is_quiescent()
            )?;
            if let Some(err) = control.last_error() {
                writeln!(out, "last error: {}", err)?;
            }
            Ok(())
        }
        Command::History => {
            writeln!(out, "{}", serde_json::to_string_pretty(&control.summaries())?)?;
            Ok(())
        }
        Command::Interrupt { force } => {
            let outcome = if force {
                control.force_interrupt()
            } else {
                control.interrupt()
            };
            match (outcome, force) {
                (InterruptOutcome::Clean, _) => writeln!(out, "stopped")?,
                (InterruptOutcome::Unsafe, false) => writeln!(
                    out,
                    "paused, but work is still in flight; `interrupt --force` discards it"
                )?,
                (InterruptOutcome::Unsafe, true) => {
                    writeln!(out, "interrupted; results in flight were discarded")?
                }
            }
            Ok(())
        }
        Command::Help => {
            writeln!(out, "{}", HELP)?;
            Ok(())
        }
        Command::Quit => {
            if control.force_interrupt() == InterruptOutcome::Unsafe {
                writeln!(out, "work in flight was discarded")?;
            }
            return Ok(false);
        }
    };

    if let Err(err) = outcome {
        writeln!(out, "error: {}", err)?;
    }
    Ok(true)
}

fn apply_setting<G: Game>(session: &Session<G>, setting: Setting) -> std::result::Result<(), EngineError> {
    let Some(cycle) = session.evolution() else {
        return Err(EngineError::config("single-match sessions have no GA configuration"));
    };
    match setting {
        Setting::Population(n) => cycle.set_population_size(n),
        Setting::MatingPool(p) => cycle.set_mating_pool_percent(p),
        Setting::Mutation(p) => cycle.set_mutation_percent(p),
        Setting::Crossover(k) => cycle.set_crossover_points(k),
        Setting::Quadratic(on) => cycle.set_tournament_style(TournamentStyle::from_flag(on)),
    }
}
