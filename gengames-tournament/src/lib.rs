//! Genetic Games Tournament - Playing matches, one at a time
//!
//! This crate provides the match-playing side of a generation:
//! - The coordinator binding the evolution thread to the active match
//! - Tournament scheduling (linear and quadratic)
//! - Running a single match through the game contract
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_tournament (orchestration)
//! - Level 2: MatchRunner::play_match (phases)
//! - Level 3: schedule, Coordinator (steps)
//! - Level 4: configuration

mod config;
mod coordinator;
mod match_play;
mod tournament;

pub use config::TournamentStyle;
pub use coordinator::{Coordinator, RunFlags};
pub use match_play::{MatchExecutor, MatchResult, MatchRunner};
pub use tournament::{run_tournament, schedule, TournamentResult};
