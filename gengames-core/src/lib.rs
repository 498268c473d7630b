//! Genetic Games Core - Genome model and game execution contract
//!
//! This crate provides the pieces every other crate builds on:
//! - Genes, players and player factories (the genome model)
//! - Population seeding and ranking
//! - The contract a pluggable game implements (`Game`, `MatchHandle`)
//! - Match-side control for games that run on their own thread
//! - The dummy match used to self-test the engine
//! - Output sinks for the generation and match logs

pub mod contract;
pub mod control;
pub mod dummy;
pub mod error;
pub mod gene;
pub mod player;
pub mod population;
pub mod run_level;
pub mod sink;

// Re-exports for convenient access
pub use contract::{Game, GameProbe, MatchHandle, MatchSetup, SharedMatch};
pub use control::{spawn_match, MatchControl, MatchInterrupted};
pub use dummy::DummyMatch;
pub use error::{EngineError, Result};
pub use gene::{pick_excluding, pick_uniform, Gene};
pub use player::{FitnessOrder, Player, PlayerFactory, PlayerId};
pub use population::Population;
pub use run_level::{Fidelity, RunLevel};
pub use sink::{LogSink, MemorySink, TracingSink};
