//! Genetic Games Evolve - The generational genetic algorithm
//!
//! This crate drives evolution against a pluggable game:
//! - GA configuration and validation
//! - Selection, crossover, refill and mutation operators
//! - The synchronous generation step (`Evolver`)
//! - The threaded controllers: `EvolutionCycle` and `DiagnosticRun`
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: EvolutionCycle, DiagnosticRun, Session (orchestration)
//! - Level 2: Evolver::run_generation (phases)
//! - Level 3: prune, breed, refill, mutate_population (steps)
//! - Level 4: configuration

pub mod config;
pub mod controller;
pub mod crossover;
pub mod cycle;
pub mod diagnostic;
pub mod generation;
pub mod mutation;
pub mod refill;
pub mod selection;
pub mod session;

#[cfg(test)]
mod test_support;

pub use config::{GaConfig, GenomeLimits};
pub use controller::{Controller, CyclePhase, InterruptOutcome, Sinks};
pub use cycle::EvolutionCycle;
pub use diagnostic::DiagnosticRun;
pub use generation::{Evolver, GenerationSummary, UpdateStats};
pub use session::Session;
