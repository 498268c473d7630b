//! Genetic Games - Pluggable game implementations
//!
//! Games here implement `gengames_core::Game`; the engine never depends on
//! this crate.

pub mod highcard;

pub use highcard::{HighCard, PlayStyle};
