//! The diagnostic run - exactly one match, no generations
//!
//! Seeds just enough players for one match, with the real or dummy factory
//! depending on the run level, and plays them through the same match
//! runner the evolution cycle uses. Nothing is pruned, bred or mutated.

use std::sync::Arc;

use gengames_core::{EngineError, Game, Result, RunLevel};

use crate::controller::{Controller, Mode, Sinks};

pub struct DiagnosticRun<G: Game> {
    controller: Controller<G>,
}

impl<G: Game> DiagnosticRun<G> {
    /// Seed the players and wait for a run command to start the match
    pub fn new(game: Arc<G>, level: RunLevel, sinks: Sinks, seed: u64) -> Result<Self> {
        if !level.is_single_match() {
            return Err(EngineError::config(format!(
                "{} is not a single-match run level",
                level
            )));
        }
        let controller = Controller::spawn(game, level, Mode::Diagnostic, sinks, seed)?;
        Ok(Self { controller })
    }

    pub fn control(&self) -> &Controller<G> {
        &self.controller
    }
}
