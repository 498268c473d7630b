//! The evolution cycle - a generational GA on its own thread
//!
//! Level 1 - Orchestration

use std::sync::Arc;

use gengames_core::{EngineError, Game, Result, RunLevel};
use gengames_tournament::TournamentStyle;

use crate::config::{
    validate_crossover_points, validate_mating_pool_percent, validate_mutation_percent,
    validate_population_size, GaConfig,
};
use crate::controller::{Controller, Mode, Sinks};

/// Evolves a population against one game.
///
/// The population is seeded when the first run command arrives, so
/// configuration set before then decides its size. Every setter fails
/// unless the cycle is quiescent.
pub struct EvolutionCycle<G: Game> {
    controller: Controller<G>,
}

impl<G: Game> EvolutionCycle<G> {
    /// Start an idle cycle for one of the evolving run levels
    pub fn new(game: Arc<G>, level: RunLevel, sinks: Sinks, seed: u64) -> Result<Self> {
        if !level.is_evolution() {
            return Err(EngineError::config(format!(
                "{} does not run the generational loop",
                level
            )));
        }
        let controller = Controller::spawn(game, level, Mode::Evolve, sinks, seed)?;
        Ok(Self { controller })
    }

    /// Run commands, status and waits
    pub fn control(&self) -> &Controller<G> {
        &self.controller
    }

    // ========================================================================
    // Configuration surface
    // ========================================================================

    pub fn config(&self) -> GaConfig {
        self.controller.config()
    }

    pub fn population_size(&self) -> usize {
        self.config().population_size
    }

    pub fn mating_pool_percent(&self) -> f64 {
        self.config().mating_pool_percent()
    }

    pub fn mutation_percent(&self) -> f64 {
        self.config().mutation_percent()
    }

    pub fn crossover_points(&self) -> usize {
        self.config().crossover_points
    }

    pub fn tournament_style(&self) -> TournamentStyle {
        self.config().tournament_style
    }

    pub fn set_population_size(&self, size: usize) -> Result<()> {
        let limits = self.controller.limits();
        self.controller.update_config(|c| {
            c.population_size = validate_population_size(size, &limits)?;
            Ok(())
        })
    }

    pub fn set_mating_pool_percent(&self, percent: f64) -> Result<()> {
        self.controller.update_config(|c| {
            c.survival_rate = validate_mating_pool_percent(percent)?;
            Ok(())
        })
    }

    pub fn set_mutation_percent(&self, percent: f64) -> Result<()> {
        self.controller.update_config(|c| {
            c.mutation_rate = validate_mutation_percent(percent)?;
            Ok(())
        })
    }

    pub fn set_crossover_points(&self, points: usize) -> Result<()> {
        let limits = self.controller.limits();
        self.controller.update_config(|c| {
            c.crossover_points = validate_crossover_points(points, &limits)?;
            Ok(())
        })
    }

    pub fn set_tournament_style(&self, style: TournamentStyle) -> Result<()> {
        self.controller.update_config(|c| {
            c.tournament_style = style;
            Ok(())
        })
    }

    /// Replace the whole configuration, all or nothing
    pub fn apply_config(&self, config: GaConfig) -> Result<()> {
        let limits = self.controller.limits();
        self.controller.update_config(|c| {
            config.validate(&limits)?;
            *c = config;
            Ok(())
        })
    }
}
