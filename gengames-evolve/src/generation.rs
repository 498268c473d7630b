//! The generation step - tournament, pruning, breeding, mutation
//!
//! Level 2 - Phase-level implementation
//!
//! `Evolver` owns the population and runs generations synchronously on the
//! calling thread. Matches are delegated to a `MatchExecutor`; the threaded
//! controller passes a coordinator-bound `MatchRunner`, tests pass scripted
//! executors.

use std::sync::Arc;

use gengames_core::{FitnessOrder, Gene, LogSink, PlayerFactory, Population, Result};
use gengames_tournament::{run_tournament, MatchExecutor};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::GaConfig;
use crate::crossover::breed;
use crate::mutation::mutate_population;
use crate::refill::refill;
use crate::selection::prune;

/// What one completed generation did
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Generation number, counting from 1
    pub generation: u64,
    pub matches_played: usize,
    pub survivors: usize,
    pub children: usize,
    pub clones: usize,
    pub mutations: usize,
    pub population_size: usize,
    /// Fitness of the best survivor before the reset
    pub best_fitness: u64,
}

/// Counts from the breeding half of a generation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub survivors: usize,
    pub children: usize,
    pub clones: usize,
    pub mutations: usize,
    pub best_fitness: u64,
}

/// A population plus everything needed to breed it
pub struct Evolver<T: Gene> {
    population: Population<T>,
    factory: Arc<PlayerFactory<T>>,
    order: FitnessOrder,
    num_players: usize,
    generation: u64,
    sink: Arc<dyn LogSink>,
}

impl<T: Gene> Evolver<T> {
    /// Seed `config.population_size` random players and log them
    pub fn seed<R: Rng + ?Sized>(
        factory: Arc<PlayerFactory<T>>,
        order: FitnessOrder,
        num_players: usize,
        config: &GaConfig,
        sink: Arc<dyn LogSink>,
        rng: &mut R,
    ) -> Result<Self> {
        let population = Population::seed(&factory, config.population_size, rng)?;

        sink.replace(&format!(
            "Initializing population with {} players",
            config.population_size
        ));
        for p in population.iter() {
            sink.append_line(&p.to_string());
        }
        sink.append_line("Population successfully initialized!");
        sink.append_line(&format!("Mating pool is {}%", config.mating_pool_percent()));
        sink.append_line(&format!("Mutation rate is {}%", config.mutation_percent()));
        sink.append_line(&format!("Crossover points: {}", config.crossover_points));
        info!(size = population.len(), "population initialized");

        Ok(Self {
            population,
            factory,
            order,
            num_players,
            generation: 0,
            sink,
        })
    }

    /// Wrap an existing population
    pub fn from_population(
        population: Population<T>,
        factory: Arc<PlayerFactory<T>>,
        order: FitnessOrder,
        num_players: usize,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            population,
            factory,
            order,
            num_players,
            generation: 0,
            sink,
        }
    }

    pub fn population(&self) -> &Population<T> {
        &self.population
    }

    /// Completed generations
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Play one full generation.
    ///
    /// On any error the generation is abandoned: fitness is reset and the
    /// counter does not move. The population keeps its pre-update members
    /// unless pruning already ran.
    pub fn run_generation<E, R>(
        &mut self,
        config: &GaConfig,
        executor: &mut E,
        rng: &mut R,
    ) -> Result<GenerationSummary>
    where
        E: MatchExecutor<T> + ?Sized,
        R: Rng + ?Sized,
    {
        let tournament = match run_tournament(
            &mut self.population,
            self.num_players,
            config.tournament_style,
            executor,
            rng,
        ) {
            Ok(t) => t,
            Err(e) => {
                self.abandon();
                return Err(e);
            }
        };

        let stats = match self.update_population(config, rng) {
            Ok(s) => s,
            Err(e) => {
                self.abandon();
                return Err(e);
            }
        };

        self.generation += 1;
        self.sink
            .append_line(&format!("Finished generation {}", self.generation));

        let summary = GenerationSummary {
            generation: self.generation,
            matches_played: tournament.matches_played,
            survivors: stats.survivors,
            children: stats.children,
            clones: stats.clones,
            mutations: stats.mutations,
            population_size: self.population.len(),
            best_fitness: stats.best_fitness,
        };
        info!(
            generation = summary.generation,
            matches = summary.matches_played,
            best = summary.best_fitness,
            "generation finished"
        );
        Ok(summary)
    }

    /// Prune, cross over, refill and mutate using the fitness already applied,
    /// then reset fitness.
    pub fn update_population<R: Rng + ?Sized>(
        &mut self,
        config: &GaConfig,
        rng: &mut R,
    ) -> Result<UpdateStats> {
        let target = config.population_size;
        let survivors = prune(&mut self.population, target, config.survival_rate, self.order)?;
        let best_fitness = self.population.get(0).map_or(0, |p| p.fitness());

        self.sink.append_line(&format!(
            "After pruning, the population now has {} individuals and they are:",
            survivors
        ));
        for p in self.population.iter() {
            self.sink
                .append_line(&format!("{} with fitness: {}", p, p.fitness()));
        }

        self.sink.append_line(&format!(
            "performing crossover with {} slices",
            config.crossover_points
        ));
        let children = breed(
            &mut self.population,
            survivors,
            target,
            config.crossover_points,
            &self.factory,
            rng,
        )?;

        let clones = refill(&mut self.population, survivors, target, &self.factory, rng)?;
        if clones > 0 {
            self.sink
                .append_line(&format!("refilling the population with {} individuals", clones));
        }

        self.sink.append_line(&format!(
            "performing mutation with a rate of {}%",
            config.mutation_percent()
        ));
        let mutations = mutate_population(&mut self.population, config.mutation_rate, rng);

        self.sink.append_line("The new population is:");
        for p in self.population.iter() {
            self.sink.append_line(&p.to_string());
        }
        self.population.clear_fitness();

        Ok(UpdateStats {
            survivors,
            children,
            clones,
            mutations,
            best_fitness,
        })
    }

    /// Discard this generation's results
    pub fn abandon(&mut self) {
        self.population.clear_fitness();
        warn!(
            generation = self.generation + 1,
            "generation abandoned, fitness reset"
        );
    }
}
