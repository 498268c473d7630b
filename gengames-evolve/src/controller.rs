//! The threaded controller behind `EvolutionCycle` and `DiagnosticRun`
//!
//! Level 1 - Orchestration
//!
//! One worker thread owns the population and runs generations (or the
//! single diagnostic match). The caller's thread only touches the
//! coordinator's run flags, the configuration, and the status block; all
//! three are mutex-guarded and waits use condition variables.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gengames_core::control::lock;
use gengames_core::{
    EngineError, Fidelity, FitnessOrder, Game, GameProbe, LogSink, MemorySink, PlayerFactory,
    Population, Result, RunLevel, TracingSink,
};
use gengames_tournament::{Coordinator, MatchRunner};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::{GaConfig, GenomeLimits};
use crate::generation::{Evolver, GenerationSummary};

/// Upper bound on a single condvar sleep while waiting on state that
/// changes under another lock
const WAIT_SLICE: Duration = Duration::from_millis(20);

/// Where the worker is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CyclePhase {
    /// Waiting for a run command, nothing in flight
    Idle,
    /// A generation (or the diagnostic match) is in flight
    Running,
    /// The run ended with an error that needs reconfiguration
    Failed,
    /// The worker has exited
    Finished,
}

/// Result of asking the controller to stop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// Nothing was in flight
    Clean,
    /// Work was in flight; a forced interrupt would discard it
    Unsafe,
}

/// The generation-level and match-level output streams
#[derive(Clone)]
pub struct Sinks {
    pub ga: Arc<dyn LogSink>,
    pub matches: Arc<dyn LogSink>,
}

impl Sinks {
    /// Both streams forwarded to `tracing`
    pub fn tracing() -> Self {
        Self {
            ga: Arc::new(TracingSink::ga()),
            matches: Arc::new(TracingSink::matches()),
        }
    }

    /// Both streams kept in memory; the handles are returned for inspection
    pub fn memory() -> (Self, Arc<MemorySink>, Arc<MemorySink>) {
        let ga = Arc::new(MemorySink::new());
        let matches = Arc::new(MemorySink::new());
        let sinks = Self {
            ga: ga.clone(),
            matches: matches.clone(),
        };
        (sinks, ga, matches)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Evolve,
    Diagnostic,
}

struct Status {
    phase: CyclePhase,
    generation: u64,
    summaries: Vec<GenerationSummary>,
    last_error: Option<EngineError>,
    errors: u64,
}

struct Shared<G: Game> {
    game: Arc<G>,
    mode: Mode,
    level: RunLevel,
    num_players: usize,
    order: FitnessOrder,
    factory: Arc<PlayerFactory<G::Gene>>,
    coordinator: Arc<Coordinator>,
    config: Mutex<GaConfig>,
    status: Mutex<Status>,
    status_changed: Condvar,
    sinks: Sinks,
}

impl<G: Game> Shared<G> {
    fn status(&self) -> MutexGuard<'_, Status> {
        lock(&self.status)
    }

    fn update_status(&self, f: impl FnOnce(&mut Status)) {
        f(&mut self.status());
        self.status_changed.notify_all();
    }

    fn set_phase(&self, phase: CyclePhase) {
        self.update_status(|s| s.phase = phase);
    }

    fn record_error(&self, err: EngineError, phase: CyclePhase) {
        self.update_status(|s| {
            s.phase = phase;
            s.last_error = Some(err);
            s.errors += 1;
        });
    }

    fn runner(&self, seed: u64) -> MatchRunner<G> {
        MatchRunner::new(
            Arc::clone(&self.game),
            self.level.game_fidelity(),
            self.num_players,
            Arc::clone(&self.coordinator),
            Arc::clone(&self.sinks.matches),
            seed,
        )
    }
}

/// Run commands, status and waits shared by both controller kinds
pub struct Controller<G: Game> {
    shared: Arc<Shared<G>>,
    worker: Option<JoinHandle<()>>,
}

impl<G: Game> Controller<G> {
    pub(crate) fn spawn(game: Arc<G>, level: RunLevel, mode: Mode, sinks: Sinks, seed: u64) -> Result<Self> {
        let probe = game.probe().map_err(|e| {
            EngineError::contract(format!("{} could not be probed: {}", game.name(), e))
        })?;
        probe.validate()?;
        let GameProbe {
            num_players,
            players,
            dummy_players,
            fitness_order,
        } = probe;
        let factory = Arc::new(match level.player_fidelity() {
            Fidelity::Real => players,
            Fidelity::Dummy => dummy_players,
        });
        let config = GaConfig::for_game(num_players, factory.genome_len());

        let shared = Arc::new(Shared {
            game,
            mode,
            level,
            num_players,
            order: fitness_order,
            factory,
            coordinator: Arc::new(Coordinator::new()),
            config: Mutex::new(config),
            status: Mutex::new(Status {
                phase: CyclePhase::Idle,
                generation: 0,
                summaries: Vec::new(),
                last_error: None,
                errors: 0,
            }),
            status_changed: Condvar::new(),
            sinks,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(format!("gengames-{}", shared.game.name()))
            .spawn(move || match mode {
                Mode::Evolve => evolve_loop(worker_shared, seed),
                Mode::Diagnostic => play_single_match(worker_shared, seed),
            })
            .map_err(|e| {
                EngineError::ConcurrencyViolation(format!("could not start the worker thread: {}", e))
            })?;
        info!(game = shared.game.name(), %level, "controller started");

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    pub fn run_level(&self) -> RunLevel {
        self.shared.level
    }

    pub fn num_players(&self) -> usize {
        self.shared.num_players
    }

    pub fn limits(&self) -> GenomeLimits {
        GenomeLimits {
            num_players: self.shared.num_players,
            genome_len: self.shared.factory.genome_len(),
        }
    }

    // ========================================================================
    // Run commands
    // ========================================================================

    /// Run continuously, or pause with `false`
    pub fn set_running(&self, running: bool) -> Result<()> {
        if running {
            self.ensure_startable()?;
        }
        self.shared.coordinator.set_running(running);
        Ok(())
    }

    /// Clear every run command; the active match pauses at its next round
    pub fn pause(&self) {
        self.shared.coordinator.pause();
    }

    /// Finish the current or next generation, then pause
    pub fn step_generation(&self) -> Result<()> {
        if self.shared.mode == Mode::Diagnostic {
            return Err(EngineError::config("a single-match run has no generations"));
        }
        self.ensure_startable()?;
        self.shared.coordinator.step_generation();
        Ok(())
    }

    /// Finish the active match, or play the next one if none is active,
    /// then pause
    pub fn step_game(&self) -> Result<()> {
        self.ensure_startable()?;
        self.shared.coordinator.step_game();
        Ok(())
    }

    /// Play one round of the current or next match
    pub fn step_round(&self) -> Result<()> {
        self.ensure_startable()?;
        self.shared.coordinator.step_round();
        Ok(())
    }

    fn ensure_startable(&self) -> Result<()> {
        if self.shared.coordinator.is_shut_down() {
            return Err(EngineError::Shutdown);
        }
        let phase = self.shared.status().phase;
        match (self.shared.mode, phase) {
            (Mode::Diagnostic, CyclePhase::Finished | CyclePhase::Failed) => {
                Err(EngineError::config("the single match has already been played"))
            }
            (Mode::Evolve, CyclePhase::Finished) => Err(EngineError::Shutdown),
            (Mode::Evolve, CyclePhase::Failed) => {
                let config = *lock(&self.shared.config);
                if config.survivors() == 0 {
                    Err(EngineError::FatalPopulation {
                        population_size: config.population_size,
                        survival_rate: config.survival_rate,
                    })
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    // ========================================================================
    // Interrupts
    // ========================================================================

    /// No run command pending, nothing in flight.
    ///
    /// A single-match run only counts its match.
    pub fn is_quiescent(&self) -> bool {
        let coordinator = &self.shared.coordinator;
        match self.shared.mode {
            Mode::Diagnostic => !coordinator.match_in_progress(),
            Mode::Evolve => {
                !coordinator.flags().any()
                    && self.shared.status().phase != CyclePhase::Running
                    && !coordinator.match_in_progress()
            }
        }
    }

    /// Graceful stop: clear run commands and pause the active match.
    pub fn interrupt(&self) -> InterruptOutcome {
        self.shared.coordinator.pause();
        if self.is_quiescent() {
            InterruptOutcome::Clean
        } else {
            InterruptOutcome::Unsafe
        }
    }

    /// Forced stop: interrupt the active match and abandon the generation.
    ///
    /// On a quiescent controller this only clears run commands.
    pub fn force_interrupt(&self) -> InterruptOutcome {
        if self.is_quiescent() {
            self.shared.coordinator.pause();
            return InterruptOutcome::Clean;
        }
        self.shared.coordinator.request_abort();
        warn!(game = self.shared.game.name(), "forced interrupt, in-flight results are discarded");
        self.shared
            .sinks
            .ga
            .append_line("GA INTERRUPTED! Results of the interrupted work were discarded.");
        InterruptOutcome::Unsafe
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// A run command has not been picked up yet
    pub fn commands_pending(&self) -> bool {
        self.shared.coordinator.flags().any()
    }

    pub fn phase(&self) -> CyclePhase {
        self.shared.status().phase
    }

    /// Completed generations of the current population
    pub fn generation(&self) -> u64 {
        self.shared.status().generation
    }

    pub fn last_error(&self) -> Option<EngineError> {
        self.shared.status().last_error.clone()
    }

    /// Summaries of every completed generation of the current population
    pub fn summaries(&self) -> Vec<GenerationSummary> {
        self.shared.status().summaries.clone()
    }

    /// Block until `generation` generations have completed.
    ///
    /// # Returns
    /// `Ok(true)` when reached, `Ok(false)` on timeout, and the error if
    /// the worker reports one while waiting.
    pub fn wait_for_generation(&self, generation: u64, timeout: Duration) -> Result<bool> {
        let errors_before = self.shared.status().errors;
        let deadline = Instant::now() + timeout;
        let mut status = self.shared.status();
        loop {
            if status.generation >= generation {
                return Ok(true);
            }
            if status.errors > errors_before {
                return Err(status.last_error.clone().unwrap_or(EngineError::Interrupted));
            }
            if status.phase == CyclePhase::Finished {
                return Err(EngineError::Shutdown);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            status = self
                .shared
                .status_changed
                .wait_timeout(status, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Block until quiescent or `timeout` elapses
    pub fn wait_until_quiescent(&self, timeout: Duration) -> bool {
        self.wait_for(timeout, |this| this.is_quiescent())
    }

    /// Block until the worker is `Finished` or `Failed`
    pub fn wait_until_finished(&self, timeout: Duration) -> bool {
        self.wait_for(timeout, |this| {
            matches!(this.phase(), CyclePhase::Finished | CyclePhase::Failed)
        })
    }

    fn wait_for(&self, timeout: Duration, done: impl Fn(&Self) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if done(self) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let status = self.shared.status();
            let _ = self
                .shared
                .status_changed
                .wait_timeout(status, WAIT_SLICE.min(deadline - now))
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub(crate) fn config(&self) -> GaConfig {
        *lock(&self.shared.config)
    }

    /// Apply `f` to the configuration if quiescent; nothing changes on error
    pub(crate) fn update_config(&self, f: impl FnOnce(&mut GaConfig) -> Result<()>) -> Result<()> {
        let mut config = lock(&self.shared.config);
        if !self.is_quiescent() {
            return Err(EngineError::config(
                "cannot change the configuration while a generation or match is in flight",
            ));
        }
        let mut updated = *config;
        f(&mut updated)?;
        *config = updated;
        Ok(())
    }

    /// Stop the worker and wait for it to exit
    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn stop_worker(&mut self) {
        self.shared.coordinator.shutdown();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("worker thread panicked");
            }
        }
    }
}

impl<G: Game> Drop for Controller<G> {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

// ============================================================================
// Worker bodies
// ============================================================================

fn evolve_loop<G: Game>(shared: Arc<Shared<G>>, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut runner = shared.runner(rng.gen());
    let mut evolver: Option<Evolver<G::Gene>> = None;

    loop {
        shared.coordinator.clear_abort();
        match shared.coordinator.wait_for_authorization() {
            Ok(_) => {}
            Err(EngineError::Shutdown) => break,
            Err(_) => continue,
        }

        let config = *lock(&shared.config);
        shared.set_phase(CyclePhase::Running);

        if evolver.is_none() {
            match Evolver::seed(
                Arc::clone(&shared.factory),
                shared.order,
                shared.num_players,
                &config,
                Arc::clone(&shared.sinks.ga),
                &mut rng,
            ) {
                Ok(seeded) => {
                    evolver = Some(seeded);
                    shared.update_status(|s| {
                        s.generation = 0;
                        s.summaries.clear();
                    });
                }
                Err(e) => {
                    error!(error = %e, "could not seed the population");
                    shared.coordinator.pause();
                    shared.record_error(e, CyclePhase::Failed);
                    continue;
                }
            }
        }
        let Some(current) = evolver.as_mut() else {
            continue;
        };

        match current.run_generation(&config, &mut runner, &mut rng) {
            Ok(summary) => {
                shared.coordinator.finish_generation();
                shared.update_status(|s| {
                    s.generation = summary.generation;
                    s.summaries.push(summary);
                    s.phase = CyclePhase::Idle;
                });
            }
            Err(EngineError::Shutdown) => break,
            Err(EngineError::Interrupted) => {
                shared.coordinator.pause();
                warn!("generation interrupted before completion, results discarded");
                shared
                    .sinks
                    .ga
                    .append_line("Generation interrupted before completion. Its results were discarded.");
                shared.record_error(EngineError::Interrupted, CyclePhase::Idle);
            }
            Err(e @ EngineError::FatalPopulation { .. }) => {
                evolver = None;
                shared.coordinator.pause();
                error!(error = %e, "population died out");
                shared.sinks.ga.append_line(&e.to_string());
                shared.record_error(e, CyclePhase::Failed);
            }
            Err(e) => {
                shared.coordinator.pause();
                error!(error = %e, "generation aborted");
                shared.sinks.ga.append_line(&e.to_string());
                shared.record_error(e, CyclePhase::Idle);
            }
        }
    }

    shared.set_phase(CyclePhase::Finished);
    info!("evolution worker stopped");
}

fn play_single_match<G: Game>(shared: Arc<Shared<G>>, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let population = match Population::seed(&shared.factory, shared.num_players, &mut rng) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "could not seed the players");
            shared.record_error(e, CyclePhase::Failed);
            return;
        }
    };

    shared.sinks.ga.replace("Starting game between:");
    for p in population.iter() {
        shared.sinks.ga.append_line(&p.to_string());
    }

    let mut runner = shared.runner(rng.gen());
    match runner.play_match(population.players().to_vec()) {
        Ok(result) => {
            shared.sinks.ga.append_line("Game over.");
            for (id, score) in &result.scores {
                shared
                    .sinks
                    .ga
                    .append_line(&format!("Player {} scored {}", id, score));
            }
            shared.set_phase(CyclePhase::Finished);
        }
        Err(EngineError::Shutdown) => shared.set_phase(CyclePhase::Finished),
        Err(EngineError::Interrupted) => {
            warn!("single match interrupted");
            shared.record_error(EngineError::Interrupted, CyclePhase::Finished);
        }
        Err(e) => {
            error!(error = %e, "single match failed");
            shared.sinks.ga.append_line(&e.to_string());
            shared.record_error(e, CyclePhase::Failed);
        }
    }
}
