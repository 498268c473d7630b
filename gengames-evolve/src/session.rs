//! Session launcher - picks the controller a run level needs
//!
//! The run level is fixed for the life of a session; switching levels means
//! dropping the session and launching a new one.

use std::sync::Arc;

use gengames_core::{Game, Result, RunLevel};

use crate::controller::{Controller, Sinks};
use crate::cycle::EvolutionCycle;
use crate::diagnostic::DiagnosticRun;

pub enum Session<G: Game> {
    Evolution(EvolutionCycle<G>),
    Diagnostic(DiagnosticRun<G>),
}

impl<G: Game> Session<G> {
    pub fn launch(game: Arc<G>, level: RunLevel, sinks: Sinks, seed: u64) -> Result<Self> {
        if level.is_evolution() {
            EvolutionCycle::new(game, level, sinks, seed).map(Session::Evolution)
        } else {
            DiagnosticRun::new(game, level, sinks, seed).map(Session::Diagnostic)
        }
    }

    pub fn control(&self) -> &Controller<G> {
        match self {
            Session::Evolution(cycle) => cycle.control(),
            Session::Diagnostic(run) => run.control(),
        }
    }

    /// The configuration surface, for evolving sessions
    pub fn evolution(&self) -> Option<&EvolutionCycle<G>> {
        match self {
            Session::Evolution(cycle) => Some(cycle),
            Session::Diagnostic(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::OnesGame;

    #[test]
    fn test_launch_matches_run_level() {
        for level in RunLevel::ALL {
            let (sinks, _, _) = Sinks::memory();
            let session = Session::launch(Arc::new(OnesGame { rounds: 1 }), level, sinks, 42).unwrap();
            assert_eq!(session.control().run_level(), level);
            assert_eq!(session.evolution().is_some(), level.is_evolution());
        }
    }
}
