//! Error taxonomy shared by the whole engine

use thiserror::Error;

/// Everything that can go wrong while configuring or running the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Invalid value, or a valid change attempted while not quiescent.
    /// Rejected synchronously; nothing is mutated.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A pluggable game failed its construction contract.
    #[error("game implementation violated its contract: {0}")]
    ContractViolation(String),

    /// The engine tried something the coordinator cannot reconcile,
    /// such as starting a second match while one is active.
    #[error("concurrency invariant violated: {0}")]
    ConcurrencyViolation(String),

    /// Pruning would leave nobody to breed from.
    #[error(
        "no surviving population: {population_size} players at a survival rate of {survival_rate} \
         leaves zero survivors, turn the survival rate up"
    )]
    FatalPopulation {
        population_size: usize,
        survival_rate: f64,
    },

    /// A match ended abnormally or the generation was forcibly interrupted.
    #[error("interrupted before completion, in-flight results were discarded")]
    Interrupted,

    /// The controller thread has been shut down.
    #[error("the controller has shut down")]
    Shutdown,
}

impl EngineError {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::Configuration(msg.into())
    }

    /// Shorthand for a contract violation
    pub fn contract(msg: impl Into<String>) -> Self {
        EngineError::ContractViolation(msg.into())
    }

    /// Whether this error ends the run rather than just the current generation
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineError::FatalPopulation { .. } | EngineError::Shutdown)
    }
}

/// Result alias used across the engine
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_population_message_names_the_numbers() {
        let err = EngineError::FatalPopulation {
            population_size: 3,
            survival_rate: 0.2,
        };
        let msg = err.to_string();
        assert!(msg.contains("3 players"));
        assert!(msg.contains("0.2"));
        assert!(err.is_terminal());
    }

    #[test]
    fn test_generation_level_errors_are_not_terminal() {
        assert!(!EngineError::Interrupted.is_terminal());
        assert!(!EngineError::contract("no constructor").is_terminal());
        assert!(!EngineError::config("bad").is_terminal());
    }
}
