//! Error types for the nirsevimab calculator.

use drugdemand_population::{PopulationError, ResolutionSignal};
use thiserror::Error;

/// Errors that can occur while projecting nirsevimab demand.
#[derive(Debug, Error)]
pub enum NirsevimabError {
    /// Failure (or resolution request) from the population engine.
    #[error(transparent)]
    Population(#[from] PopulationError),

    /// Scenario parameters are out of range or inconsistent.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    /// Birth or weight reference data is unusable.
    #[error("invalid input data: {0}")]
    InvalidInput(String),

    /// A characteristic holds a level of the wrong type.
    #[error("characteristic '{characteristic}' expected a {expected} level, found {found}")]
    LevelType {
        characteristic: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A scenario parameter has the same name as a result column.
    #[error("parameter '{0}' collides with a result column")]
    ColumnCollision(String),

    /// A dose count was negative or not finite.
    #[error("negative dose quantity: {0}")]
    NegativeQuantity(f64),

    /// Quantities of different dosages cannot be combined.
    #[error("cannot combine {left} with {right}")]
    DosageMismatch { left: String, right: String },

    /// Scenario parameters could not be parsed.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for calculator operations.
pub type NirsevimabResult<T> = Result<T, NirsevimabError>;

impl ResolutionSignal for NirsevimabError {
    fn requested_characteristic(&self) -> Option<&str> {
        match self {
            NirsevimabError::Population(err) => err.requested_characteristic(),
            _ => None,
        }
    }
}
