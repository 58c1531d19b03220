//! Error types for population partitioning.

use thiserror::Error;

/// Errors raised by the characteristic set, the population store and the
/// resolver driver.
///
/// Every variant except [`PopulationError::UnresolvedCharacteristic`] is
/// fatal to the computation. That variant is the request, made by an
/// evaluation function, to split the population it was handed; only the
/// resolver driver acts on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PopulationError {
    /// A characteristic's level proportions are invalid or do not sum to 1.
    #[error("invalid proportions for characteristic '{characteristic}': {reason}")]
    InvalidProportions {
        characteristic: String,
        reason: String,
    },

    /// Malformed characteristic name, or a duplicate name or level.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A population size was negative or not finite.
    #[error("invalid population size: {0}")]
    InvalidSize(f64),

    /// The store has no entry for the given population.
    #[error("unknown population: {0}")]
    UnknownPopulation(String),

    /// The characteristic is already resolved on the population.
    #[error("characteristic '{characteristic}' is already resolved on {population}")]
    AlreadyResolved {
        characteristic: String,
        population: String,
    },

    /// The characteristic name is not declared by the characteristic set.
    #[error("unknown characteristic: {0}")]
    UnknownCharacteristic(String),

    /// An unresolved characteristic was read in strict mode.
    #[error("characteristic '{0}' is unresolved")]
    UnresolvedCharacteristic(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for population operations.
pub type PopulationResult<T> = Result<T, PopulationError>;

/// Recognizes the "characteristic not yet known" signal inside an error.
///
/// The resolver driver is generic over the error type of the evaluation
/// function; this trait is how it tells the expansion request apart from a
/// real failure. Domain error types that wrap [`PopulationError`] implement
/// it by delegating.
pub trait ResolutionSignal {
    /// The characteristic whose resolution is requested, if this error is
    /// the expansion signal.
    fn requested_characteristic(&self) -> Option<&str>;
}

impl ResolutionSignal for PopulationError {
    fn requested_characteristic(&self) -> Option<&str> {
        match self {
            PopulationError::UnresolvedCharacteristic(name) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = PopulationError::UnresolvedCharacteristic("risk_level".into());
        assert_eq!(err.to_string(), "characteristic 'risk_level' is unresolved");

        let err = PopulationError::InvalidSize(-1.0);
        assert_eq!(err.to_string(), "invalid population size: -1");

        let err = PopulationError::AlreadyResolved {
            characteristic: "age_group".into(),
            population: "{age_group=adult}".into(),
        };
        assert!(err.to_string().contains("age_group=adult"));
    }

    #[test]
    fn only_unresolved_is_a_signal() {
        let signal = PopulationError::UnresolvedCharacteristic("sex".into());
        assert_eq!(signal.requested_characteristic(), Some("sex"));

        let errors = vec![
            PopulationError::InvalidKey("1abc".into()),
            PopulationError::InvalidSize(-2.0),
            PopulationError::UnknownPopulation("{}".into()),
            PopulationError::UnknownCharacteristic("foo".into()),
            PopulationError::Configuration("bad".into()),
        ];
        for e in &errors {
            assert!(e.requested_characteristic().is_none());
        }
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PopulationError>();
    }
}
