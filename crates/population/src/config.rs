//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PopulationError, PopulationResult};

/// Default tolerance when checking that proportions sum to 1.
pub const DEFAULT_PROPORTION_TOLERANCE: f64 = 1e-6;

/// Order in which the resolver driver visits pending populations.
///
/// Results are the same under either order; only the interleaving of
/// yielded leaves differs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalOrder {
    /// Children of a partition queue behind the remaining work.
    #[default]
    BreadthFirst,
    /// Children of a partition are evaluated next.
    DepthFirst,
}

/// Configuration for characteristic validation and resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Allowed deviation of a characteristic's proportion sum from 1.
    pub proportion_tolerance: f64,
    /// Visiting order of the resolver's work stack.
    pub traversal: TraversalOrder,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            proportion_tolerance: DEFAULT_PROPORTION_TOLERANCE,
            traversal: TraversalOrder::default(),
        }
    }
}

impl PopulationConfig {
    pub fn with_traversal(mut self, traversal: TraversalOrder) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn with_proportion_tolerance(mut self, tolerance: f64) -> Self {
        self.proportion_tolerance = tolerance;
        self
    }

    /// Reject tolerances that would make proportion validation meaningless.
    pub fn validate(&self) -> PopulationResult<()> {
        if !self.proportion_tolerance.is_finite() || self.proportion_tolerance <= 0.0 {
            return Err(PopulationError::Configuration(format!(
                "proportion_tolerance must be finite and positive, got {}",
                self.proportion_tolerance
            )));
        }
        Ok(())
    }
}
