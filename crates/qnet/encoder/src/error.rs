//! Encoding errors

use qnet_types::{FactorError, Metric};
use thiserror::Error;

/// Input rejected before simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("metric {metric} is not finite: {value}")]
    NonFiniteMetric { metric: Metric, value: f64 },

    #[error("metric {metric} must be >= 0, got {value}")]
    NegativeMetric { metric: Metric, value: f64 },

    #[error("metric {metric} = {value} overflows its rotation angle")]
    NonFiniteAngle { metric: Metric, value: f64 },

    #[error(transparent)]
    InvalidFactor(#[from] FactorError),
}

impl EncodeError {
    /// The metric the rejected value belongs to.
    pub fn metric(&self) -> Metric {
        match self {
            EncodeError::NonFiniteMetric { metric, .. }
            | EncodeError::NegativeMetric { metric, .. }
            | EncodeError::NonFiniteAngle { metric, .. } => *metric,
            EncodeError::InvalidFactor(err) => err.metric,
        }
    }
}
