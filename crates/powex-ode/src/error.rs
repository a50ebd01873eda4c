//! Errors raised while stepping or batching.

use powex_core::SeriesError;
use thiserror::Error;

/// Errors from [`TaylorStepper`](crate::TaylorStepper).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum StepperError {
    /// Expanding or evaluating a series failed.
    #[error(transparent)]
    Series(#[from] SeriesError),

    /// The configuration or the supplied graph cannot be stepped.
    #[error("invalid stepper configuration: {0}")]
    InvalidConfig(String),

    /// `integrate_to` ran out of steps before reaching its target.
    #[error("step limit of {max_steps} reached at t = {reached} before t = {target}")]
    StepLimitExceeded {
        /// Configured limit.
        max_steps: usize,
        /// Time reached when the limit hit.
        reached: f64,
        /// Requested end time.
        target: f64,
    },
}

/// Result type for stepping.
pub type Result<T> = std::result::Result<T, StepperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_error_is_transparent() {
        let mut g = powex_core::SeriesGraph::new();
        let x = g.dependent();
        let inner = g.expand_to_order(x, 0).unwrap_err();
        let outer = StepperError::from(inner.clone());
        assert_eq!(outer.to_string(), inner.to_string());
    }

    #[test]
    fn test_step_limit_display() {
        let err = StepperError::StepLimitExceeded {
            max_steps: 3,
            reached: 0.5,
            target: 1.0,
        };
        assert_eq!(
            err.to_string(),
            "step limit of 3 reached at t = 0.5 before t = 1"
        );
    }
}
