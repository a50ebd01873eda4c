//! Errors raised while expanding or reading a series graph.

use thiserror::Error;

use crate::handle::NodeId;

/// Errors that can occur during coefficient computation.
///
/// Every failure is deterministic: retrying the same call on the same graph
/// reproduces it.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SeriesError {
    /// The leading coefficient of an operand lies outside the analytic
    /// domain of the function.
    #[error("{function} is undefined at {argument} (node {node})")]
    Domain {
        /// Node whose order-0 coefficient failed.
        node: NodeId,
        /// Name of the elementary function.
        function: &'static str,
        /// Offending leading coefficient of the operand.
        argument: f64,
    },

    /// A recurrence needs to divide by a leading coefficient that is zero.
    #[error("leading coefficient of the divisor is zero (node {node})")]
    DivisionByZeroCoefficient {
        /// Node whose recurrence divides by the zero coefficient.
        node: NodeId,
    },

    /// A coefficient was requested before it could be validated.
    #[error("order {requested} requested but node {node} is validated through {validated:?}")]
    InsufficientOrder {
        /// Node that was read.
        node: NodeId,
        /// Order asked for.
        requested: usize,
        /// Highest valid order at the time of the request.
        validated: Option<usize>,
    },

    /// Externally supplied coefficients skipped or repeated an order.
    #[error("coefficient {supplied} supplied out of sequence for node {node}, expected {expected}")]
    OutOfSequenceCoefficient {
        /// Dependent variable receiving the coefficient.
        node: NodeId,
        /// The only order that would have been accepted.
        expected: usize,
        /// The order that was supplied.
        supplied: usize,
    },
}

/// Result type for series operations.
pub type Result<T> = std::result::Result<T, SeriesError>;
