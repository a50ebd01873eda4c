//! Lazy Taylor-series expansion graphs.
//!
//! A [`SeriesGraph`] holds expression nodes in an arena. Each node expands
//! its own truncated Taylor series about a shared expansion point, one
//! order at a time, from the coefficients of its operands:
//!
//! - Arithmetic: `+`, `-`, `*`, `/`, negation
//! - Elementary functions: `exp`, `log`, `sqrt`, `pow`, coupled `sin`/`cos`
//! - Dependent variables seeded with data or bound to `x' = rhs`
//!
//! # Example
//!
//! ```
//! use powex_core::SeriesGraph;
//!
//! let mut g = SeriesGraph::new();
//! let t = g.independent(0.0);
//! let e = g.exp(t);
//! g.expand_to_order(e, 4).unwrap();
//! assert_eq!(g.coefficient(e, 2).unwrap(), 0.5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]

pub mod buffer;
pub mod cost;
pub mod error;
pub mod graph;
pub mod handle;
pub mod node;
mod recurrence;

#[cfg(test)]
mod proptests;

pub use buffer::CoefficientBuffer;
pub use cost::{CostModel, CostReport};
pub use error::{Result, SeriesError};
pub use graph::SeriesGraph;
pub use handle::{DependentVar, IndependentVar, NodeId, Parameter};
pub use node::{DependentState, NodeFlags, TrigRole};
