//! Taylor-method ODE integration and batch evaluation for powex.
//!
//! This crate provides:
//! - [`TaylorStepper`]: fixed-order Taylor steps over a [`SeriesGraph`](powex_core::SeriesGraph)
//! - Batch expansion and evaluation of independent graphs with rayon

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod batch;
pub mod error;
pub mod stepper;

pub use batch::{evaluate_batch, expand_batch, step_batch, BatchConfig};
pub use error::{Result, StepperError};
pub use stepper::{StepReport, StepperConfig, TaylorStepper, Trajectory};
