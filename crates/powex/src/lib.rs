//! # Powex
//!
//! Lazy Taylor-series expansion of expression graphs.
//!
//! Build an expression over an independent variable `t`, ask any node for
//! its series to some order, and read back coefficients, derivatives or
//! truncated values near the expansion point. Unknown functions governed by
//! `x' = f(x, t)` are expanded through the same recurrences, which turns the
//! graph into a Taylor-method ODE integrator.
//!
//! ## Quick Start
//!
//! ```
//! use powex::prelude::*;
//!
//! // x' = -x, x(0) = 1
//! let mut g = SeriesGraph::new();
//! let t = g.independent(0.0);
//! let x = g.dependent();
//! let rhs = g.negate(x);
//! g.set_ode(x, rhs);
//! g.reset_dependent(x, 1.0);
//!
//! let mut stepper = TaylorStepper::new(g, t, vec![x], StepperConfig::default()).unwrap();
//! let trajectory = stepper.integrate_to(1.0).unwrap();
//! let (_, state) = trajectory.last().unwrap();
//! assert!((state[0] - (-1.0f64).exp()).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use powex_core as core;
pub use powex_ode as ode;

#[cfg(test)]
mod tests;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use powex_core::{
        CostModel, CostReport, DependentState, DependentVar, IndependentVar, NodeFlags, NodeId, Parameter,
        SeriesError, SeriesGraph, TrigRole,
    };
    pub use powex_ode::{
        evaluate_batch, expand_batch, step_batch, BatchConfig, StepReport, StepperConfig, StepperError,
        TaylorStepper, Trajectory,
    };
}
