//! Fixed-order Taylor method for systems bound with `set_ode`.
//!
//! Each step expands every unknown about the current time, sums the
//! truncated series at `h`, then slides the expansion window forward:
//! the independent variable moves to `t + h` and every unknown restarts at
//! its new value. Only order 0 survives a step, so the cost of a step does
//! not depend on how many steps came before.

use powex_core::{DependentState, DependentVar, IndependentVar, SeriesGraph};
use tracing::{debug, instrument, trace};

use crate::error::{Result, StepperError};

/// A final step may overshoot `step` by this relative amount rather than
/// leave a sliver behind.
const STEP_SLACK: f64 = 1e-9;

/// Configuration for [`TaylorStepper`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepperConfig {
    /// Truncation order of every series.
    pub order: usize,
    /// Nominal step size.
    pub step: f64,
    /// Most steps a single `integrate_to` may take.
    pub max_steps: usize,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            order: 20,
            step: 0.1,
            max_steps: 10_000,
        }
    }
}

impl StepperConfig {
    /// Checks that the configuration can drive a stepper.
    ///
    /// # Errors
    ///
    /// [`StepperError::InvalidConfig`] for a zero order, a step that is not
    /// finite and positive, or a zero step limit.
    pub fn validate(&self) -> Result<()> {
        if self.order == 0 {
            return Err(StepperError::InvalidConfig("order must be at least 1".into()));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(StepperError::InvalidConfig(format!(
                "step must be finite and positive, got {}",
                self.step
            )));
        }
        if self.max_steps == 0 {
            return Err(StepperError::InvalidConfig("max_steps must be at least 1".into()));
        }
        Ok(())
    }
}

/// Outcome of one step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// Time at the end of the step.
    pub t: f64,
    /// Step actually taken.
    pub h: f64,
    /// Values of the unknowns at `t`, in the order they were registered.
    pub state: Vec<f64>,
    /// Largest over all unknowns of `|c_{n-1}| |h|^{n-1} + |c_n| |h|^n`.
    pub truncation_estimate: f64,
}

/// Sampled solution returned by [`TaylorStepper::integrate_to`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    /// Sample times, starting at the initial time.
    pub times: Vec<f64>,
    /// One row of unknown values per sample time.
    pub states: Vec<Vec<f64>>,
    /// Largest truncation estimate over all steps.
    pub max_truncation_estimate: f64,
}

impl Trajectory {
    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True when there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The final sample.
    #[must_use]
    pub fn last(&self) -> Option<(f64, &[f64])> {
        let t = *self.times.last()?;
        let state = self.states.last()?;
        Some((t, state.as_slice()))
    }

    fn push(&mut self, t: f64, state: Vec<f64>) {
        self.times.push(t);
        self.states.push(state);
    }
}

/// Integrates the unknowns of a graph with the Taylor method.
///
/// The graph is owned by the stepper; read it back with
/// [`graph`](Self::graph) or [`into_graph`](Self::into_graph).
#[derive(Clone, Debug)]
pub struct TaylorStepper {
    graph: SeriesGraph,
    time: IndependentVar,
    unknowns: Vec<DependentVar>,
    state: Vec<f64>,
    config: StepperConfig,
    steps_taken: usize,
}

impl TaylorStepper {
    /// Creates a stepper over `unknowns`, each of which must already be bound
    /// with `set_ode` and given an initial value with `reset_dependent`.
    ///
    /// # Errors
    ///
    /// [`StepperError::InvalidConfig`] if the configuration is invalid, the
    /// list of unknowns is empty, or an unknown is unbound or has no
    /// initial value.
    pub fn new(
        graph: SeriesGraph,
        time: IndependentVar,
        unknowns: Vec<DependentVar>,
        config: StepperConfig,
    ) -> Result<Self> {
        config.validate()?;
        if unknowns.is_empty() {
            return Err(StepperError::InvalidConfig("no unknowns to integrate".into()));
        }

        let mut state = Vec::with_capacity(unknowns.len());
        for &x in &unknowns {
            if !matches!(graph.dependent_state(x), DependentState::OdeBound { .. }) {
                return Err(StepperError::InvalidConfig(format!(
                    "unknown {x} is not bound to an equation"
                )));
            }
            let x0 = graph
                .initial_value(x)
                .ok_or_else(|| StepperError::InvalidConfig(format!("unknown {x} has no initial value")))?;
            state.push(x0);
        }

        Ok(Self {
            graph,
            time,
            unknowns,
            state,
            config,
            steps_taken: 0,
        })
    }

    /// Current time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.graph.expansion_point(self.time)
    }

    /// Current values of the unknowns.
    #[must_use]
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    /// Steps taken since construction.
    #[must_use]
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &StepperConfig {
        &self.config
    }

    /// The underlying graph.
    #[must_use]
    pub fn graph(&self) -> &SeriesGraph {
        &self.graph
    }

    /// Gives the graph back.
    #[must_use]
    pub fn into_graph(self) -> SeriesGraph {
        self.graph
    }

    /// Takes one step of the configured size.
    ///
    /// # Errors
    ///
    /// [`StepperError::Series`] if the expansion fails. The stepper is left
    /// at the time it started from.
    pub fn step(&mut self) -> Result<StepReport> {
        self.step_by(self.config.step)
    }

    /// Takes one step of size `h`, which may be negative.
    ///
    /// # Errors
    ///
    /// [`StepperError::InvalidConfig`] if `h` is not finite, and
    /// [`StepperError::Series`] if the expansion fails.
    pub fn step_by(&mut self, h: f64) -> Result<StepReport> {
        if !h.is_finite() {
            return Err(StepperError::InvalidConfig(format!("step must be finite, got {h}")));
        }
        let target = self.time() + h;
        self.advance(h, target)
    }

    #[instrument(skip(self), fields(t = self.time()))]
    fn advance(&mut self, h: f64, target: f64) -> Result<StepReport> {
        let order = self.config.order;

        for &x in &self.unknowns {
            self.graph.expand_to_order(x, order)?;
        }

        let mut next = Vec::with_capacity(self.unknowns.len());
        let mut estimate = 0.0_f64;
        for &x in &self.unknowns {
            next.push(self.graph.evaluate_to_order(x, h, order)?);

            let tail = self.graph.coefficient(x, order - 1)?.abs() * h.abs().powi(pow_index(order - 1))
                + self.graph.coefficient(x, order)?.abs() * h.abs().powi(pow_index(order));
            estimate = estimate.max(tail);
        }

        self.graph.reset_independent(self.time, target);
        for (&x, &value) in self.unknowns.iter().zip(&next) {
            self.graph.reset_dependent(x, value);
        }
        self.state.clone_from(&next);
        self.steps_taken += 1;
        trace!(t = target, estimate, "step taken");

        Ok(StepReport {
            t: target,
            h,
            state: next,
            truncation_estimate: estimate,
        })
    }

    /// Integrates up to `t_end`, shortening the final step to land on it
    /// exactly. `t_end` may lie behind the current time.
    ///
    /// The trajectory includes the starting point.
    ///
    /// # Errors
    ///
    /// [`StepperError::InvalidConfig`] if `t_end` is not finite,
    /// [`StepperError::StepLimitExceeded`] after `max_steps` steps, and
    /// [`StepperError::Series`] if an expansion fails.
    #[instrument(skip(self), fields(t = self.time(), order = self.config.order))]
    pub fn integrate_to(&mut self, t_end: f64) -> Result<Trajectory> {
        if !t_end.is_finite() {
            return Err(StepperError::InvalidConfig(format!("end time must be finite, got {t_end}")));
        }

        let mut trajectory = Trajectory::default();
        trajectory.push(self.time(), self.state.clone());

        let step = self.config.step;
        let mut taken = 0;
        loop {
            let t = self.time();
            let remaining = t_end - t;
            if remaining == 0.0 {
                break;
            }
            if taken == self.config.max_steps {
                return Err(StepperError::StepLimitExceeded {
                    max_steps: self.config.max_steps,
                    reached: t,
                    target: t_end,
                });
            }

            let report = if remaining.abs() <= step * (1.0 + STEP_SLACK) {
                self.advance(remaining, t_end)?
            } else {
                let h = step.copysign(remaining);
                self.advance(h, t + h)?
            };
            taken += 1;

            trajectory.max_truncation_estimate =
                trajectory.max_truncation_estimate.max(report.truncation_estimate);
            trajectory.push(report.t, report.state);
        }

        debug!(steps = taken, t_end, "integration finished");
        Ok(trajectory)
    }
}

fn pow_index(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
