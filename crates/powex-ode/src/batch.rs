//! Parallel expansion of many independent graphs.
//!
//! A single graph is expanded sequentially, but separate graphs share
//! nothing and can be driven from different threads. Below
//! [`BatchConfig::parallel_threshold`] the work stays on the calling thread.

use powex_core::{NodeId, SeriesGraph};
use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::stepper::{StepReport, TaylorStepper};

/// Configuration for batch operations.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Minimum batch size to enable parallelism.
    pub parallel_threshold: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 16,
        }
    }
}

fn run<T, R, F>(items: &mut [T], config: &BatchConfig, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(&mut T) -> R + Send + Sync,
{
    if items.len() < config.parallel_threshold {
        // Fall back to sequential for small batches
        items.iter_mut().map(f).collect()
    } else {
        debug!(jobs = items.len(), "running batch in parallel");
        items.par_iter_mut().map(f).collect()
    }
}

/// Expands the root of every graph to `order`.
///
/// Returns one result per graph, in input order.
pub fn expand_batch(
    jobs: &mut [(SeriesGraph, NodeId)],
    order: usize,
    config: &BatchConfig,
) -> Vec<powex_core::Result<()>> {
    run(jobs, config, |(graph, root)| graph.expand_to_order(*root, order))
}

/// Expands the root of every graph to `order` and evaluates the series,
/// truncated at that order, at offset `h`.
///
/// Returns one result per graph, in input order.
pub fn evaluate_batch(
    jobs: &mut [(SeriesGraph, NodeId)],
    h: f64,
    order: usize,
    config: &BatchConfig,
) -> Vec<powex_core::Result<f64>> {
    run(jobs, config, |(graph, root)| graph.evaluate_to_order(*root, h, order))
}

/// Advances every stepper by one step of its configured size.
pub fn step_batch(steppers: &mut [TaylorStepper], config: &BatchConfig) -> Vec<Result<StepReport>> {
    run(steppers, config, TaylorStepper::step)
}
