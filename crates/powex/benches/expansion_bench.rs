//! Benchmarks for series expansion and Taylor stepping.
//!
//! Includes:
//! - Expansion of elementary functions to increasing orders
//! - Cauchy products of general series
//! - ODE steps through the dependent-variable recurrence

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use powex::prelude::*;

/// `sin(exp(t)) * log(2 + t)` about `t = 0.3`.
fn mixed_graph() -> (SeriesGraph, NodeId) {
    let mut g = SeriesGraph::new();
    let t = g.independent(0.3);
    let e = g.exp(t);
    let s = g.sin(e);
    let two = g.constant(2.0);
    let shifted = g.add(two, t);
    let l = g.log(shifted);
    let root = g.mul(s, l);
    (g, root)
}

/// Benchmark expansion of a mixed expression from scratch.
fn bench_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand");

    for order in [10, 30, 100] {
        let (graph, root) = mixed_graph();
        group.bench_with_input(BenchmarkId::new("mixed", order), &order, |b, &order| {
            b.iter(|| {
                let mut g = graph.clone();
                g.expand_to_order(root, order).unwrap();
                black_box(g.coefficient(root, order).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark the Cauchy product of two general series.
fn bench_mul(c: &mut Criterion) {
    let mut group = c.benchmark_group("mul");

    for order in [10, 50, 200] {
        let mut graph = SeriesGraph::new();
        let t = graph.independent(0.0);
        let e = graph.exp(t);
        let (s, _) = graph.sin_cos(e);
        let p = graph.mul(e, s);
        graph.expand_to_order(e, order).unwrap();
        graph.expand_to_order(s, order).unwrap();

        group.bench_with_input(BenchmarkId::new("exp_times_sin", order), &order, |b, &order| {
            b.iter(|| {
                let mut g = graph.clone();
                g.expand_to_order(p, order).unwrap();
                black_box(g.coefficient(p, order).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark single Taylor steps of the harmonic oscillator.
fn bench_ode_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("ode_step");

    for order in [8, 16, 32] {
        let mut g = SeriesGraph::new();
        let t = g.independent(0.0);
        let x = g.dependent();
        let y = g.dependent();
        let minus_x = g.negate(x);
        g.set_ode(x, y);
        g.set_ode(y, minus_x);
        g.reset_dependent(x, 0.0);
        g.reset_dependent(y, 1.0);

        let config = StepperConfig {
            order,
            ..StepperConfig::default()
        };
        let stepper = TaylorStepper::new(g, t, vec![x, y], config).unwrap();

        group.bench_with_input(BenchmarkId::new("oscillator", order), &order, |b, _| {
            b.iter(|| {
                let mut s = stepper.clone();
                black_box(s.step().unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark the flop-cost walk against real expansion.
fn bench_cost(c: &mut Criterion) {
    let (graph, root) = mixed_graph();
    c.bench_function("flop_cost_mixed_50", |b| {
        b.iter(|| black_box(graph.flop_cost(root, 50)));
    });
}

criterion_group!(expansion_benches, bench_expand, bench_mul, bench_ode_step, bench_cost);

criterion_main!(expansion_benches);
