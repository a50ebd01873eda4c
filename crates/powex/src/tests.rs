//! End-to-end tests across the engine and the stepper.

#[cfg(test)]
mod integration_tests {
    use crate::prelude::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_parameter_sweep_requires_invalidation() {
        // y = exp(p * t) about t = 0
        let mut g = SeriesGraph::new();
        let t = g.independent(0.0);
        let p = g.parameter(1.0);
        let pt = g.mul(p, t);
        let y = g.exp(pt);

        g.expand_to_order(y, 5).unwrap();
        assert_relative_eq!(g.coefficient(y, 3).unwrap(), 1.0 / 6.0, max_relative = 1e-14);

        g.set_parameter(p, 2.0);
        // Stale until the caller invalidates
        assert_relative_eq!(g.coefficient(y, 3).unwrap(), 1.0 / 6.0, max_relative = 1e-14);

        g.invalidate(y);
        g.expand_to_order(y, 5).unwrap();
        assert_relative_eq!(g.coefficient(y, 3).unwrap(), 8.0 / 6.0, max_relative = 1e-14);
    }

    #[test]
    fn test_moving_expansion_point() {
        let mut g = SeriesGraph::new();
        let t = g.independent(0.0);
        let s = g.sin(t);
        g.expand_to_order(s, 8).unwrap();
        assert_abs_diff_eq!(g.coefficient(s, 0).unwrap(), 0.0);

        g.reset_independent(t, 1.0);
        g.invalidate(s);
        g.expand_to_order(s, 8).unwrap();
        assert_relative_eq!(g.coefficient(s, 0).unwrap(), 1.0f64.sin(), max_relative = 1e-15);
        assert_relative_eq!(g.derivative(s, 1).unwrap(), 1.0f64.cos(), max_relative = 1e-15);
        assert_relative_eq!(g.derivative(s, 2).unwrap(), -1.0f64.sin(), max_relative = 1e-14);
        assert_relative_eq!(g.evaluate(s, 0.5).unwrap(), 1.5f64.sin(), max_relative = 1e-7);
    }

    #[test]
    fn test_seeded_data_drives_expression() {
        // u(t) supplied as 1 + t + t^2, composed into sqrt(u)
        let mut g = SeriesGraph::new();
        let u = g.dependent();
        let r = g.sqrt(u);
        for (k, c) in [1.0, 1.0, 1.0].into_iter().enumerate() {
            g.set_coeff(u, k, c).unwrap();
        }
        assert_eq!(g.dependent_state(u), DependentState::SeededWithData);

        g.expand_to_order(r, 2).unwrap();
        // sqrt(1 + t + t^2) = 1 + t/2 + 3t^2/8 + ...
        assert_relative_eq!(g.coefficient(r, 1).unwrap(), 0.5);
        assert_relative_eq!(g.coefficient(r, 2).unwrap(), 0.375);

        assert!(matches!(
            g.expand_to_order(r, 3),
            Err(SeriesError::InsufficientOrder { .. })
        ));
    }

    #[test]
    fn test_logistic_growth() {
        // x' = x (1 - x), x(0) = 1/2 gives x = 1 / (1 + e^-t)
        let mut g = SeriesGraph::new();
        let t = g.independent(0.0);
        let x = g.dependent();
        let one = g.constant(1.0);
        let rest = g.sub(one, x);
        let rhs = g.mul(x, rest);
        g.set_ode(x, rhs);
        g.reset_dependent(x, 0.5);

        let mut stepper = TaylorStepper::new(g, t, vec![x], StepperConfig::default()).unwrap();
        let trajectory = stepper.integrate_to(4.0).unwrap();
        for (&t, row) in trajectory.times.iter().zip(&trajectory.states) {
            assert_relative_eq!(row[0], 1.0 / (1.0 + (-t).exp()), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_cost_tracks_actual_work() {
        let mut g = SeriesGraph::new();
        let t = g.independent(0.5);
        let e = g.exp(t);
        let s = g.sin(e);
        let prod = g.mul(s, e);

        let report = g.cost_breakdown(prod, 10, &CostModel::default());
        assert_eq!(report.total, g.flop_cost(prod, 10));
        assert_eq!(report.per_node.len(), 3);

        g.expand_to_order(prod, 10).unwrap();
        assert_eq!(g.flop_cost(prod, 10), 0);
    }

    #[test]
    fn test_batch_of_steppers_matches_individual_runs() {
        let build = |rate: f64| {
            let mut g = SeriesGraph::new();
            let t = g.independent(0.0);
            let x = g.dependent();
            let k = g.constant(rate);
            let rhs = g.mul(k, x);
            g.set_ode(x, rhs);
            g.reset_dependent(x, 1.0);
            TaylorStepper::new(g, t, vec![x], StepperConfig::default()).unwrap()
        };

        let mut batch: Vec<_> = [-1.0, -0.5, 0.5, 1.0].into_iter().map(build).collect();
        let config = BatchConfig {
            parallel_threshold: 1,
        };
        for _ in 0..10 {
            for report in step_batch(&mut batch, &config) {
                report.unwrap();
            }
        }

        for (rate, stepper) in [-1.0f64, -0.5, 0.5, 1.0].into_iter().zip(&batch) {
            assert_relative_eq!(stepper.state()[0], rate.exp(), max_relative = 1e-12);
        }
    }
}
