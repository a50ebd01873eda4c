//! Property-based tests for series expansion.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{NodeId, SeriesGraph};

    fn point() -> impl Strategy<Value = f64> {
        -2.0f64..2.0f64
    }

    fn positive() -> impl Strategy<Value = f64> {
        0.5f64..4.0f64
    }

    /// `exp(sin(t)) * t + c`, a node with a general series.
    fn mixed(g: &mut SeriesGraph, t0: f64, c: f64) -> NodeId {
        let t = g.independent(t0);
        let s = g.sin(t);
        let e = g.exp(s);
        let p = g.mul(e, t);
        let c = g.constant(c);
        g.add(p, c)
    }

    proptest! {
        #[test]
        fn expansion_is_incremental(t0 in point(), c in point(), split in 0usize..12) {
            let mut direct = SeriesGraph::new();
            let a = mixed(&mut direct, t0, c);
            direct.expand_to_order(a, 12).unwrap();

            let mut stepped = SeriesGraph::new();
            let b = mixed(&mut stepped, t0, c);
            stepped.expand_to_order(b, split).unwrap();
            stepped.expand_to_order(b, 12).unwrap();

            prop_assert_eq!(direct.coefficients(a), stepped.coefficients(b));
        }

        #[test]
        fn expanding_again_changes_nothing(t0 in point(), c in point()) {
            let mut g = SeriesGraph::new();
            let a = mixed(&mut g, t0, c);
            g.expand_to_order(a, 8).unwrap();
            let before = g.coefficients(a).to_vec();

            g.expand_to_order(a, 5).unwrap();
            g.expand_to_order(a, 8).unwrap();
            prop_assert_eq!(g.validated_order(a), Some(8));
            prop_assert_eq!(g.coefficients(a), before.as_slice());
        }

        #[test]
        fn double_invalidation_is_harmless(t0 in point(), c in point()) {
            let mut g = SeriesGraph::new();
            let a = mixed(&mut g, t0, c);
            g.expand_to_order(a, 6).unwrap();
            let before = g.coefficients(a).to_vec();

            g.invalidate(a);
            g.invalidate(a);
            prop_assert_eq!(g.validated_order(a), None);

            g.expand_to_order(a, 6).unwrap();
            prop_assert_eq!(g.coefficients(a), before.as_slice());
        }

        #[test]
        fn exp_of_constant_is_constant(c in point(), order in 0usize..16) {
            let mut g = SeriesGraph::new();
            let k = g.constant(c);
            let e = g.exp(k);
            g.expand_to_order(e, order).unwrap();

            prop_assert!((g.coefficient(e, 0).unwrap() - c.exp()).abs() < 1e-12);
            for j in 1..=order {
                prop_assert_eq!(g.coefficient(e, j).unwrap(), 0.0);
            }
        }

        #[test]
        fn quotient_by_itself_is_one(t0 in point(), p in point(), shift in positive()) {
            let mut g = SeriesGraph::new();
            let t = g.independent(t0);
            let p = g.parameter(p);
            let pt = g.mul(t, p);
            let e = g.exp(pt);
            let k = g.constant(shift);
            let a = g.add(e, k);
            let q = g.div(a, a);
            g.expand_to_order(q, 10).unwrap();

            prop_assert!((g.coefficient(q, 0).unwrap() - 1.0).abs() < 1e-12);
            for j in 1..=10 {
                prop_assert!(g.coefficient(q, j).unwrap().abs() < 1e-9);
            }
        }

        #[test]
        fn exp_undoes_log(t0 in point(), shift in positive()) {
            let mut g = SeriesGraph::new();
            let t = g.independent(t0);
            let sq = g.mul(t, t);
            let k = g.constant(shift);
            let x = g.add(sq, k);
            let l = g.log(x);
            let back = g.exp(l);
            g.expand_to_order(back, 10).unwrap();

            for j in 0..=10 {
                let want = g.coefficient(x, j).unwrap();
                let got = g.coefficient(back, j).unwrap();
                prop_assert!((got - want).abs() < 1e-9 * want.abs().max(1.0));
            }
        }

        #[test]
        fn pythagorean_identity(t0 in point(), c in point()) {
            let mut g = SeriesGraph::new();
            let a = mixed(&mut g, t0, c);
            let (s, co) = g.sin_cos(a);
            let s2 = g.mul(s, s);
            let c2 = g.mul(co, co);
            let one = g.add(s2, c2);
            g.expand_to_order(one, 10).unwrap();

            prop_assert!((g.coefficient(one, 0).unwrap() - 1.0).abs() < 1e-12);
            for j in 1..=10 {
                prop_assert!(g.coefficient(one, j).unwrap().abs() < 1e-8);
            }
        }

        #[test]
        fn constant_evaluates_to_its_value(c in point(), h in point()) {
            let mut g = SeriesGraph::new();
            let k = g.constant(c);
            prop_assert_eq!(g.evaluate(k, h).unwrap(), c);
        }
    }
}
