//! Order-by-order coefficient recurrences.
//!
//! Convention: `c_k = f^(k)(t0) / k!`. Each elementary function is expanded
//! through the differential equation it satisfies, so coefficient `k` only
//! needs coefficients `< k` of the result and `<= k` of the operands.
//!
//! Every unary recurrence has two shortcuts driven by the operand flags:
//! a constant operand has nothing beyond order 0, and an independent-linear
//! operand collapses the convolution to the single `x_1` term.

use tracing::{debug, trace};

use crate::error::{Result, SeriesError};
use crate::graph::SeriesGraph;
use crate::handle::NodeId;
use crate::node::{DependentState, NodeKind, TrigRole};

impl SeriesGraph {
    /// Computes coefficient `order` of `id`, assuming orders below it are
    /// validated. A no-op when `order` is already validated.
    ///
    /// On failure the operands of `id` are invalidated, so nothing computed
    /// on the way down outlives a later move of the expansion point.
    pub(crate) fn compute_order(&mut self, id: NodeId, order: usize) -> Result<()> {
        let result = self.try_order(id, order);
        if result.is_err() {
            self.discard_inputs(id);
        }
        result
    }

    fn try_order(&mut self, id: NodeId, order: usize) -> Result<()> {
        if self.node(id).validated.is_some_and(|v| v >= order) {
            return Ok(());
        }

        let value = match self.node(id).kind.clone() {
            NodeKind::Constant(value) | NodeKind::Parameter(value) => {
                if order == 0 {
                    value
                } else {
                    0.0
                }
            }
            NodeKind::Independent { t0 } => match order {
                0 => t0,
                1 => 1.0,
                _ => 0.0,
            },
            NodeKind::Negate(x) => {
                self.require(x, order)?;
                -self.read(x, order)
            }
            NodeKind::Exp(x) => self.exp_order(id, x, order)?,
            NodeKind::Log(x) => self.log_order(id, x, order)?,
            NodeKind::Sqrt(x) => self.sqrt_order(id, x, order)?,
            NodeKind::Pow { base, exponent } => self.pow_order(id, base, exponent, order)?,
            NodeKind::Trig {
                operand,
                role,
                partner,
            } => return self.trig_order(id, operand, role, partner, order),
            NodeKind::Add(a, b) => {
                self.require(a, order)?;
                self.require(b, order)?;
                self.read(a, order) + self.read(b, order)
            }
            NodeKind::Sub(a, b) => {
                self.require(a, order)?;
                self.require(b, order)?;
                self.read(a, order) - self.read(b, order)
            }
            NodeKind::Mul(a, b) => self.mul_order(a, b, order)?,
            NodeKind::Div(a, b) => self.div_order(id, a, b, order)?,
            NodeKind::Dependent { state, initial } => {
                self.dependent_order(id, state, initial, order)?
            }
        };

        trace!(node = %id, kind = self.node(id).kind.name(), order, value, "coefficient computed");
        self.node_mut(id).store(order, value);
        Ok(())
    }

    fn domain_error(&self, id: NodeId, argument: f64) -> SeriesError {
        let function = self.node(id).kind.name();
        debug!(node = %id, function, argument, "operand outside the domain");
        SeriesError::Domain {
            node: id,
            function,
            argument,
        }
    }

    /// `c_k = Σ_{j=0}^{k} a_j b_{k-j}`, restricted to the indices where both
    /// factors can be non-zero.
    fn mul_order(&mut self, a: NodeId, b: NodeId, k: usize) -> Result<f64> {
        self.require(a, k)?;
        self.require(b, k)?;

        let (fa, fb) = (self.node(a).flags, self.node(b).flags);
        if fa.is_constant {
            return Ok(self.read(a, 0) * self.read(b, k));
        }
        if fb.is_constant {
            return Ok(self.read(a, k) * self.read(b, 0));
        }

        let lo = fb.degree_bound().map_or(0, |d| k.saturating_sub(d));
        let hi = fa.degree_bound().map_or(k, |d| k.min(d));
        Ok((lo..=hi).map(|j| self.read(a, j) * self.read(b, k - j)).sum())
    }

    /// `c_k = (a_k - Σ_{j=1}^{k} b_j c_{k-j}) / b_0`
    fn div_order(&mut self, id: NodeId, a: NodeId, b: NodeId, k: usize) -> Result<f64> {
        self.require(a, k)?;
        self.require(b, k)?;

        let b0 = self.read(b, 0);
        if k == 0 {
            if b0 == 0.0 {
                debug!(node = %id, "division by a series with zero leading coefficient");
                return Err(SeriesError::DivisionByZeroCoefficient { node: id });
            }
            return Ok(self.read(a, 0) / b0);
        }

        let fb = self.node(b).flags;
        if fb.is_constant {
            return Ok(self.read(a, k) / b0);
        }

        let hi = fb.degree_bound().map_or(k, |d| k.min(d));
        let sum: f64 = (1..=hi).map(|j| self.read(b, j) * self.read(id, k - j)).sum();
        Ok((self.read(a, k) - sum) / b0)
    }

    /// `y_k = (1/k) Σ_{j=0}^{k-1} (k-j) y_j x_{k-j}`
    fn exp_order(&mut self, id: NodeId, x: NodeId, k: usize) -> Result<f64> {
        self.require(x, k)?;
        if k == 0 {
            return Ok(self.read(x, 0).exp());
        }

        let flags = self.node(x).flags;
        if flags.is_constant {
            return Ok(0.0);
        }
        let kf = k as f64;
        if flags.is_independent_linear {
            return Ok(self.read(x, 1) * self.read(id, k - 1) / kf);
        }

        let sum: f64 = (0..k)
            .map(|j| (k - j) as f64 * self.read(id, j) * self.read(x, k - j))
            .sum();
        Ok(sum / kf)
    }

    /// `y_k = (x_k - (1/k) Σ_{j=1}^{k-1} (k-j) x_j y_{k-j}) / x_0`
    fn log_order(&mut self, id: NodeId, x: NodeId, k: usize) -> Result<f64> {
        self.require(x, k)?;
        let x0 = self.read(x, 0);
        if k == 0 {
            if x0.is_nan() || x0 <= 0.0 {
                return Err(self.domain_error(id, x0));
            }
            return Ok(x0.ln());
        }

        let flags = self.node(x).flags;
        if flags.is_constant {
            return Ok(0.0);
        }
        let kf = k as f64;
        if flags.is_independent_linear {
            let x1 = self.read(x, 1);
            return Ok((self.read(x, k) - (kf - 1.0) / kf * x1 * self.read(id, k - 1)) / x0);
        }

        let sum: f64 = (1..k)
            .map(|j| (k - j) as f64 * self.read(x, j) * self.read(id, k - j))
            .sum();
        Ok((self.read(x, k) - sum / kf) / x0)
    }

    /// `y_k = (k x_k / 2 - Σ_{j=1}^{k-1} j y_j y_{k-j}) / (k y_0)`
    fn sqrt_order(&mut self, id: NodeId, x: NodeId, k: usize) -> Result<f64> {
        self.require(x, k)?;
        let x0 = self.read(x, 0);
        if k == 0 {
            if x0.is_nan() || x0 < 0.0 {
                return Err(self.domain_error(id, x0));
            }
            return Ok(x0.sqrt());
        }

        let flags = self.node(x).flags;
        if flags.is_constant {
            return Ok(0.0);
        }
        let y0 = self.read(id, 0);
        if y0 == 0.0 {
            debug!(node = %id, "sqrt expanded past order 0 at a zero value");
            return Err(SeriesError::DivisionByZeroCoefficient { node: id });
        }
        let kf = k as f64;
        if flags.is_independent_linear {
            return Ok((1.5 / kf - 1.0) * self.read(x, 1) * self.read(id, k - 1) / x0);
        }

        let sum: f64 = (1..k)
            .map(|j| j as f64 * self.read(id, j) * self.read(id, k - j))
            .sum();
        Ok((kf * self.read(x, k) / 2.0 - sum) / (kf * y0))
    }

    /// `y_k = (1/x_0) Σ_{j=1}^{k} (j(a+1)/k - 1) x_j y_{k-j}`
    fn pow_order(&mut self, id: NodeId, x: NodeId, a: f64, k: usize) -> Result<f64> {
        self.require(x, k)?;
        let x0 = self.read(x, 0);
        if k == 0 {
            if x0.is_nan() || x0 <= 0.0 {
                return Err(self.domain_error(id, x0));
            }
            return Ok(x0.powf(a));
        }

        let flags = self.node(x).flags;
        if flags.is_constant {
            return Ok(0.0);
        }
        let kf = k as f64;
        if flags.is_independent_linear {
            return Ok(((a + 1.0) / kf - 1.0) * self.read(x, 1) * self.read(id, k - 1) / x0);
        }

        let sum: f64 = (1..=k)
            .map(|j| ((j as f64) * (a + 1.0) / kf - 1.0) * self.read(x, j) * self.read(id, k - j))
            .sum();
        Ok(sum / x0)
    }

    /// Writes order `k` of both halves of a sin/cos pair.
    ///
    /// `sin_k = (1/k) Σ_{j=1}^{k} j x_j cos_{k-j}`,
    /// `cos_k = -(1/k) Σ_{j=1}^{k} j x_j sin_{k-j}`
    fn trig_order(
        &mut self,
        id: NodeId,
        x: NodeId,
        role: TrigRole,
        partner: NodeId,
        k: usize,
    ) -> Result<()> {
        let (sin_id, cos_id) = match role {
            TrigRole::Sin => (id, partner),
            TrigRole::Cos => (partner, id),
        };
        self.require(x, k)?;

        let flags = self.node(x).flags;
        let kf = k as f64;
        let (s, c) = if k == 0 {
            self.read(x, 0).sin_cos()
        } else if flags.is_constant {
            (0.0, 0.0)
        } else if flags.is_independent_linear {
            let x1 = self.read(x, 1);
            (
                x1 * self.read(cos_id, k - 1) / kf,
                -x1 * self.read(sin_id, k - 1) / kf,
            )
        } else {
            let (mut s, mut c) = (0.0, 0.0);
            for j in 1..=k {
                let jx = j as f64 * self.read(x, j);
                s += jx * self.read(cos_id, k - j);
                c += jx * self.read(sin_id, k - j);
            }
            (s / kf, -c / kf)
        };

        trace!(sin = %sin_id, cos = %cos_id, order = k, s, c, "sin/cos pair computed");
        self.node_mut(sin_id).store(k, s);
        self.node_mut(cos_id).store(k, c);
        Ok(())
    }

    /// `x_k = rhs_{k-1} / k` for an ODE-bound unknown.
    fn dependent_order(
        &mut self,
        id: NodeId,
        state: DependentState,
        initial: Option<f64>,
        k: usize,
    ) -> Result<f64> {
        if k == 0 {
            return initial.ok_or(SeriesError::InsufficientOrder {
                node: id,
                requested: 0,
                validated: None,
            });
        }

        match state {
            DependentState::OdeBound { rhs } => {
                self.require(rhs, k - 1)?;
                Ok(self.read(rhs, k - 1) / k as f64)
            }
            DependentState::Uninitialized | DependentState::SeededWithData => {
                Err(SeriesError::InsufficientOrder {
                    node: id,
                    requested: k,
                    validated: self.node(id).validated,
                })
            }
        }
    }
}
