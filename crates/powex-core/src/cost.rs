//! Floating-point operation counts for expanding a graph.
//!
//! The walk mirrors [`SeriesGraph::expand_to_order`]: the same operands are
//! demanded in the same order and every shared subtree is counted once.
//! Progress is tracked in a simulated order table seeded from the real
//! validated orders, so the graph itself is never touched.

use rustc_hash::FxHashMap;

use crate::graph::SeriesGraph;
use crate::handle::NodeId;
use crate::node::{DependentState, NodeKind};

/// Weights assigned to each kind of floating-point operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CostModel {
    /// Addition or subtraction.
    pub add: u64,
    /// Multiplication.
    pub mul: u64,
    /// Division.
    pub div: u64,
    /// One call of `exp`, `ln`, `sqrt`, `powf` or `sin_cos`.
    pub transcendental: u64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            add: 1,
            mul: 1,
            div: 1,
            transcendental: 1,
        }
    }
}

impl CostModel {
    fn ops(&self, adds: u64, muls: u64, divs: u64) -> u64 {
        adds * self.add + muls * self.mul + divs * self.div
    }

    /// `n` terms, each `weight * a * b`, summed.
    fn weighted_sum(&self, n: u64) -> u64 {
        if n == 0 {
            0
        } else {
            self.ops(n - 1, 2 * n, 0)
        }
    }

    /// `n` plain products `a * b`, summed.
    fn plain_sum(&self, n: u64) -> u64 {
        if n == 0 {
            0
        } else {
            self.ops(n - 1, n, 0)
        }
    }
}

/// Operation counts for reaching a target order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CostReport {
    /// Total over every node.
    pub total: u64,
    /// Per-node counts, in node order, omitting nodes that cost nothing.
    pub per_node: Vec<(NodeId, u64)>,
}

struct Simulation<'g> {
    graph: &'g SeriesGraph,
    model: &'g CostModel,
    orders: FxHashMap<NodeId, Option<usize>>,
    costs: FxHashMap<NodeId, u64>,
}

impl Simulation<'_> {
    fn current(&self, id: NodeId) -> Option<usize> {
        self.orders
            .get(&id)
            .copied()
            .unwrap_or_else(|| self.graph.validated_order(id))
    }

    fn reach(&mut self, id: NodeId, order: usize) {
        let start = self.current(id).map_or(0, |v| v + 1);
        for j in start..=order {
            self.step(id, j);
        }
    }

    fn demand(&mut self, id: NodeId, order: usize) {
        if let Some(needed) = self.graph.demand(id, order) {
            self.reach(id, needed);
        }
    }

    fn step(&mut self, id: NodeId, k: usize) {
        if self.current(id).is_some_and(|v| v >= k) {
            return;
        }

        let graph = self.graph;
        let node = graph.node(id);
        let m = self.model;
        let kw = k as u64;
        let bound = |x: NodeId| graph.node(x).flags.degree_bound();
        let is_constant = |x: NodeId| graph.node(x).flags.is_constant;
        let is_linear = |x: NodeId| graph.node(x).flags.is_independent_linear;

        let cost = match node.kind {
            NodeKind::Constant(_) | NodeKind::Parameter(_) | NodeKind::Independent { .. } => 0,
            NodeKind::Negate(x) => {
                self.demand(x, k);
                m.ops(1, 0, 0)
            }
            NodeKind::Add(a, b) | NodeKind::Sub(a, b) => {
                self.demand(a, k);
                self.demand(b, k);
                m.ops(1, 0, 0)
            }
            NodeKind::Mul(a, b) => {
                self.demand(a, k);
                self.demand(b, k);
                if is_constant(a) || is_constant(b) {
                    m.ops(0, 1, 0)
                } else {
                    let lo = bound(b).map_or(0, |d| k.saturating_sub(d));
                    let hi = bound(a).map_or(k, |d| k.min(d));
                    let terms = if lo <= hi { (hi - lo + 1) as u64 } else { 0 };
                    m.plain_sum(terms)
                }
            }
            NodeKind::Div(a, b) => {
                self.demand(a, k);
                self.demand(b, k);
                if k == 0 || is_constant(b) {
                    m.ops(0, 0, 1)
                } else {
                    let terms = bound(b).map_or(k, |d| k.min(d)) as u64;
                    m.plain_sum(terms) + m.ops(1, 0, 1)
                }
            }
            NodeKind::Exp(x) | NodeKind::Log(x) | NodeKind::Sqrt(x) | NodeKind::Pow { base: x, .. } => {
                self.demand(x, k);
                if k == 0 {
                    m.transcendental
                } else if is_constant(x) {
                    0
                } else if is_linear(x) {
                    m.ops(1, 2, 2)
                } else {
                    match node.kind {
                        NodeKind::Exp(_) => m.weighted_sum(kw) + m.ops(0, 0, 1),
                        NodeKind::Log(_) => m.weighted_sum(kw - 1) + m.ops(1, 0, 2),
                        NodeKind::Sqrt(_) => m.weighted_sum(kw - 1) + m.ops(1, 2, 2),
                        _ => m.weighted_sum(kw) + m.ops(kw, kw, kw + 1),
                    }
                }
            }
            NodeKind::Trig { operand, partner, .. } => {
                self.demand(operand, k);
                self.orders.insert(partner, Some(k));
                if k == 0 {
                    m.transcendental
                } else if is_constant(operand) {
                    0
                } else if is_linear(operand) {
                    2 * m.ops(0, 1, 1)
                } else {
                    // Both sums share the j * x_j products
                    m.ops(0, kw, 0) + 2 * m.plain_sum(kw) + m.ops(0, 0, 2)
                }
            }
            NodeKind::Dependent { state, .. } => match state {
                DependentState::OdeBound { rhs } if k > 0 => {
                    self.demand(rhs, k - 1);
                    m.ops(0, 0, 1)
                }
                _ => 0,
            },
        };

        self.orders.insert(id, Some(k));
        *self.costs.entry(id).or_insert(0) += cost;
    }
}

impl SeriesGraph {
    /// Counts the operations needed to bring `root` to `order`, node by node.
    ///
    /// Already validated coefficients cost nothing. The graph is not
    /// modified.
    #[must_use]
    pub fn cost_breakdown(&self, root: impl Into<NodeId>, order: usize, model: &CostModel) -> CostReport {
        let mut sim = Simulation {
            graph: self,
            model,
            orders: FxHashMap::default(),
            costs: FxHashMap::default(),
        };
        sim.reach(root.into(), order);

        let mut per_node: Vec<(NodeId, u64)> = sim.costs.into_iter().filter(|&(_, c)| c > 0).collect();
        per_node.sort_unstable_by_key(|&(id, _)| id);
        CostReport {
            total: per_node.iter().map(|&(_, c)| c).sum(),
            per_node,
        }
    }

    /// Number of floating-point operations needed to bring `root` to
    /// `order`, with every operation weighted 1.
    #[must_use]
    pub fn flop_cost(&self, root: impl Into<NodeId>, order: usize) -> u64 {
        self.cost_breakdown(root, order, &CostModel::default()).total
    }
}
