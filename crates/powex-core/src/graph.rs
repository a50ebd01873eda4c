//! Arena of series nodes.
//!
//! All nodes of one expression graph are stored contiguously in a `Vec` and
//! addressed by [`NodeId`]. Operators are built bottom-up from handles of
//! already constructed operands; the only back-edge is the one from an
//! ODE-bound [`DependentVar`] into its right-hand side.

use smallvec::{smallvec, SmallVec};
use tracing::debug;

use crate::error::{Result, SeriesError};
use crate::handle::{DependentVar, IndependentVar, NodeId, Parameter};
use crate::node::{DependentState, Node, NodeFlags, NodeKind, TrigRole};

/// A graph of nodes, each lazily expanding its own Taylor series about the
/// current expansion point.
///
/// Expansion is pull-based: asking a node for order `k` demands order `k`
/// of its operands first, and every node memoizes what it has computed.
#[derive(Clone, Debug, Default)]
pub struct SeriesGraph {
    nodes: Vec<Node>,
}

/// Closed-form coefficients of leaf nodes.
fn leaf_coefficient(kind: &NodeKind, order: usize) -> Option<f64> {
    match *kind {
        NodeKind::Constant(value) | NodeKind::Parameter(value) => {
            Some(if order == 0 { value } else { 0.0 })
        }
        NodeKind::Independent { t0 } => Some(match order {
            0 => t0,
            1 => 1.0,
            _ => 0.0,
        }),
        _ => None,
    }
}

fn mismatched(id: NodeId, kind: &NodeKind, expected: &str) -> ! {
    panic!("handle {id} names a {} node, not {expected}", kind.name())
}

impl SeriesGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a graph with room for `capacity` nodes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, kind: NodeKind, flags: NodeFlags) -> NodeId {
        let index = self.nodes.len();
        assert!(index < u32::MAX as usize, "graph capacity exceeded");

        #[allow(clippy::cast_possible_truncation)]
        let id = NodeId::new(index as u32);
        self.nodes.push(Node::new(kind, flags));
        id
    }

    /// # Panics
    ///
    /// Panics if the handle was not issued by this graph.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.slot()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.slot()]
    }

    // === Leaves ===

    /// Creates a constant.
    pub fn constant(&mut self, value: f64) -> NodeId {
        self.push(NodeKind::Constant(value), NodeFlags::CONSTANT)
    }

    /// Creates a parameter: a constant whose value may be changed later
    /// with [`set_parameter`](Self::set_parameter).
    pub fn parameter(&mut self, value: f64) -> Parameter {
        Parameter::wrap(self.push(NodeKind::Parameter(value), NodeFlags::CONSTANT))
    }

    /// Creates the independent variable, expanded about `t0`.
    pub fn independent(&mut self, t0: f64) -> IndependentVar {
        IndependentVar::wrap(self.push(NodeKind::Independent { t0 }, NodeFlags::LINEAR))
    }

    /// Creates an uninitialized dependent variable.
    ///
    /// Give it data with [`set_coeff`](Self::set_coeff) or an equation with
    /// [`set_ode`](Self::set_ode).
    pub fn dependent(&mut self) -> DependentVar {
        let kind = NodeKind::Dependent {
            state: DependentState::Uninitialized,
            initial: None,
        };
        DependentVar::wrap(self.push(kind, NodeFlags::GENERAL))
    }

    // === Unary operators ===

    /// Creates `-x`.
    pub fn negate(&mut self, x: impl Into<NodeId>) -> NodeId {
        let x = x.into();
        let flags = self.node(x).flags;
        self.push(NodeKind::Negate(x), flags)
    }

    /// Creates `exp(x)`.
    pub fn exp(&mut self, x: impl Into<NodeId>) -> NodeId {
        let x = x.into();
        let flags = NodeFlags::transcendental(self.node(x).flags);
        self.push(NodeKind::Exp(x), flags)
    }

    /// Creates `ln(x)`. Expansion requires a positive leading coefficient.
    pub fn log(&mut self, x: impl Into<NodeId>) -> NodeId {
        let x = x.into();
        let flags = NodeFlags::transcendental(self.node(x).flags);
        self.push(NodeKind::Log(x), flags)
    }

    /// Creates `√x`. Expansion requires a non-negative leading coefficient,
    /// and a positive one beyond order 0.
    pub fn sqrt(&mut self, x: impl Into<NodeId>) -> NodeId {
        let x = x.into();
        let flags = NodeFlags::transcendental(self.node(x).flags);
        self.push(NodeKind::Sqrt(x), flags)
    }

    /// Creates `x^exponent` for a real exponent. Expansion requires a
    /// positive leading coefficient.
    pub fn pow(&mut self, base: impl Into<NodeId>, exponent: f64) -> NodeId {
        let base = base.into();
        let flags = NodeFlags::transcendental(self.node(base).flags);
        self.push(NodeKind::Pow { base, exponent }, flags)
    }

    /// Creates the coupled pair `(sin(x), cos(x))`.
    ///
    /// Expanding either node computes both.
    pub fn sin_cos(&mut self, x: impl Into<NodeId>) -> (NodeId, NodeId) {
        let operand = x.into();
        let flags = NodeFlags::transcendental(self.node(operand).flags);

        #[allow(clippy::cast_possible_truncation)]
        let cos_id = NodeId::new(self.nodes.len() as u32 + 1);
        let sin_id = self.push(
            NodeKind::Trig {
                operand,
                role: TrigRole::Sin,
                partner: cos_id,
            },
            flags,
        );
        let pushed = self.push(
            NodeKind::Trig {
                operand,
                role: TrigRole::Cos,
                partner: sin_id,
            },
            flags,
        );
        debug_assert_eq!(pushed, cos_id);

        (sin_id, cos_id)
    }

    /// Creates `sin(x)`; its `cos(x)` partner is reachable via
    /// [`partner`](Self::partner).
    pub fn sin(&mut self, x: impl Into<NodeId>) -> NodeId {
        self.sin_cos(x).0
    }

    /// Creates `cos(x)`; its `sin(x)` partner is reachable via
    /// [`partner`](Self::partner).
    pub fn cos(&mut self, x: impl Into<NodeId>) -> NodeId {
        self.sin_cos(x).1
    }

    // === Binary operators ===

    /// Creates `a + b`.
    pub fn add(&mut self, a: impl Into<NodeId>, b: impl Into<NodeId>) -> NodeId {
        let (a, b) = (a.into(), b.into());
        let flags = NodeFlags::sum(self.node(a).flags, self.node(b).flags);
        self.push(NodeKind::Add(a, b), flags)
    }

    /// Creates `a - b`.
    pub fn sub(&mut self, a: impl Into<NodeId>, b: impl Into<NodeId>) -> NodeId {
        let (a, b) = (a.into(), b.into());
        let flags = NodeFlags::sum(self.node(a).flags, self.node(b).flags);
        self.push(NodeKind::Sub(a, b), flags)
    }

    /// Creates `a * b`.
    pub fn mul(&mut self, a: impl Into<NodeId>, b: impl Into<NodeId>) -> NodeId {
        let (a, b) = (a.into(), b.into());
        let flags = NodeFlags::product(self.node(a).flags, self.node(b).flags);
        self.push(NodeKind::Mul(a, b), flags)
    }

    /// Creates `a / b`. Expansion requires a non-zero leading coefficient
    /// of `b`.
    pub fn div(&mut self, a: impl Into<NodeId>, b: impl Into<NodeId>) -> NodeId {
        let (a, b) = (a.into(), b.into());
        let flags = NodeFlags::quotient(self.node(a).flags, self.node(b).flags);
        self.push(NodeKind::Div(a, b), flags)
    }

    // === Introspection ===

    /// Structural flags of a node.
    #[must_use]
    pub fn flags(&self, id: impl Into<NodeId>) -> NodeFlags {
        self.node(id.into()).flags
    }

    /// Highest order holding a valid coefficient; `None` when nothing is
    /// computed yet.
    #[must_use]
    pub fn validated_order(&self, id: impl Into<NodeId>) -> Option<usize> {
        self.node(id.into()).validated
    }

    /// The other half of a sin/cos pair.
    #[must_use]
    pub fn partner(&self, id: impl Into<NodeId>) -> Option<NodeId> {
        match self.node(id.into()).kind {
            NodeKind::Trig { partner, .. } => Some(partner),
            _ => None,
        }
    }

    /// Name of the function a node computes, e.g. `"exp"` or `"mul"`.
    #[must_use]
    pub fn kind_name(&self, id: impl Into<NodeId>) -> &'static str {
        self.node(id.into()).kind.name()
    }

    /// Direct dependencies of a node, as followed by invalidation.
    #[must_use]
    pub fn operands(&self, id: impl Into<NodeId>) -> SmallVec<[NodeId; 2]> {
        self.node(id.into()).kind.operands()
    }

    /// Lifecycle state of a dependent variable.
    #[must_use]
    pub fn dependent_state(&self, x: DependentVar) -> DependentState {
        match &self.node(x.node()).kind {
            NodeKind::Dependent { state, .. } => *state,
            other => mismatched(x.node(), other, "a dependent variable"),
        }
    }

    /// Order-0 value a dependent variable restarts from, if one was set
    /// by `reset_dependent` or `set_coeff`. Survives invalidation.
    #[must_use]
    pub fn initial_value(&self, x: DependentVar) -> Option<f64> {
        match &self.node(x.node()).kind {
            NodeKind::Dependent { initial, .. } => *initial,
            other => mismatched(x.node(), other, "a dependent variable"),
        }
    }

    /// Current expansion point of the independent variable.
    #[must_use]
    pub fn expansion_point(&self, t: IndependentVar) -> f64 {
        match &self.node(t.node()).kind {
            NodeKind::Independent { t0 } => *t0,
            other => mismatched(t.node(), other, "an independent variable"),
        }
    }

    /// Current value of a parameter.
    #[must_use]
    pub fn parameter_value(&self, p: Parameter) -> f64 {
        match &self.node(p.node()).kind {
            NodeKind::Parameter(value) => *value,
            other => mismatched(p.node(), other, "a parameter"),
        }
    }

    // === Reading coefficients ===

    /// Reads a coefficient inside the recurrences.
    ///
    /// Leaves answer in closed form and flagged nodes answer zero past their
    /// degree bound, so neither needs to be materialized.
    pub(crate) fn read(&self, id: NodeId, order: usize) -> f64 {
        let node = self.node(id);
        if let Some(c) = leaf_coefficient(&node.kind, order) {
            return c;
        }
        if node.flags.degree_bound().is_some_and(|d| order > d) {
            return 0.0;
        }
        debug_assert!(
            node.validated.is_some_and(|v| order <= v),
            "read of order {order} from {id} validated through {:?}",
            node.validated
        );
        node.buffer.get(order)
    }

    /// Order to which `id` must be expanded before coefficient `order` can be
    /// read from it, or `None` when the value is known in closed form.
    pub(crate) fn demand(&self, id: NodeId, order: usize) -> Option<usize> {
        let node = self.node(id);
        if node.kind.is_leaf() {
            return None;
        }
        Some(node.flags.degree_bound().map_or(order, |d| order.min(d)))
    }

    pub(crate) fn require(&mut self, id: NodeId, order: usize) -> Result<()> {
        match self.demand(id, order) {
            Some(needed) => self.expand_to_order(id, needed),
            None => Ok(()),
        }
    }

    /// Returns coefficient `order` of a node.
    ///
    /// # Errors
    ///
    /// [`SeriesError::InsufficientOrder`] if the order is not validated.
    pub fn coefficient(&self, id: impl Into<NodeId>, order: usize) -> Result<f64> {
        let id = id.into();
        let node = self.node(id);
        if let Some(c) = leaf_coefficient(&node.kind, order) {
            return Ok(c);
        }
        match node.validated {
            Some(v) if order <= v => Ok(node.buffer.get(order)),
            validated => Err(SeriesError::InsufficientOrder {
                node: id,
                requested: order,
                validated,
            }),
        }
    }

    /// Returns every validated coefficient of a node, lowest order first.
    #[must_use]
    pub fn coefficients(&self, id: impl Into<NodeId>) -> &[f64] {
        let node = self.node(id.into());
        node.buffer.prefix(node.validated)
    }

    /// Returns the raw `order`-th derivative at the expansion point,
    /// `order! * c_order`.
    ///
    /// A zero coefficient gives a zero derivative at any order. Past order
    /// 170 `order!` overflows `f64`, so a non-zero coefficient there gives
    /// an infinite result.
    ///
    /// # Errors
    ///
    /// [`SeriesError::InsufficientOrder`] if the order is not validated.
    pub fn derivative(&self, id: impl Into<NodeId>, order: usize) -> Result<f64> {
        let c = self.coefficient(id, order)?;
        if c == 0.0 {
            return Ok(0.0);
        }
        Ok((1..=order).fold(c, |acc, i| acc * i as f64))
    }

    /// Evaluates the truncated series at `expansion point + h` using every
    /// validated coefficient.
    ///
    /// Constants and parameters return their value and the independent
    /// variable returns `t0 + h` directly.
    ///
    /// # Errors
    ///
    /// [`SeriesError::InsufficientOrder`] if nothing has been computed.
    pub fn evaluate(&self, id: impl Into<NodeId>, h: f64) -> Result<f64> {
        let id = id.into();
        let node = self.node(id);
        match node.kind {
            NodeKind::Constant(value) | NodeKind::Parameter(value) => return Ok(value),
            NodeKind::Independent { t0 } => return Ok(t0 + h),
            _ => {}
        }
        match node.validated {
            Some(v) => Ok(node.buffer.horner(v, h)),
            None => Err(SeriesError::InsufficientOrder {
                node: id,
                requested: 0,
                validated: None,
            }),
        }
    }

    /// Expands to `order` if needed, then evaluates the series truncated at
    /// exactly that order.
    ///
    /// # Errors
    ///
    /// Whatever [`expand_to_order`](Self::expand_to_order) reports.
    pub fn evaluate_to_order(&mut self, id: impl Into<NodeId>, h: f64, order: usize) -> Result<f64> {
        let id = id.into();
        self.expand_to_order(id, order)?;

        if self.node(id).kind.is_leaf() {
            let upto = order.min(1);
            return Ok((0..=upto).rev().fold(0.0, |acc, j| acc * h + self.read(id, j)));
        }
        Ok(self.node(id).buffer.horner(order, h))
    }

    // === Expansion ===

    /// Computes coefficients until the node is validated through `order`.
    ///
    /// Orders are computed one at a time; already validated orders are left
    /// untouched.
    ///
    /// # Errors
    ///
    /// [`SeriesError::Domain`] or [`SeriesError::DivisionByZeroCoefficient`]
    /// from an elementary function anywhere below the node, or
    /// [`SeriesError::InsufficientOrder`] from a dependent variable that has
    /// neither enough data nor an equation.
    pub fn expand_to_order(&mut self, id: impl Into<NodeId>, order: usize) -> Result<()> {
        let id = id.into();
        for j in self.node(id).next_order()..=order {
            self.compute_order(id, j)?;
        }
        Ok(())
    }

    // === Invalidation and resets ===

    /// Discards the coefficients of a node and, transitively, of everything
    /// it depends on.
    ///
    /// Propagation stops at nodes that hold no coefficients, so a node that
    /// was never expanded shields its operands. Callers invalidate every
    /// top-level node they evaluate.
    pub fn invalidate(&mut self, id: impl Into<NodeId>) {
        let mut pending: SmallVec<[NodeId; 16]> = smallvec![id.into()];
        while let Some(id) = pending.pop() {
            let node = self.node_mut(id);
            if node.validated.take().is_none() {
                continue;
            }
            pending.extend(node.kind.operands());
        }
    }

    /// Invalidates the operands of a node whose expansion just failed.
    ///
    /// The node itself keeps its valid prefix. A sin/cos half leaves its
    /// partner alone, since the pair stays in lockstep.
    pub(crate) fn discard_inputs(&mut self, id: NodeId) {
        let inputs = match self.node(id).kind {
            NodeKind::Trig { operand, .. } => smallvec![operand],
            ref kind => kind.operands(),
        };
        for input in inputs {
            self.invalidate(input);
        }
    }

    /// Moves the expansion point of the independent variable.
    ///
    /// Only coefficient 0 changes, so the node keeps its order. Nodes built
    /// on top of it are *not* invalidated.
    pub fn reset_independent(&mut self, t: IndependentVar, t0: f64) {
        let node = self.node_mut(t.node());
        match &mut node.kind {
            NodeKind::Independent { t0: point } => *point = t0,
            other => mismatched(t.node(), other, "an independent variable"),
        }
        if node.validated.is_some() {
            node.buffer.store(0, t0, node.validated);
        }
        debug!(node = %t, t0, "expansion point moved");
    }

    /// Changes the value of a parameter.
    ///
    /// Nothing is invalidated: a parameter does not know its parents.
    pub fn set_parameter(&mut self, p: Parameter, value: f64) {
        let node = self.node_mut(p.node());
        match &mut node.kind {
            NodeKind::Parameter(current) => *current = value,
            other => mismatched(p.node(), other, "a parameter"),
        }
        if node.validated.is_some() {
            node.buffer.store(0, value, node.validated);
        }
    }

    /// Binds `x' = rhs`. `rhs` may refer to `x` itself.
    ///
    /// Coefficients of `x` above order 0 are discarded.
    pub fn set_ode(&mut self, x: DependentVar, rhs: impl Into<NodeId>) {
        let rhs = rhs.into();
        let node = self.node_mut(x.node());
        match &mut node.kind {
            NodeKind::Dependent { state, .. } => *state = DependentState::OdeBound { rhs },
            other => mismatched(x.node(), other, "a dependent variable"),
        }
        if node.validated.is_some_and(|v| v > 0) {
            node.validated = Some(0);
        }
        debug!(node = %x, %rhs, "equation bound");
    }

    /// Supplies coefficient `order` of `x` from outside.
    ///
    /// # Errors
    ///
    /// [`SeriesError::OutOfSequenceCoefficient`] unless `order` is exactly
    /// one past the validated order.
    pub fn set_coeff(&mut self, x: DependentVar, order: usize, value: f64) -> Result<()> {
        let id = x.node();
        let node = self.node_mut(id);
        let expected = node.next_order();
        if order != expected {
            return Err(SeriesError::OutOfSequenceCoefficient {
                node: id,
                expected,
                supplied: order,
            });
        }

        match &mut node.kind {
            NodeKind::Dependent { state, initial } => {
                if order == 0 {
                    *initial = Some(value);
                }
                if *state == DependentState::Uninitialized {
                    *state = DependentState::SeededWithData;
                }
            }
            other => mismatched(id, other, "a dependent variable"),
        }
        node.store(order, value);
        Ok(())
    }

    /// Restarts `x` at value `x0` about the current expansion point.
    ///
    /// Leaves `x` validated through order 0 and invalidates its right-hand
    /// side. This is how an integration step slides the window forward.
    pub fn reset_dependent(&mut self, x: DependentVar, x0: f64) {
        let id = x.node();
        let node = self.node_mut(id);
        node.validated = None;
        let rhs = match &mut node.kind {
            NodeKind::Dependent { state, initial } => {
                *initial = Some(x0);
                match *state {
                    DependentState::OdeBound { rhs } => Some(rhs),
                    _ => None,
                }
            }
            other => mismatched(id, other, "a dependent variable"),
        };

        if let Some(rhs) = rhs {
            self.invalidate(rhs);
        }
        self.node_mut(id).store(0, x0);
        debug!(node = %x, x0, "dependent variable reset");
    }
}
