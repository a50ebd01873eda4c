//! Node kinds and structural classification flags.

use smallvec::{smallvec, SmallVec};

use crate::buffer::CoefficientBuffer;
use crate::handle::NodeId;

/// Which half of a coupled sin/cos pair a node holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrigRole {
    /// The `sin` half.
    Sin,
    /// The `cos` half.
    Cos,
}

/// Lifecycle of a dependent variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DependentState {
    /// No coefficients and no governing equation.
    Uninitialized,
    /// Coefficients are supplied from outside, one order at a time.
    SeededWithData,
    /// Governed by `x' = rhs`.
    OdeBound {
        /// Right-hand side expression.
        rhs: NodeId,
    },
}

/// Structural shape of a node's series.
///
/// A constant has no coefficient past order 0. An independent-linear node is
/// affine in the expansion variable, so nothing past order 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// All coefficients beyond index 0 are zero.
    pub is_constant: bool,
    /// All coefficients beyond index 1 are zero and the node is not constant.
    pub is_independent_linear: bool,
}

impl NodeFlags {
    /// No structural knowledge.
    pub const GENERAL: Self = Self {
        is_constant: false,
        is_independent_linear: false,
    };

    /// Constant series.
    pub const CONSTANT: Self = Self {
        is_constant: true,
        is_independent_linear: false,
    };

    /// Affine in the expansion variable.
    pub const LINEAR: Self = Self {
        is_constant: false,
        is_independent_linear: true,
    };

    /// Highest index that may hold a non-zero coefficient, if bounded.
    #[must_use]
    pub const fn degree_bound(self) -> Option<usize> {
        if self.is_constant {
            Some(0)
        } else if self.is_independent_linear {
            Some(1)
        } else {
            None
        }
    }

    fn constant_or_linear(self) -> bool {
        self.is_constant || self.is_independent_linear
    }

    /// Flags of `a + b` and `a - b`.
    #[must_use]
    pub fn sum(a: Self, b: Self) -> Self {
        if a.is_constant && b.is_constant {
            Self::CONSTANT
        } else if (a.is_independent_linear && b.constant_or_linear())
            || (a.is_constant && b.is_independent_linear)
        {
            Self::LINEAR
        } else {
            Self::GENERAL
        }
    }

    /// Flags of `a * b`.
    #[must_use]
    pub fn product(a: Self, b: Self) -> Self {
        if a.is_constant && b.is_constant {
            Self::CONSTANT
        } else if (a.is_constant && b.is_independent_linear)
            || (a.is_independent_linear && b.is_constant)
        {
            Self::LINEAR
        } else {
            Self::GENERAL
        }
    }

    /// Flags of `a / b`.
    #[must_use]
    pub fn quotient(a: Self, b: Self) -> Self {
        if a.is_constant && b.is_constant {
            Self::CONSTANT
        } else if a.is_independent_linear && b.is_constant {
            Self::LINEAR
        } else {
            Self::GENERAL
        }
    }

    /// Flags of a transcendental function of an operand.
    #[must_use]
    pub fn transcendental(operand: Self) -> Self {
        if operand.is_constant {
            Self::CONSTANT
        } else {
            Self::GENERAL
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    Constant(f64),
    Parameter(f64),
    Independent {
        t0: f64,
    },
    Negate(NodeId),
    Exp(NodeId),
    Log(NodeId),
    Sqrt(NodeId),
    Pow {
        base: NodeId,
        exponent: f64,
    },
    Trig {
        operand: NodeId,
        role: TrigRole,
        partner: NodeId,
    },
    Add(NodeId, NodeId),
    Sub(NodeId, NodeId),
    Mul(NodeId, NodeId),
    Div(NodeId, NodeId),
    Dependent {
        state: DependentState,
        /// Order-0 value restored after an invalidation.
        initial: Option<f64>,
    },
}

impl NodeKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            NodeKind::Constant(_) => "constant",
            NodeKind::Parameter(_) => "parameter",
            NodeKind::Independent { .. } => "independent",
            NodeKind::Negate(_) => "negate",
            NodeKind::Exp(_) => "exp",
            NodeKind::Log(_) => "log",
            NodeKind::Sqrt(_) => "sqrt",
            NodeKind::Pow { .. } => "pow",
            NodeKind::Trig {
                role: TrigRole::Sin,
                ..
            } => "sin",
            NodeKind::Trig {
                role: TrigRole::Cos,
                ..
            } => "cos",
            NodeKind::Add(..) => "add",
            NodeKind::Sub(..) => "sub",
            NodeKind::Mul(..) => "mul",
            NodeKind::Div(..) => "div",
            NodeKind::Dependent { .. } => "dependent",
        }
    }

    /// Leaves whose coefficients are known in closed form.
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Constant(_) | NodeKind::Parameter(_) | NodeKind::Independent { .. }
        )
    }

    /// Nodes reached by invalidation: operands, the sin/cos partner, and the
    /// right-hand side of an ODE-bound unknown.
    pub(crate) fn operands(&self) -> SmallVec<[NodeId; 2]> {
        match *self {
            NodeKind::Constant(_)
            | NodeKind::Parameter(_)
            | NodeKind::Independent { .. }
            | NodeKind::Dependent {
                state: DependentState::Uninitialized | DependentState::SeededWithData,
                ..
            } => SmallVec::new(),
            NodeKind::Negate(x)
            | NodeKind::Exp(x)
            | NodeKind::Log(x)
            | NodeKind::Sqrt(x)
            | NodeKind::Pow { base: x, .. } => smallvec![x],
            NodeKind::Trig {
                operand, partner, ..
            } => smallvec![operand, partner],
            NodeKind::Add(a, b) | NodeKind::Sub(a, b) | NodeKind::Mul(a, b) | NodeKind::Div(a, b) => {
                smallvec![a, b]
            }
            NodeKind::Dependent {
                state: DependentState::OdeBound { rhs },
                ..
            } => smallvec![rhs],
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) flags: NodeFlags,
    pub(crate) buffer: CoefficientBuffer,
    pub(crate) validated: Option<usize>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, flags: NodeFlags) -> Self {
        Self {
            kind,
            flags,
            buffer: CoefficientBuffer::new(),
            validated: None,
        }
    }

    pub(crate) fn next_order(&self) -> usize {
        self.validated.map_or(0, |v| v + 1)
    }

    pub(crate) fn store(&mut self, order: usize, value: f64) {
        self.buffer.store(order, value, self.validated);
        self.validated = Some(order);
    }
}
