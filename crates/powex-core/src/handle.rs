//! Type-safe node handles.
//!
//! Handles are 32-bit indices into a [`SeriesGraph`](crate::SeriesGraph)
//! arena. Operator nodes refer to their operands through handles, so a node
//! can be shared by any number of parents without reference counting.

use std::fmt;

/// A handle to a node in a series graph.
///
/// This is a lightweight 32-bit index that can be copied freely. A handle is
/// only meaningful for the graph that issued it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new handle from an index.
    #[must_use]
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this handle.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

macro_rules! typed_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(NodeId);

        impl $name {
            /// Returns the untyped node handle.
            #[must_use]
            pub const fn node(self) -> NodeId {
                self.0
            }
        }

        impl From<$name> for NodeId {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

typed_handle!(
    /// Handle to the independent variable `t` of a graph.
    IndependentVar
);

typed_handle!(
    /// Handle to a mutable constant.
    Parameter
);

typed_handle!(
    /// Handle to an unknown function governed by data or by an ODE.
    DependentVar
);

impl IndependentVar {
    pub(crate) const fn wrap(id: NodeId) -> Self {
        Self(id)
    }
}

impl Parameter {
    pub(crate) const fn wrap(id: NodeId) -> Self {
        Self(id)
    }
}

impl DependentVar {
    pub(crate) const fn wrap(id: NodeId) -> Self {
        Self(id)
    }
}
