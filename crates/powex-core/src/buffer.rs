//! Growable per-node coefficient storage.
//!
//! Low orders live inline; past that the buffer grows geometrically. Growth
//! copies only the validated prefix, since anything beyond it was never a
//! valid coefficient.

use smallvec::SmallVec;

/// Number of coefficients stored without a heap allocation.
pub const INLINE_ORDERS: usize = 8;

/// Ordered Taylor coefficients `c_0, c_1, ...` of a single node.
#[derive(Clone, Debug)]
pub struct CoefficientBuffer {
    data: SmallVec<[f64; INLINE_ORDERS]>,
}

impl Default for CoefficientBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl CoefficientBuffer {
    /// Creates a buffer with room for [`INLINE_ORDERS`] coefficients.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: SmallVec::from_elem(0.0, INLINE_ORDERS),
        }
    }

    /// Number of coefficient slots currently allocated.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Makes room for coefficient `order`.
    ///
    /// `validated` is the highest order holding a valid value; only
    /// `0..=validated` survives a reallocation.
    pub fn reserve_order(&mut self, order: usize, validated: Option<usize>) {
        let capacity = self.data.len();
        if order < capacity {
            return;
        }

        let new_capacity = (capacity * 2).max(order + 1);
        let keep = validated.map_or(0, |v| (v + 1).min(capacity));

        let mut grown: SmallVec<[f64; INLINE_ORDERS]> = SmallVec::from_elem(0.0, new_capacity);
        grown[..keep].copy_from_slice(&self.data[..keep]);
        self.data = grown;
    }

    /// Writes coefficient `order`, growing the buffer first if needed.
    pub fn store(&mut self, order: usize, value: f64, validated: Option<usize>) {
        self.reserve_order(order, validated);
        self.data[order] = value;
    }

    /// Reads coefficient `order`.
    ///
    /// # Panics
    ///
    /// Panics if `order` is beyond the allocated capacity.
    #[must_use]
    pub fn get(&self, order: usize) -> f64 {
        self.data[order]
    }

    /// Returns the coefficients `0..=validated`, or an empty slice.
    #[must_use]
    pub fn prefix(&self, validated: Option<usize>) -> &[f64] {
        match validated {
            Some(v) => &self.data[..=v],
            None => &[],
        }
    }

    /// Sums `Σ c_i h^i` over `0..=upto` with Horner's rule, high order first.
    #[must_use]
    pub fn horner(&self, upto: usize, h: f64) -> f64 {
        self.data[..=upto]
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * h + c)
    }
}
