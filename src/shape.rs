//! Shape descriptors and conformability checks.
//!
//! Before an expression is allowed to run, the evaluator sweeps every leaf
//! and asks whether its shape conforms to the expression-wide target shape.
//! The check is a plain boolean: a single `false` anywhere aborts
//! evaluation with a recoverable error, it never panics.

use std::fmt;

/// Row/column extents of a rank-2 operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    extents: [usize; 2],
}

impl Shape {
    /// Create a shape descriptor.
    #[inline]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            extents: [rows, cols],
        }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.extents[0]
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.extents[1]
    }

    /// Extent of dimension `rank`.
    #[inline]
    pub fn extent(&self, rank: usize) -> usize {
        self.extents[rank]
    }

    /// Structural conformability: rank-2 operands conform exactly when
    /// their extents match dimension by dimension.
    #[inline]
    pub fn conformable(&self, other: &Shape) -> bool {
        self.extents == other.extents
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.extents[0], self.extents[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conformable_equal() {
        assert!(Shape::new(2, 3).conformable(&Shape::new(2, 3)));
    }

    #[test]
    fn test_conformable_mismatch() {
        assert!(!Shape::new(2, 3).conformable(&Shape::new(3, 2)));
        assert!(!Shape::new(2, 3).conformable(&Shape::new(2, 4)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::new(4, 7).to_string(), "4 x 7");
    }
}
