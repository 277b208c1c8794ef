//! Operator nodes composing cursors into lazy expression trees.
//!
//! An expression tree is just a tree of [`Cursor`] implementors: matrix
//! leaves at the bottom, [`BinExpr`]/[`UnExpr`] operator nodes above them,
//! and [`ScalarCursor`] for broadcast constants. Operator nodes hold their
//! children by value and fan every traversal call out to them, so the loop
//! driver streams a whole tree exactly as it streams a single leaf.
//!
//! Metadata combines across children the way a conforming expression
//! requires: bounds tighten (max of lower bounds, min of upper bounds),
//! ordering/ascending/stride suggestions take the most informative child
//! (rank-exhausted sentinels always lose), and collapse eligibility, stride
//! predicates and shape checks hold only if they hold for every child.

use crate::pretty::PrettyFormat;
use crate::shape::Shape;
use crate::traverse::{Cursor, RANK_EXHAUSTED_HIGH, RANK_EXHAUSTED_LOW};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

// ============================================================================
// Scalar constants
// ============================================================================

/// A rank-0 constant operand.
///
/// Every rank is exhausted for a scalar: all metadata queries report the
/// rank-exhaustion sentinels, its suggested stride is always 0, and it
/// conforms to any shape and any stride. The loop driver therefore treats
/// it as a broadcast operand at every nesting depth — advancing it is a
/// no-op and every read yields the same value.
#[derive(Clone, Copy, Debug)]
pub struct ScalarCursor<T> {
    value: T,
}

impl<T> ScalarCursor<T> {
    /// Wrap a constant value as a broadcast operand.
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

/// Shorthand for [`ScalarCursor::new`].
pub fn scalar<T>(value: T) -> ScalarCursor<T> {
    ScalarCursor::new(value)
}

impl<T: Copy + fmt::Display> Cursor for ScalarCursor<T> {
    type Elem = T;

    #[inline]
    fn num_operands(&self) -> usize {
        0
    }

    #[inline]
    fn read(&self) -> T {
        self.value
    }

    #[inline]
    fn read_at(&self, _n: isize) -> T {
        self.value
    }

    #[inline]
    fn read_fast(&self, _offset: isize) -> T {
        self.value
    }

    #[inline]
    fn advance(&mut self) {}

    #[inline]
    fn advance_by(&mut self, _n: isize) {}

    #[inline]
    fn advance_unit(&mut self) {}

    #[inline]
    fn load_stride(&mut self, _rank: usize) {}

    #[inline]
    fn push(&mut self, _rank: usize) {}

    #[inline]
    fn pop(&mut self, _rank: usize) {}

    #[inline]
    fn lower_bound(&self, _rank: usize) -> isize {
        RANK_EXHAUSTED_LOW
    }

    #[inline]
    fn upper_bound(&self, _rank: usize) -> isize {
        RANK_EXHAUSTED_HIGH
    }

    #[inline]
    fn ordering(&self, _rank: usize) -> isize {
        RANK_EXHAUSTED_LOW
    }

    #[inline]
    fn ascending(&self, _rank: usize) -> isize {
        RANK_EXHAUSTED_LOW
    }

    #[inline]
    fn suggested_stride(&self, _rank: usize) -> isize {
        0
    }

    // A constant conforms to any stride, so it never blocks a fast path.
    #[inline]
    fn is_stride(&self, _rank: usize, _stride: isize) -> bool {
        true
    }

    #[inline]
    fn can_collapse(&self, _outer: usize, _inner: usize) -> bool {
        true
    }

    #[inline]
    fn shape_check(&self, _target: &Shape) -> bool {
        true
    }

    fn render_into(&self, out: &mut String, _format: &mut PrettyFormat) {
        out.push_str(&self.value.to_string());
    }
}

// ============================================================================
// Binary operator nodes
// ============================================================================

/// A binary element-wise operation over two cursor subtrees.
#[derive(Clone, Debug)]
pub struct BinExpr<L, R, F> {
    left: L,
    right: R,
    f: F,
    symbol: &'static str,
}

impl<L, R, F> BinExpr<L, R, F> {
    /// Combine two subtrees with `f`; `symbol` is used by the diagnostic
    /// renderer only.
    pub fn new(left: L, right: R, symbol: &'static str, f: F) -> Self {
        Self {
            left,
            right,
            f,
            symbol,
        }
    }
}

impl<L, R, F> Cursor for BinExpr<L, R, F>
where
    L: Cursor,
    R: Cursor<Elem = L::Elem>,
    F: Fn(L::Elem, L::Elem) -> L::Elem,
{
    type Elem = L::Elem;

    #[inline]
    fn num_operands(&self) -> usize {
        self.left.num_operands() + self.right.num_operands()
    }

    #[inline]
    fn read(&self) -> Self::Elem {
        (self.f)(self.left.read(), self.right.read())
    }

    #[inline]
    fn read_at(&self, n: isize) -> Self::Elem {
        (self.f)(self.left.read_at(n), self.right.read_at(n))
    }

    #[inline]
    fn read_fast(&self, offset: isize) -> Self::Elem {
        (self.f)(self.left.read_fast(offset), self.right.read_fast(offset))
    }

    #[inline]
    fn advance(&mut self) {
        self.left.advance();
        self.right.advance();
    }

    #[inline]
    fn advance_by(&mut self, n: isize) {
        self.left.advance_by(n);
        self.right.advance_by(n);
    }

    #[inline]
    fn advance_unit(&mut self) {
        self.left.advance_unit();
        self.right.advance_unit();
    }

    #[inline]
    fn load_stride(&mut self, rank: usize) {
        self.left.load_stride(rank);
        self.right.load_stride(rank);
    }

    #[inline]
    fn push(&mut self, rank: usize) {
        self.left.push(rank);
        self.right.push(rank);
    }

    #[inline]
    fn pop(&mut self, rank: usize) {
        self.left.pop(rank);
        self.right.pop(rank);
    }

    #[inline]
    fn lower_bound(&self, rank: usize) -> isize {
        self.left.lower_bound(rank).max(self.right.lower_bound(rank))
    }

    #[inline]
    fn upper_bound(&self, rank: usize) -> isize {
        self.left.upper_bound(rank).min(self.right.upper_bound(rank))
    }

    #[inline]
    fn ordering(&self, rank: usize) -> isize {
        self.left.ordering(rank).max(self.right.ordering(rank))
    }

    #[inline]
    fn ascending(&self, rank: usize) -> isize {
        self.left.ascending(rank).max(self.right.ascending(rank))
    }

    #[inline]
    fn suggested_stride(&self, rank: usize) -> isize {
        self
            .left
            .suggested_stride(rank)
            .max(self.right.suggested_stride(rank))
    }

    #[inline]
    fn is_stride(&self, rank: usize, stride: isize) -> bool {
        self.left.is_stride(rank, stride) && self.right.is_stride(rank, stride)
    }

    #[inline]
    fn can_collapse(&self, outer: usize, inner: usize) -> bool {
        self.left.can_collapse(outer, inner) && self.right.can_collapse(outer, inner)
    }

    #[inline]
    fn shape_check(&self, target: &Shape) -> bool {
        self.left.shape_check(target) && self.right.shape_check(target)
    }

    fn render_into(&self, out: &mut String, format: &mut PrettyFormat) {
        out.push('(');
        self.left.render_into(out, format);
        out.push(' ');
        out.push_str(self.symbol);
        out.push(' ');
        self.right.render_into(out, format);
        out.push(')');
    }
}

// ============================================================================
// Unary operator nodes
// ============================================================================

/// A unary element-wise operation over one cursor subtree.
#[derive(Clone, Debug)]
pub struct UnExpr<E, F> {
    operand: E,
    f: F,
    symbol: &'static str,
}

impl<E, F> UnExpr<E, F> {
    /// Wrap a subtree with `f`; `symbol` is used by the diagnostic renderer
    /// only.
    pub fn new(operand: E, symbol: &'static str, f: F) -> Self {
        Self { operand, f, symbol }
    }
}

impl<E, F> Cursor for UnExpr<E, F>
where
    E: Cursor,
    F: Fn(E::Elem) -> E::Elem,
{
    type Elem = E::Elem;

    #[inline]
    fn num_operands(&self) -> usize {
        self.operand.num_operands()
    }

    #[inline]
    fn read(&self) -> Self::Elem {
        (self.f)(self.operand.read())
    }

    #[inline]
    fn read_at(&self, n: isize) -> Self::Elem {
        (self.f)(self.operand.read_at(n))
    }

    #[inline]
    fn read_fast(&self, offset: isize) -> Self::Elem {
        (self.f)(self.operand.read_fast(offset))
    }

    #[inline]
    fn advance(&mut self) {
        self.operand.advance();
    }

    #[inline]
    fn advance_by(&mut self, n: isize) {
        self.operand.advance_by(n);
    }

    #[inline]
    fn advance_unit(&mut self) {
        self.operand.advance_unit();
    }

    #[inline]
    fn load_stride(&mut self, rank: usize) {
        self.operand.load_stride(rank);
    }

    #[inline]
    fn push(&mut self, rank: usize) {
        self.operand.push(rank);
    }

    #[inline]
    fn pop(&mut self, rank: usize) {
        self.operand.pop(rank);
    }

    #[inline]
    fn lower_bound(&self, rank: usize) -> isize {
        self.operand.lower_bound(rank)
    }

    #[inline]
    fn upper_bound(&self, rank: usize) -> isize {
        self.operand.upper_bound(rank)
    }

    #[inline]
    fn ordering(&self, rank: usize) -> isize {
        self.operand.ordering(rank)
    }

    #[inline]
    fn ascending(&self, rank: usize) -> isize {
        self.operand.ascending(rank)
    }

    #[inline]
    fn suggested_stride(&self, rank: usize) -> isize {
        self.operand.suggested_stride(rank)
    }

    #[inline]
    fn is_stride(&self, rank: usize, stride: isize) -> bool {
        self.operand.is_stride(rank, stride)
    }

    #[inline]
    fn can_collapse(&self, outer: usize, inner: usize) -> bool {
        self.operand.can_collapse(outer, inner)
    }

    #[inline]
    fn shape_check(&self, target: &Shape) -> bool {
        self.operand.shape_check(target)
    }

    fn render_into(&self, out: &mut String, format: &mut PrettyFormat) {
        out.push('(');
        out.push_str(self.symbol);
        self.operand.render_into(out, format);
        out.push(')');
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

/// Element-wise sum of two subtrees.
pub fn add<L, R>(left: L, right: R) -> BinExpr<L, R, impl Fn(L::Elem, L::Elem) -> L::Elem + Clone>
where
    L: Cursor,
    R: Cursor<Elem = L::Elem>,
    L::Elem: Add<Output = L::Elem>,
{
    BinExpr::new(left, right, "+", |a, b| a + b)
}

/// Element-wise difference of two subtrees.
pub fn sub<L, R>(left: L, right: R) -> BinExpr<L, R, impl Fn(L::Elem, L::Elem) -> L::Elem + Clone>
where
    L: Cursor,
    R: Cursor<Elem = L::Elem>,
    L::Elem: Sub<Output = L::Elem>,
{
    BinExpr::new(left, right, "-", |a, b| a - b)
}

/// Element-wise product of two subtrees.
pub fn mul<L, R>(left: L, right: R) -> BinExpr<L, R, impl Fn(L::Elem, L::Elem) -> L::Elem + Clone>
where
    L: Cursor,
    R: Cursor<Elem = L::Elem>,
    L::Elem: Mul<Output = L::Elem>,
{
    BinExpr::new(left, right, "*", |a, b| a * b)
}

/// Element-wise negation of a subtree.
pub fn neg<E>(operand: E) -> UnExpr<E, impl Fn(E::Elem) -> E::Elem + Clone>
where
    E: Cursor,
    E::Elem: Neg<Output = E::Elem>,
{
    UnExpr::new(operand, "-", |a: E::Elem| -a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{FixedMatrix, RANK};
    use crate::pretty::PrettyFormat;

    fn sample() -> FixedMatrix<f64, 2, 3> {
        FixedMatrix::from_fn(|i, j| (i * 3 + j) as f64)
    }

    #[test]
    fn test_scalar_is_exhausted_at_every_rank() {
        let s = scalar(2.5f64);
        for rank in 0..RANK + 2 {
            assert_eq!(s.lower_bound(rank), RANK_EXHAUSTED_LOW);
            assert_eq!(s.upper_bound(rank), RANK_EXHAUSTED_HIGH);
            assert_eq!(s.ordering(rank), RANK_EXHAUSTED_LOW);
            assert_eq!(s.suggested_stride(rank), 0);
            assert!(s.is_unit_stride(rank));
        }
        assert!(s.shape_check(&crate::Shape::new(7, 9)));
    }

    #[test]
    fn test_scalar_broadcast_reads() {
        let mut s = scalar(4.0f64);
        s.load_stride(1);
        s.advance();
        s.advance_unit();
        assert_eq!(s.read(), 4.0);
        assert_eq!(s.read_at(5), 4.0);
    }

    #[test]
    fn test_bin_expr_streams_both_children() {
        let a = sample();
        let b = sample();
        let mut e = add(a.cursor(), b.cursor());
        e.load_stride(1);
        assert_eq!(e.read(), 0.0);
        e.advance();
        assert_eq!(e.read(), 2.0);
        e.advance_by(2);
        assert_eq!(e.read(), 6.0);
    }

    #[test]
    fn test_bin_expr_metadata_combination() {
        let a = sample();
        let e = add(a.cursor(), scalar(1.0));
        // The scalar's sentinels never win over real metadata.
        assert_eq!(e.lower_bound(0), 0);
        assert_eq!(e.upper_bound(0), 1);
        assert_eq!(e.ordering(1), 0);
        assert_eq!(e.suggested_stride(1), 1);
        // The scalar conforms to any stride, so the fast-path predicates
        // are decided by the matrix leaf alone.
        assert!(e.is_unit_stride(1));
        assert!(!e.is_unit_stride(0));
        assert!(e.can_collapse(0, 1));
        assert_eq!(e.num_operands(), 1);
    }

    #[test]
    fn test_shape_check_aggregates_over_leaves() {
        let a = sample();
        let b = FixedMatrix::<f64, 2, 3>::filled(1.0);
        let e = mul(a.cursor(), b.cursor());
        assert!(e.shape_check(&crate::Shape::new(2, 3)));
        assert!(!e.shape_check(&crate::Shape::new(3, 3)));
    }

    #[test]
    fn test_terse_rendering_assigns_symbols_in_order() {
        let a = sample();
        let b = sample();
        let e = add(a.cursor(), neg(b.cursor()));
        let mut out = String::new();
        e.render_into(&mut out, &mut PrettyFormat::terse());
        assert_eq!(out, "(A + (-B))");
    }

    #[test]
    fn test_scalar_renders_its_value() {
        let a = sample();
        let e = mul(a.cursor(), scalar(2.0));
        let mut out = String::new();
        e.render_into(&mut out, &mut PrettyFormat::terse());
        assert_eq!(out, "(A * 2)");
    }

    #[test]
    fn test_shape_dump_rendering() {
        let a = sample();
        let b = sample();
        let e = sub(a.cursor(), b.cursor());
        let mut out = String::new();
        e.render_into(&mut out, &mut PrettyFormat::shapes());
        assert_eq!(out, "(2 x 3 - 2 x 3)");
    }
}
