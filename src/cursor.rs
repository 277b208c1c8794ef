//! Strided traversal cursors over a [`FixedMatrix`].
//!
//! [`MatrixCursor`] is the leaf node of the expression machinery: a read
//! position into exactly one matrix, advanced by strided offset arithmetic
//! under the direction of the loop driver. The ownership mode of the bound
//! matrix is a compile-time parameter:
//!
//! - [`RefCursor`] binds by reference. Construction is free of element
//!   copies, and the borrow checker guarantees the source matrix outlives
//!   (and is not mutated under) the cursor and every expression copy
//!   derived from it.
//! - [`CopyCursor`] binds by value, taking a private copy of the matrix at
//!   construction. Strictly more expensive, but the resulting expression is
//!   self-contained and may be returned from the scope that owned the
//!   source.
//!
//! Cursors are bind-once: there is no operation that rebinds an existing
//! cursor to a different source. Replicating an expression subtree clones
//! its cursors instead, and a clone carries the position but not the
//! stride/saved-position scratch state — the clone always re-enters
//! traversal from rank 0 via a fresh `load_stride`. Until then its loaded
//! stride reads as 0, so `advance` on a fresh clone is a no-op rather than
//! undefined. Whether scratch state should survive a copy is a known sharp
//! edge of this design; "not carried" is the documented contract.

use crate::matrix::{FixedMatrix, RANK};
use crate::pretty::{FormatMode, PrettyFormat};
use crate::shape::Shape;
use crate::traverse::{Cursor, RANK_EXHAUSTED_HIGH, RANK_EXHAUSTED_LOW};
use std::fmt;
use std::marker::PhantomData;

/// Ownership mode of the matrix bound to a [`MatrixCursor`].
///
/// Implemented by `&FixedMatrix` (referencing mode) and `FixedMatrix`
/// (owning mode). The mode is fixed at cursor construction; there is no
/// runtime dispatch between the two.
pub trait MatrixSource<T, const R: usize, const C: usize> {
    /// The bound matrix.
    fn matrix(&self) -> &FixedMatrix<T, R, C>;
}

impl<T, const R: usize, const C: usize> MatrixSource<T, R, C> for &FixedMatrix<T, R, C> {
    #[inline]
    fn matrix(&self) -> &FixedMatrix<T, R, C> {
        self
    }
}

impl<T, const R: usize, const C: usize> MatrixSource<T, R, C> for FixedMatrix<T, R, C> {
    #[inline]
    fn matrix(&self) -> &FixedMatrix<T, R, C> {
        self
    }
}

/// A read position into one fixed matrix, generic over ownership mode.
///
/// State beyond the source binding:
/// - `offset`: the current read position, in elements from the matrix base
///   pointer. Always within `0..R*C` for any position the loop driver is
///   permitted to visit.
/// - `stride`: the active stride loaded by the last `load_stride`. Scratch
///   state, not per-rank persistent.
/// - `saved`: one saved position per nesting level, valid between a
///   `push(r)` and its matching `pop(r)`.
pub struct MatrixCursor<T, const R: usize, const C: usize, S: MatrixSource<T, R, C>> {
    source: S,
    offset: isize,
    stride: isize,
    saved: [isize; RANK],
    _elem: PhantomData<T>,
}

/// Cursor referencing an externally owned matrix.
pub type RefCursor<'a, T, const R: usize, const C: usize> =
    MatrixCursor<T, R, C, &'a FixedMatrix<T, R, C>>;

/// Cursor owning a private copy of its matrix.
pub type CopyCursor<T, const R: usize, const C: usize> =
    MatrixCursor<T, R, C, FixedMatrix<T, R, C>>;

impl<T, const R: usize, const C: usize, S: MatrixSource<T, R, C>> MatrixCursor<T, R, C, S> {
    /// Bind a cursor to `source`, positioned at the matrix base. Stride and
    /// saved positions are established lazily by the loop driver.
    pub fn new(source: S) -> Self {
        Self {
            source,
            offset: 0,
            stride: 0,
            saved: [0; RANK],
            _elem: PhantomData,
        }
    }

    /// The bound matrix.
    #[inline]
    pub fn matrix(&self) -> &FixedMatrix<T, R, C> {
        self.source.matrix()
    }

    /// Current position, in elements from the matrix base pointer.
    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    /// The currently loaded stride (0 until the first `load_stride`).
    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }

    #[inline]
    fn in_bounds(&self, offset: isize) -> bool {
        (0..(R * C) as isize).contains(&offset)
    }
}

impl<T: Copy, const R: usize, const C: usize, S: MatrixSource<T, R, C>> MatrixCursor<T, R, C, S> {
    /// The element at the current position.
    ///
    /// No bounds check in release builds: the loop driver is contractually
    /// responsible for only visiting in-bounds positions, and debug builds
    /// assert that contract.
    #[inline]
    pub fn read(&self) -> T {
        debug_assert!(self.in_bounds(self.offset), "cursor read out of bounds");
        unsafe { *self.source.matrix().as_ptr().offset(self.offset) }
    }

    /// The element `n` strides from the current position, without moving.
    #[inline]
    pub fn read_at(&self, n: isize) -> T {
        let offset = self.offset + n * self.stride;
        debug_assert!(self.in_bounds(offset), "cursor read_at out of bounds");
        unsafe { *self.source.matrix().as_ptr().offset(offset) }
    }

    /// The element at a raw flat offset from the current position, with no
    /// stride multiplication.
    #[inline]
    pub fn read_fast(&self, offset: isize) -> T {
        let offset = self.offset + offset;
        debug_assert!(self.in_bounds(offset), "cursor read_fast out of bounds");
        unsafe { *self.source.matrix().as_ptr().offset(offset) }
    }

    /// Element access by 2-vector index, independent of traversal state.
    #[inline]
    pub fn at(&self, index: [usize; 2]) -> T {
        self.source.matrix().get(index)
    }
}

impl<T: Copy, const R: usize, const C: usize, S: MatrixSource<T, R, C>> Cursor
    for MatrixCursor<T, R, C, S>
{
    type Elem = T;

    #[inline]
    fn num_operands(&self) -> usize {
        1
    }

    #[inline]
    fn read(&self) -> T {
        MatrixCursor::read(self)
    }

    #[inline]
    fn read_at(&self, n: isize) -> T {
        MatrixCursor::read_at(self, n)
    }

    #[inline]
    fn read_fast(&self, offset: isize) -> T {
        MatrixCursor::read_fast(self, offset)
    }

    #[inline]
    fn advance(&mut self) {
        self.offset += self.stride;
    }

    #[inline]
    fn advance_by(&mut self, n: isize) {
        self.offset += n * self.stride;
    }

    #[inline]
    fn advance_unit(&mut self) {
        self.offset += 1;
    }

    #[inline]
    fn load_stride(&mut self, rank: usize) {
        self.stride = self.source.matrix().stride(rank);
    }

    #[inline]
    fn push(&mut self, rank: usize) {
        self.saved[rank] = self.offset;
    }

    #[inline]
    fn pop(&mut self, rank: usize) {
        self.offset = self.saved[rank];
    }

    #[inline]
    fn lower_bound(&self, rank: usize) -> isize {
        if rank < RANK {
            self.source.matrix().lower_bound(rank)
        } else {
            RANK_EXHAUSTED_LOW
        }
    }

    #[inline]
    fn upper_bound(&self, rank: usize) -> isize {
        if rank < RANK {
            self.source.matrix().upper_bound(rank)
        } else {
            RANK_EXHAUSTED_HIGH
        }
    }

    #[inline]
    fn ordering(&self, rank: usize) -> isize {
        if rank < RANK {
            self.source.matrix().ordering(rank) as isize
        } else {
            RANK_EXHAUSTED_LOW
        }
    }

    #[inline]
    fn ascending(&self, rank: usize) -> isize {
        if rank < RANK {
            self.source.matrix().is_ascending(rank) as isize
        } else {
            RANK_EXHAUSTED_LOW
        }
    }

    #[inline]
    fn suggested_stride(&self, rank: usize) -> isize {
        if rank < RANK {
            self.source.matrix().stride(rank)
        } else {
            // Exhausted ranks behave as stride-0 broadcast operands.
            0
        }
    }

    #[inline]
    fn can_collapse(&self, outer: usize, inner: usize) -> bool {
        self.source.matrix().can_collapse(outer, inner)
    }

    #[inline]
    fn shape_check(&self, target: &Shape) -> bool {
        self.source.matrix().shape().conformable(target)
    }

    fn render_into(&self, out: &mut String, format: &mut PrettyFormat) {
        match format.mode() {
            FormatMode::Terse => out.push(format.next_operand_symbol()),
            FormatMode::Shapes => out.push_str(&self.source.matrix().shape().to_string()),
            FormatMode::TypeInfo => {
                out.push_str(&format!(
                    "FixedMatrix<{}, {}, {}>",
                    std::any::type_name::<T>(),
                    R,
                    C
                ));
            }
        }
    }
}

impl<T, const R: usize, const C: usize, S> Clone for MatrixCursor<T, R, C, S>
where
    S: MatrixSource<T, R, C> + Clone,
{
    /// Duplicates the source binding and position. The stride and saved
    /// positions are deliberately not carried: clones happen when
    /// expression subtrees are replicated for evaluation, and a clone
    /// always re-enters traversal from rank 0 via a fresh `load_stride`.
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            offset: self.offset,
            stride: 0,
            saved: [0; RANK],
            _elem: PhantomData,
        }
    }
}

impl<T, const R: usize, const C: usize, S: MatrixSource<T, R, C>> fmt::Debug
    for MatrixCursor<T, R, C, S>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixCursor")
            .field("shape", &self.source.matrix().shape())
            .field("offset", &self.offset)
            .field("stride", &self.stride)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FixedMatrix<f64, 2, 3> {
        FixedMatrix::from_fn(|i, j| (i * 3 + j) as f64)
    }

    #[test]
    fn test_ref_cursor_starts_at_base() {
        let m = sample();
        let cursor = m.cursor();
        assert_eq!(cursor.read(), 0.0);
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_advance_with_loaded_stride() {
        let m = sample();
        let mut cursor = m.cursor();
        cursor.load_stride(1);
        cursor.advance();
        assert_eq!(cursor.read(), 1.0);
        cursor.load_stride(0);
        cursor.advance();
        assert_eq!(cursor.read(), 4.0);
    }

    #[test]
    fn test_read_at_does_not_move() {
        let m = sample();
        let mut cursor = m.cursor();
        cursor.load_stride(0);
        assert_eq!(cursor.read_at(1), 3.0);
        assert_eq!(cursor.read(), 0.0);
    }

    #[test]
    fn test_read_fast_ignores_stride() {
        let m = sample();
        let mut cursor = m.cursor();
        cursor.load_stride(0);
        assert_eq!(cursor.read_fast(4), 4.0);
    }

    #[test]
    fn test_push_pop_roundtrip() {
        let m = sample();
        let mut cursor = m.cursor();
        cursor.load_stride(1);
        cursor.advance();
        let before = cursor.read();
        cursor.push(0);
        cursor.advance_by(2);
        assert_ne!(cursor.read(), before);
        cursor.pop(0);
        assert_eq!(cursor.read(), before);
    }

    #[test]
    fn test_metadata_passthrough() {
        let m = sample();
        let cursor = m.cursor();
        assert_eq!(cursor.lower_bound(0), 0);
        assert_eq!(cursor.upper_bound(0), 1);
        assert_eq!(cursor.upper_bound(1), 2);
        assert_eq!(cursor.ordering(1), 0);
        assert_eq!(cursor.ascending(0), 1);
        assert_eq!(cursor.suggested_stride(0), 3);
        assert!(cursor.is_stride(0, 3));
        assert!(cursor.is_unit_stride(1));
        assert!(!cursor.is_unit_stride(0));
        assert!(cursor.can_collapse(0, 1));
    }

    #[test]
    fn test_rank_exhausted_sentinels() {
        let m = sample();
        let cursor = m.cursor();
        for rank in RANK..RANK + 3 {
            assert_eq!(cursor.lower_bound(rank), RANK_EXHAUSTED_LOW);
            assert_eq!(cursor.upper_bound(rank), RANK_EXHAUSTED_HIGH);
            assert_eq!(cursor.ordering(rank), RANK_EXHAUSTED_LOW);
            assert_eq!(cursor.ascending(rank), RANK_EXHAUSTED_LOW);
            assert_eq!(cursor.suggested_stride(rank), 0);
        }
    }

    #[test]
    fn test_clone_carries_position_not_stride() {
        let m = sample();
        let mut cursor = m.cursor();
        cursor.load_stride(1);
        cursor.advance();
        cursor.push(0);

        let mut copy = cursor.clone();
        assert_eq!(copy.read(), cursor.read());
        assert_eq!(copy.stride(), 0);
        // Documented contract: advance before a fresh load_stride is a
        // no-op on a clone.
        copy.advance();
        assert_eq!(copy.read(), cursor.read());
        copy.load_stride(1);
        copy.advance();
        assert_eq!(copy.read(), 2.0);
    }

    #[test]
    fn test_copy_cursor_owns_its_data() {
        let mut m = sample();
        let cursor = m.copy_cursor();
        m.set([0, 0], 99.0);
        assert_eq!(cursor.read(), 0.0);
        assert_eq!(m.cursor().read(), 99.0);
    }

    #[test]
    fn test_render_modes() {
        let m = sample();
        let cursor = m.cursor();

        let mut out = String::new();
        cursor.render_into(&mut out, &mut PrettyFormat::terse());
        assert_eq!(out, "A");

        let mut out = String::new();
        cursor.render_into(&mut out, &mut PrettyFormat::shapes());
        assert_eq!(out, "2 x 3");

        let mut out = String::new();
        cursor.render_into(&mut out, &mut PrettyFormat::type_info());
        assert_eq!(out, "FixedMatrix<f64, 2, 3>");
    }

    #[test]
    fn test_shape_check() {
        let m = sample();
        let cursor = m.cursor();
        assert!(cursor.shape_check(&Shape::new(2, 3)));
        assert!(!cursor.shape_check(&Shape::new(3, 2)));
    }
}
