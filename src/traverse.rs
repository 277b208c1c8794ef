//! The traversal protocol shared by every node of an expression tree.
//!
//! The generic loop driver in [`eval`](crate::eval) never sees concrete
//! node types: it drives any [`Cursor`], whether that is a single matrix
//! leaf, a scalar constant, or an operator node fanning the calls out to
//! its children. The protocol mirrors how a nested loop walks a strided
//! operand: descend into a nesting level (`load_stride`), remember the
//! outer position (`push`), stream the inner dimension (`read`/`advance`),
//! restore (`pop`), and step the outer dimension.
//!
//! # Rank exhaustion
//!
//! Operands of different rank may co-occur in one expression. A metadata
//! query for a rank at or beyond an operand's actual rank returns an
//! extremal sentinel ([`RANK_EXHAUSTED_LOW`] for lower-bound, ordering and
//! ascending queries, [`RANK_EXHAUSTED_HIGH`] for upper-bound queries) and
//! a suggested stride of 0. The driver treats such an operand as a
//! broadcast (stride-independent) operand at that nesting depth; this
//! convention is what lets a rank-0 scalar sit next to a rank-2 matrix in
//! the same loop nest without rank-specific driver code.

use crate::pretty::PrettyFormat;
use crate::shape::Shape;

/// Sentinel returned by lower-bound, ordering and ascending queries for an
/// exhausted rank.
pub const RANK_EXHAUSTED_LOW: isize = isize::MIN;

/// Sentinel returned by upper-bound queries for an exhausted rank.
pub const RANK_EXHAUSTED_HIGH: isize = isize::MAX;

/// A read position into one operand (or operand subtree) of an expression.
///
/// Implementors are value-like: cloning a cursor clones its position but
/// never the backing data of referencing leaves, and deliberately not the
/// stride/saved-position scratch state (see the crate-level traversal
/// contract).
pub trait Cursor {
    /// Element type produced by reads.
    type Elem: Copy;

    /// Number of matrix leaf operands in this subtree.
    fn num_operands(&self) -> usize;

    /// The element at the current position.
    ///
    /// No bounds check in release builds; the caller must only visit
    /// in-bounds positions.
    fn read(&self) -> Self::Elem;

    /// The element `n` strides away from the current position, without
    /// moving. Meaningful only after `load_stride`.
    fn read_at(&self, n: isize) -> Self::Elem;

    /// The element at a raw flat offset from the current position, with no
    /// stride multiplication. Fast path for kernels that pre-compute flat
    /// offsets once rather than per element.
    fn read_fast(&self, offset: isize) -> Self::Elem;

    /// Move forward by the currently loaded stride.
    fn advance(&mut self);

    /// Move forward by `n` times the currently loaded stride.
    fn advance_by(&mut self, n: isize);

    /// Move forward by exactly one element. Valid only when
    /// `is_unit_stride` holds for the active rank; avoids a multiply.
    fn advance_unit(&mut self);

    /// Load the active stride from the operand's stride table for
    /// dimension `rank`. Must precede `advance`/`read_at` for a new rank.
    fn load_stride(&mut self, rank: usize);

    /// Save the current position into the slot for nesting level `rank`.
    ///
    /// Every `push(r)` must be matched by exactly one `pop(r)` before the
    /// slot is reused; this is a caller contract, not a checked invariant.
    fn push(&mut self, rank: usize);

    /// Restore the position saved by the matching `push(rank)`.
    fn pop(&mut self, rank: usize);

    /// Smallest valid index along `rank`, or [`RANK_EXHAUSTED_LOW`].
    fn lower_bound(&self, rank: usize) -> isize;

    /// Largest valid index along `rank`, or [`RANK_EXHAUSTED_HIGH`].
    fn upper_bound(&self, rank: usize) -> isize;

    /// Storage ordering of `rank` (0 = fastest varying), or
    /// [`RANK_EXHAUSTED_LOW`].
    fn ordering(&self, rank: usize) -> isize;

    /// 1 if `rank` is stored ascending, 0 if not, or
    /// [`RANK_EXHAUSTED_LOW`].
    fn ascending(&self, rank: usize) -> isize;

    /// The operand's stride along `rank`; 0 (broadcast) for an exhausted
    /// rank.
    fn suggested_stride(&self, rank: usize) -> isize;

    /// Whether this operand traverses `rank` with the given stride.
    fn is_stride(&self, rank: usize, stride: isize) -> bool {
        self.suggested_stride(rank) == stride
    }

    /// Whether `rank` is traversed one element at a time, enabling the
    /// `advance_unit` fast path.
    fn is_unit_stride(&self, rank: usize) -> bool {
        self.is_stride(rank, 1)
    }

    /// Whether the loop nesting levels `outer` and `inner` can be fused
    /// into one flat loop for every operand in this subtree.
    fn can_collapse(&self, outer: usize, inner: usize) -> bool;

    /// Structural conformability of every leaf in this subtree against the
    /// expression-wide target shape. Returns false on mismatch; never
    /// panics.
    fn shape_check(&self, target: &Shape) -> bool;

    /// Append this node's rendering to `out` under the formatter's mode.
    /// Diagnostics only; has no effect on evaluation.
    fn render_into(&self, out: &mut String, format: &mut PrettyFormat);
}
