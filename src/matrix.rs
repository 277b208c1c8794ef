//! Dense fixed-size rank-2 matrix storage.
//!
//! [`FixedMatrix`] is the storage collaborator the traversal cursors bind
//! to: a dense, row-major container whose row and column counts are const
//! generics. It exposes the shape metadata the cursor protocol forwards
//! (per-rank strides, bounds, storage ordering, ascending flags), the
//! collapse-eligibility predicate the loop driver consults for loop fusion,
//! and raw base-pointer access for strided reads.

use crate::cursor::{CopyCursor, RefCursor};
use crate::shape::Shape;
use std::ops::{Index, IndexMut};

/// Fixed rank of every matrix in this crate.
pub const RANK: usize = 2;

/// Shared bounds for element types stored in a [`FixedMatrix`].
///
/// Covers the arithmetic the expression helpers need plus the additive
/// identity used to allocate destinations. `Send`/`Sync` are deliberately
/// not required: traversal is a single-threaded, in-process primitive.
pub trait Element:
    Copy
    + PartialEq
    + std::ops::Add<Output = Self>
    + std::ops::Mul<Output = Self>
    + num_traits::Zero
    + num_traits::One
{
}

impl<T> Element for T where
    T: Copy
        + PartialEq
        + std::ops::Add<Output = T>
        + std::ops::Mul<Output = T>
        + num_traits::Zero
        + num_traits::One
{
}

/// A dense, row-major matrix with compile-time row and column counts.
///
/// Storage is inline (`[[T; C]; R]`), so copying a matrix copies its
/// elements and no heap allocation ever happens. Strides are fixed by the
/// layout: `C` along rank 0 (rows), `1` along rank 1 (columns).
///
/// # Example
/// ```rust
/// use fixedmat_expr::FixedMatrix;
///
/// let m = FixedMatrix::<i32, 2, 3>::from_rows([[1, 2, 3], [4, 5, 6]]);
/// assert_eq!(m.get([1, 2]), 6);
/// assert_eq!(m.stride(0), 3);
/// assert_eq!(m.stride(1), 1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FixedMatrix<T, const R: usize, const C: usize> {
    data: [[T; C]; R],
}

impl<T, const R: usize, const C: usize> FixedMatrix<T, R, C> {
    /// Create a matrix from a nested row array.
    pub fn from_rows(rows: [[T; C]; R]) -> Self {
        Self { data: rows }
    }

    /// Create a matrix with values produced by a function of `(row, col)`.
    pub fn from_fn(mut f: impl FnMut(usize, usize) -> T) -> Self {
        Self {
            data: std::array::from_fn(|i| std::array::from_fn(|j| f(i, j))),
        }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        R
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        C
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        R * C
    }

    /// Returns true if the matrix holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        R * C == 0
    }

    /// Extent of dimension `rank`.
    ///
    /// # Panics
    /// Panics if `rank >= 2`.
    #[inline]
    pub fn extent(&self, rank: usize) -> usize {
        assert!(rank < RANK, "rank {rank} out of range for a rank-2 matrix");
        if rank == 0 {
            R
        } else {
            C
        }
    }

    /// Memory distance, in elements, between consecutive positions along
    /// dimension `rank`. Row-major: `C` for rank 0, `1` for rank 1.
    ///
    /// # Panics
    /// Panics if `rank >= 2`.
    #[inline]
    pub fn stride(&self, rank: usize) -> isize {
        assert!(rank < RANK, "rank {rank} out of range for a rank-2 matrix");
        if rank == 0 {
            C as isize
        } else {
            1
        }
    }

    /// Smallest valid index along dimension `rank` (always 0).
    #[inline]
    pub fn lower_bound(&self, rank: usize) -> isize {
        assert!(rank < RANK, "rank {rank} out of range for a rank-2 matrix");
        0
    }

    /// Largest valid index along dimension `rank`.
    #[inline]
    pub fn upper_bound(&self, rank: usize) -> isize {
        self.extent(rank) as isize - 1
    }

    /// Storage ordering of dimension `rank`: 0 for the fastest-varying
    /// dimension in memory. Row-major storage orders rank 1 fastest, so
    /// `ordering(1) == 0` and `ordering(0) == 1`.
    #[inline]
    pub fn ordering(&self, rank: usize) -> usize {
        assert!(rank < RANK, "rank {rank} out of range for a rank-2 matrix");
        RANK - 1 - rank
    }

    /// Whether dimension `rank` is stored with ascending addresses.
    /// Always true for this layout.
    #[inline]
    pub fn is_ascending(&self, rank: usize) -> bool {
        assert!(rank < RANK, "rank {rank} out of range for a rank-2 matrix");
        true
    }

    /// Whether the loop over `inner` tiles exactly into the loop over
    /// `outer`, so the two nesting levels can be fused into one flat loop.
    #[inline]
    pub fn can_collapse(&self, outer: usize, inner: usize) -> bool {
        self.stride(inner) * self.extent(inner) as isize == self.stride(outer)
    }

    /// Shape descriptor for conformability checks.
    #[inline]
    pub fn shape(&self) -> Shape {
        Shape::new(R, C)
    }

    /// Raw pointer to the first element of the backing storage.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr().cast()
    }

    /// The backing storage as a flat row-major slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // Nested arrays are guaranteed contiguous.
        unsafe { std::slice::from_raw_parts(self.as_ptr(), R * C) }
    }

    /// The backing storage as a flat mutable row-major slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.data.as_mut_ptr().cast(), R * C) }
    }

    /// Cursor referencing this matrix. Cheapest to construct; the borrow
    /// ties the cursor (and every expression built from it) to this
    /// matrix's lifetime.
    #[inline]
    pub fn cursor(&self) -> RefCursor<'_, T, R, C> {
        RefCursor::new(self)
    }
}

impl<T: Clone, const R: usize, const C: usize> FixedMatrix<T, R, C> {
    /// Cursor owning a private copy of this matrix. One element-wise copy
    /// up front, but the resulting expression may outlive the original.
    #[inline]
    pub fn copy_cursor(&self) -> CopyCursor<T, R, C> {
        CopyCursor::new(self.clone())
    }
}

impl<T: Copy, const R: usize, const C: usize> FixedMatrix<T, R, C> {
    /// Create a matrix with every element set to `value`.
    pub fn filled(value: T) -> Self {
        Self {
            data: [[value; C]; R],
        }
    }

    /// Element at `[row, col]`.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn get(&self, index: [usize; 2]) -> T {
        self.data[index[0]][index[1]]
    }

    /// Overwrite the element at `[row, col]`.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn set(&mut self, index: [usize; 2], value: T) {
        self.data[index[0]][index[1]] = value;
    }
}

impl<T: Element, const R: usize, const C: usize> FixedMatrix<T, R, C> {
    /// Create a matrix of additive identities.
    pub fn zeros() -> Self {
        Self::filled(T::zero())
    }
}

impl<T, const R: usize, const C: usize> Index<[usize; 2]> for FixedMatrix<T, R, C> {
    type Output = T;

    #[inline]
    fn index(&self, index: [usize; 2]) -> &T {
        &self.data[index[0]][index[1]]
    }
}

impl<T, const R: usize, const C: usize> IndexMut<[usize; 2]> for FixedMatrix<T, R, C> {
    #[inline]
    fn index_mut(&mut self, index: [usize; 2]) -> &mut T {
        &mut self.data[index[0]][index[1]]
    }
}
