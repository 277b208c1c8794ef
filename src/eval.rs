//! The sequential loop driver that streams an expression into a matrix.
//!
//! This is the consumer side of the traversal protocol: it never looks at
//! concrete node types, only at the [`Cursor`] trait. Before any element is
//! touched it sweeps the expression with `shape_check`; a single failure
//! anywhere surfaces as [`ExprError::ShapeMismatch`] and leaves both the
//! expression and the destination untouched.
//!
//! Loop structure, from fastest to slowest path:
//! 1. If both nesting levels can be fused (`can_collapse(0, 1)` holds for
//!    every operand), the rank-2 nest collapses into one flat loop.
//! 2. Within the collapsed loop, `advance_unit` replaces `advance` when
//!    every operand traverses the inner rank with unit stride.
//! 3. Otherwise a general two-level nest walks the destination row by row,
//!    using `push`/`pop` to save and restore the outer position around each
//!    inner sweep.

use crate::matrix::{Element, FixedMatrix, RANK};
use crate::traverse::Cursor;
use crate::{ExprError, Result};

/// Evaluate `expr` element-wise into `dest`.
///
/// The destination's shape is the expression-wide target shape; every leaf
/// must conform to it.
///
/// # Errors
/// [`ExprError::ShapeMismatch`] if any leaf fails the conformability check.
pub fn evaluate_into<E, T, const R: usize, const C: usize>(
    dest: &mut FixedMatrix<T, R, C>,
    mut expr: E,
) -> Result<()>
where
    E: Cursor<Elem = T>,
    T: Copy,
{
    let target = dest.shape();
    if !expr.shape_check(&target) {
        return Err(ExprError::ShapeMismatch { target });
    }

    let inner = RANK - 1;
    if expr.can_collapse(0, inner) {
        // Both loops fuse into one flat sweep over R*C elements.
        expr.load_stride(inner);
        if expr.is_unit_stride(inner) {
            for slot in dest.as_mut_slice().iter_mut() {
                *slot = expr.read();
                expr.advance_unit();
            }
        } else {
            for slot in dest.as_mut_slice().iter_mut() {
                *slot = expr.read();
                expr.advance();
            }
        }
        return Ok(());
    }

    // General nest: save the expression origin, sweep each row with the
    // inner stride, restore the row start, then step the outer stride.
    expr.push(0);
    for i in 0..R {
        expr.load_stride(inner);
        expr.push(inner);
        for j in 0..C {
            dest[[i, j]] = expr.read();
            expr.advance();
        }
        expr.pop(inner);
        expr.load_stride(0);
        expr.advance();
    }
    expr.pop(0);
    Ok(())
}

/// Evaluate `expr` into a freshly zeroed matrix.
///
/// # Errors
/// [`ExprError::ShapeMismatch`] if any leaf fails the conformability check
/// against the `R x C` target.
pub fn evaluate<E, T, const R: usize, const C: usize>(expr: E) -> Result<FixedMatrix<T, R, C>>
where
    E: Cursor<Elem = T>,
    T: Element,
{
    let mut dest = FixedMatrix::zeros();
    evaluate_into(&mut dest, expr)?;
    Ok(dest)
}
