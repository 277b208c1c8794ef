//! Leaf-node traversal cursors for lazy fixed-matrix expressions.
//!
//! This crate provides the cursor machinery that lets arithmetic expressions
//! built from fixed-size, rank-2 numeric matrices be evaluated element-wise
//! without materializing intermediate matrices. A cursor walks one matrix
//! with strided offset arithmetic and exposes a small uniform protocol (the
//! [`Cursor`] trait) that a generic loop driver consumes: per-rank stride
//! loading, position save/restore across nested loops, unit-stride fast
//! paths, dimension collapsing, and a diagnostic pretty-printer.
//!
//! # Core Types
//!
//! - [`FixedMatrix`]: dense, row-major, fixed row/column count storage
//! - [`RefCursor`]: cursor holding a non-owning reference to a matrix —
//!   cheapest to construct, tied to the source's lifetime by the borrow
//!   checker
//! - [`CopyCursor`]: cursor owning a private copy of the matrix — safe to
//!   return from the scope that owned the source, at the cost of one copy
//! - [`Cursor`]: the traversal protocol shared by leaf and operator nodes
//! - [`BinExpr`] / [`UnExpr`] / [`ScalarCursor`]: operator nodes composing
//!   cursors into lazily evaluated expression trees
//!
//! # Example
//!
//! ```rust
//! use fixedmat_expr::{expr, evaluate, FixedMatrix};
//!
//! let a = FixedMatrix::<f64, 2, 3>::from_fn(|i, j| (i * 3 + j) as f64);
//! let b = FixedMatrix::<f64, 2, 3>::filled(10.0);
//!
//! // Build a lazy expression over references; nothing is computed yet.
//! let sum = expr::add(a.cursor(), b.cursor());
//! let out: FixedMatrix<f64, 2, 3> = evaluate(sum).unwrap();
//! assert_eq!(out.get([1, 2]), 15.0);
//! ```
//!
//! # Traversal contract
//!
//! The cursor performs no bounds checking on reads in release builds; the
//! loop driver is contractually responsible for only visiting in-bounds
//! positions (debug builds assert). `stride` is scratch state valid between
//! one `load_stride` call and the next, and saved positions are valid
//! between a `push(r)` and its matching `pop(r)`. Cloning a cursor carries
//! its position but deliberately not its stride or saved positions: clones
//! happen when expression subtrees are replicated, and a clone always
//! re-enters traversal from rank 0 via a fresh `load_stride`.

pub mod cursor;
pub mod eval;
pub mod expr;
pub mod matrix;
pub mod pretty;
pub mod shape;
pub mod traverse;

pub use cursor::{CopyCursor, MatrixCursor, MatrixSource, RefCursor};
pub use eval::{evaluate, evaluate_into};
pub use expr::{BinExpr, ScalarCursor, UnExpr};
pub use matrix::{Element, FixedMatrix, RANK};
pub use pretty::{FormatMode, PrettyFormat};
pub use shape::Shape;
pub use traverse::{Cursor, RANK_EXHAUSTED_HIGH, RANK_EXHAUSTED_LOW};

/// Errors surfaced by expression evaluation.
///
/// Only recoverable conditions live here. Contract violations (out-of-range
/// rank indices, unbalanced push/pop) are programmer errors and assert
/// instead of returning a variant.
#[derive(Debug, thiserror::Error)]
pub enum ExprError {
    /// An operand's shape does not conform to the evaluation target shape.
    ///
    /// Reported when the pre-evaluation conformability sweep across all
    /// leaves of an expression finds a mismatch. The expression is left
    /// untouched and may be safely discarded.
    #[error("shape mismatch: expression operand does not conform to target {target}")]
    ShapeMismatch {
        /// The shape the expression was asked to evaluate into.
        target: Shape,
    },
}

/// Result type for expression evaluation.
pub type Result<T> = std::result::Result<T, ExprError>;
