//! Error types for dense linear algebra.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinalgError {
    /// LU decomposition hit a zero (or numerically negligible) pivot.
    #[error("Singular matrix: no usable pivot in column {pivot_row}")]
    Singular { pivot_row: usize },

    #[error("Matrix is not square ({rows}x{cols})")]
    NotSquare { rows: usize, cols: usize },

    #[error("Dimension mismatch (expected={expected}, actual={actual})")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Matrix has not been LU-decomposed")]
    NotFactored,

    #[error("View [{offset}, {offset}+{len}) exceeds vector of size {size}")]
    ViewOutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },
}

pub type LinalgResult<T> = Result<T, LinalgError>;
