//! Dense vector and matrix primitives for the network solvers.
//!
//! Storage is backed by `nalgebra`; on top of it this crate adds
//! - aliasing sub-range views (`VectorView`, `VectorViewMut`)
//! - an in-place LU decomposition with partial pivoting that reports
//!   singular systems as a distinct error.

pub mod error;
pub mod matrix;
pub mod vector;

pub use error::{LinalgError, LinalgResult};
pub use matrix::Matrix;
pub use vector::{Vector, VectorView, VectorViewMut, l1_norm};
