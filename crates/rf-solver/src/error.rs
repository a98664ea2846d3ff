//! Error types for solver operations.

use rf_linalg::LinalgError;
use rf_network::NetworkError;
use thiserror::Error;

/// Errors that can occur while solving a network.
///
/// Hitting the Newton iteration cap is *not* an error at the `MultiRoot`
/// level (see `MultiRootReport::converged`); it only becomes
/// `NotConverged` where a caller requires convergence, e.g. static
/// re-convergence nested inside a time step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Dimension mismatch: {what} (expected={expected}, actual={actual})")]
    Dimension {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Convergence failed after {iterations} iterations (residual = {residual})")]
    NotConverged { iterations: usize, residual: f64 },

    #[error("Non-finite residual at iteration {iteration}")]
    NonFiniteResidual { iteration: usize },

    #[error("Partition built at revision {built} but circuit is at revision {current}")]
    StalePartition { built: u64, current: u64 },

    #[error("Linear algebra error: {0}")]
    Linalg(#[from] LinalgError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    /// The Newton step hit a singular Jacobian: the problem is ill-posed at
    /// the current state, more iterations will not help.
    pub fn is_singular(&self) -> bool {
        matches!(self, SolverError::Linalg(LinalgError::Singular { .. }))
    }

    /// Failures that a smaller time step may cure.
    pub fn is_convergence_failure(&self) -> bool {
        matches!(
            self,
            SolverError::NotConverged { .. } | SolverError::NonFiniteResidual { .. }
        )
    }
}
