//! Error types for simulation runs.

use rf_solver::SolverError;
use thiserror::Error;

/// Errors encountered during a transient run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Step at t = {t} failed with dt = {dt} after {retries} retries: {source}")]
    StepFailed {
        t: f64,
        dt: f64,
        retries: usize,
        #[source]
        source: SolverError,
    },

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// The solver error behind a failed step, if any.
    pub fn solver_error(&self) -> Option<&SolverError> {
        match self {
            SimError::StepFailed { source, .. } => Some(source),
            SimError::Solver(err) => Some(err),
            SimError::InvalidArg { .. } => None,
        }
    }
}
