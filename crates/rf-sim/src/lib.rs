//! Transient simulation driver for resistive flow networks.
//!
//! Provides:
//! - Repeated `CircuitSolver` steps from the solver clock to a final time
//! - Boundary-input callback applied before each step
//! - Step cutback on retryable solver failures, with regrowth
//! - Decimated recording of node potentials

pub mod error;
pub mod sim;

pub use error::{SimError, SimResult};
pub use sim::{SimOptions, SimRecord, run_sim};
