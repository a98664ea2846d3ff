//! Nonlinear and transient solvers for resistive flow networks.
//!
//! The unknowns are node potentials. Non-boundary nodes without capacity are
//! algebraic ("static") unknowns, solved by Newton-Raphson so that their net
//! flow vanishes. Nodes with capacity are ODE ("dynamic") states advanced by
//! a pluggable time integrator, with `d(potential)/dt = net flow / capacity`.

pub mod circuit_solver;
pub mod error;
pub mod integrator;
pub mod jacobian;
pub mod multiroot;
pub mod partition;

pub use circuit_solver::{CircuitSolver, CircuitSolverConfig, SolveReport};
pub use error::{SolverError, SolverResult};
pub use integrator::{
    BackwardEuler, FnSystem, ForwardEuler, Integrator, IntegratorKind, OdeSystem, Rk4, StepReport,
};
pub use multiroot::{MultiRoot, MultiRootConfig, MultiRootReport, StopReason};
pub use partition::Partition;
