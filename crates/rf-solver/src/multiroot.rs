//! Newton-Raphson root finder for small dense systems.

use rf_linalg::{Matrix, Vector, l1_norm};
use tracing::{debug, warn};

use crate::error::{SolverError, SolverResult};
use crate::jacobian::{FD_STEP, forward_difference_jacobian};

/// Newton solver configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiRootConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Stop when the L1 norm of the residual drops below this
    pub abs_tol: f64,
    /// Stop when the L1 norm of the Newton step drops below this
    pub rel_tol: f64,
    /// Forward-difference perturbation
    pub fd_step: f64,
}

impl Default for MultiRootConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-6,
            rel_tol: 1e-9,
            fd_step: FD_STEP,
        }
    }
}

impl MultiRootConfig {
    pub fn validate(&self) -> SolverResult<()> {
        if self.max_iterations == 0 {
            return Err(SolverError::InvalidConfig {
                what: "max_iterations must be positive",
            });
        }
        if !(self.abs_tol >= 0.0 && self.rel_tol >= 0.0) {
            return Err(SolverError::InvalidConfig {
                what: "tolerances must be non-negative",
            });
        }
        if !(self.fd_step > 0.0 && self.fd_step.is_finite()) {
            return Err(SolverError::InvalidConfig {
                what: "fd_step must be positive",
            });
        }
        Ok(())
    }
}

/// Why the iteration stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Residual L1 norm below `abs_tol`.
    Residual,
    /// Newton step L1 norm below `rel_tol`.
    Step,
    /// `max_iterations` used without meeting either test.
    IterationCap,
}

/// Newton iteration result. The solution itself is left in the caller's `x`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MultiRootReport {
    /// Iterations actually used
    pub iterations: usize,
    /// Residual L1 norm at the start of the last iteration
    pub residual_norm: f64,
    /// L1 norm of the last Newton step (0 if none was taken)
    pub step_norm: f64,
    pub stop: StopReason,
}

impl MultiRootReport {
    pub fn converged(&self) -> bool {
        self.stop != StopReason::IterationCap
    }
}

/// Newton-Raphson solver with a forward-difference Jacobian.
///
/// Scratch buffers (Jacobian, residuals, step) are sized once here and
/// reused by every `solve`; they carry no state between calls.
#[derive(Clone, Debug)]
pub struct MultiRoot {
    config: MultiRootConfig,
    jacobian: Matrix,
    f_base: Vector,
    f_trial: Vector,
    step: Vector,
}

impl MultiRoot {
    pub fn new(dimension: usize, config: MultiRootConfig) -> Self {
        Self {
            config,
            jacobian: Matrix::square(dimension),
            f_base: Vector::zeros(dimension),
            f_trial: Vector::zeros(dimension),
            step: Vector::zeros(dimension),
        }
    }

    pub fn dimension(&self) -> usize {
        self.f_base.len()
    }

    pub fn config(&self) -> &MultiRootConfig {
        &self.config
    }

    /// Drive `f(x)` to zero, starting from and updating `x` in place.
    ///
    /// Each iteration evaluates `f` once at `x`, builds the Jacobian with
    /// `n` more evaluations, stops if the residual is small, otherwise
    /// LU-solves `J dx = -f`, applies the step and stops if the step is
    /// small. A singular Jacobian aborts with `SolverError::Linalg`;
    /// exhausting the cap is reported through `StopReason::IterationCap`.
    pub fn solve<F>(&mut self, x: &mut [f64], mut f: F) -> SolverResult<MultiRootReport>
    where
        F: FnMut(&[f64], &mut [f64]) -> SolverResult<()>,
    {
        let n = self.dimension();
        if x.len() != n {
            return Err(SolverError::Dimension {
                what: "newton unknowns",
                expected: n,
                actual: x.len(),
            });
        }
        if n == 0 {
            return Ok(MultiRootReport {
                iterations: 0,
                residual_norm: 0.0,
                step_norm: 0.0,
                stop: StopReason::Residual,
            });
        }

        let cfg = &self.config;
        let mut residual_norm = f64::INFINITY;
        let mut step_norm = 0.0;

        for iteration in 1..=cfg.max_iterations {
            f(x, self.f_base.as_mut_slice())?;
            forward_difference_jacobian(
                x,
                &self.f_base,
                &mut f,
                cfg.fd_step,
                &mut self.jacobian,
                &mut self.f_trial,
            )?;

            residual_norm = l1_norm(&self.f_base);
            if !residual_norm.is_finite() {
                return Err(SolverError::NonFiniteResidual { iteration });
            }
            if residual_norm < cfg.abs_tol {
                debug!(iteration, residual_norm, "newton converged on residual");
                return Ok(MultiRootReport {
                    iterations: iteration,
                    residual_norm,
                    step_norm,
                    stop: StopReason::Residual,
                });
            }

            self.jacobian.lu_decompose()?;
            for (s, r) in self.step.iter_mut().zip(self.f_base.iter()) {
                *s = -r;
            }
            self.jacobian.lu_solve(&mut self.step)?;

            for (xi, dx) in x.iter_mut().zip(self.step.iter()) {
                *xi += dx;
            }
            step_norm = l1_norm(&self.step);
            debug!(iteration, residual_norm, step_norm, "newton iteration");

            if step_norm < cfg.rel_tol {
                return Ok(MultiRootReport {
                    iterations: iteration,
                    residual_norm,
                    step_norm,
                    stop: StopReason::Step,
                });
            }
        }

        warn!(
            max_iterations = cfg.max_iterations,
            residual_norm, "newton hit iteration cap"
        );
        Ok(MultiRootReport {
            iterations: cfg.max_iterations,
            residual_norm,
            step_norm,
            stop: StopReason::IterationCap,
        })
    }
}
