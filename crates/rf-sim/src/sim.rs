//! Simulation runner and result recording.

use rf_network::Circuit;
use rf_solver::{CircuitSolver, SolverError};
use tracing::{debug, warn};

use crate::error::{SimError, SimResult};

/// Remaining time below which the run counts as finished.
const TIME_EPS: f64 = 1e-12;

/// Options for simulation runs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimOptions {
    /// Nominal time step
    pub dt: f64,
    /// Final simulation time
    pub t_end: f64,
    /// Maximum number of accepted steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
    /// Smallest step a cutback may produce
    pub min_dt: f64,
    /// Cutbacks allowed per step
    pub max_retries: usize,
    /// Step multiplier on a retryable failure, in (0, 1)
    pub cutback_factor: f64,
    /// Step multiplier after a cut-back step succeeds, >= 1
    pub grow_factor: f64,
    /// Also cut back on a singular Jacobian
    pub retry_singular: bool,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1e-3,
            t_end: 1.0,
            max_steps: 100_000,
            record_every: 10,
            min_dt: 1e-9,
            max_retries: 8,
            cutback_factor: 0.5,
            grow_factor: 2.0,
            retry_singular: false,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if !(self.t_end >= 0.0 && self.t_end.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "t_end must be non-negative",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        if !(self.min_dt > 0.0 && self.min_dt <= self.dt) {
            return Err(SimError::InvalidArg {
                what: "min_dt must be in (0, dt]",
            });
        }
        if !(self.cutback_factor > 0.0 && self.cutback_factor < 1.0) {
            return Err(SimError::InvalidArg {
                what: "cutback_factor must be in (0, 1)",
            });
        }
        if !(self.grow_factor >= 1.0 && self.grow_factor.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "grow_factor must be >= 1",
            });
        }
        Ok(())
    }

    fn is_retryable(&self, err: &SolverError) -> bool {
        err.is_convergence_failure() || (self.retry_singular && err.is_singular())
    }
}

/// Record of simulation results.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Time points
    pub t: Vec<f64>,
    /// Potentials of every node, indexed by node id, at each time point
    pub potentials: Vec<Vec<f64>>,
    /// Accepted steps
    pub steps: usize,
    /// Cutbacks taken over the whole run
    pub retries: usize,
}

impl SimRecord {
    fn push(&mut self, t: f64, circuit: &Circuit) {
        self.t.push(t);
        self.potentials.push(circuit.potentials());
    }
}

/// Run a transient simulation from the solver's clock to `opts.t_end`.
///
/// `inputs(t, circuit)` is called once before each step with the step's
/// start time; use it to drive boundary potentials and external flows.
/// A step that fails with a retryable error is retried with
/// `dt * cutback_factor` until it succeeds, `min_dt` is reached or
/// `max_retries` is exhausted. After a cut-back step succeeds the step grows
/// back by `grow_factor`, never beyond `opts.dt`.
pub fn run_sim<F>(
    circuit: &mut Circuit,
    solver: &mut CircuitSolver,
    opts: &SimOptions,
    mut inputs: F,
) -> SimResult<SimRecord>
where
    F: FnMut(f64, &mut Circuit),
{
    opts.validate()?;

    let mut t = solver.time();
    let mut dt = opts.dt;
    let mut record = SimRecord::default();
    record.push(t, circuit);

    while opts.t_end - t > TIME_EPS && record.steps < opts.max_steps {
        inputs(t, circuit);

        let mut h = dt.min(opts.t_end - t);
        let mut retries = 0;
        loop {
            solver.set_time_step(h)?;
            match solver.solve(circuit) {
                Ok(_) => break,
                Err(err) => {
                    let next = h * opts.cutback_factor;
                    if !opts.is_retryable(&err) || retries >= opts.max_retries || next < opts.min_dt
                    {
                        return Err(SimError::StepFailed {
                            t,
                            dt: h,
                            retries,
                            source: err,
                        });
                    }
                    warn!(t, dt = h, next_dt = next, %err, "cutting back time step");
                    h = next;
                    retries += 1;
                }
            }
        }

        t += h;
        record.steps += 1;
        record.retries += retries;
        if h < dt {
            dt = (h * opts.grow_factor).min(opts.dt);
        }

        if record.steps % opts.record_every == 0 {
            record.push(t, circuit);
        }
    }

    // Always record final state
    if record.steps % opts.record_every != 0 {
        record.push(t, circuit);
    }

    debug!(t, steps = record.steps, retries = record.retries, "simulation finished");
    Ok(record)
}
