//! Network solve orchestration.
//!
//! `CircuitSolver` couples the index partition with a `MultiRoot` for the
//! static unknowns and an `Integrator` for the dynamic ones. The circuit's
//! per-node net flow is the shared objective: driven to zero for static
//! nodes, divided by capacity for dynamic nodes.

use rf_linalg::{Vector, VectorViewMut};
use rf_network::Circuit;
use tracing::{debug, warn};

use crate::error::{SolverError, SolverResult};
use crate::integrator::{Integrator, IntegratorKind, OdeSystem};
use crate::multiroot::{MultiRoot, MultiRootConfig};
use crate::partition::{Partition, net_flows, scatter};

/// Orchestrator configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CircuitSolverConfig {
    /// Step taken by each transient `solve`
    pub time_step: f64,
    /// Initial value of the solver clock
    pub start_time: f64,
    pub integrator: IntegratorKind,
    /// Shared by the static solve and implicit integrators
    pub newton: MultiRootConfig,
    /// Fail a transient step when the nested static solve hits its cap
    pub require_static_convergence: bool,
}

impl Default for CircuitSolverConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0,
            start_time: 0.0,
            integrator: IntegratorKind::default(),
            newton: MultiRootConfig::default(),
            require_static_convergence: true,
        }
    }
}

impl CircuitSolverConfig {
    pub fn validate(&self) -> SolverResult<()> {
        check_time_step(self.time_step)?;
        if !self.start_time.is_finite() {
            return Err(SolverError::InvalidConfig {
                what: "start_time must be finite",
            });
        }
        self.newton.validate()
    }
}

fn check_time_step(dt: f64) -> SolverResult<()> {
    if dt > 0.0 && dt.is_finite() {
        Ok(())
    } else {
        Err(SolverError::InvalidConfig {
            what: "time_step must be positive and finite",
        })
    }
}

/// Outcome of one `CircuitSolver::solve`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveReport {
    /// Solver clock after the call
    pub time: f64,
    /// Newton iterations spent on static unknowns, summed over nested solves
    pub static_iterations: usize,
    /// Nonlinear iterations reported by the integrator
    pub integrator_iterations: usize,
    /// False only if a static solve hit its iteration cap and that was allowed
    pub converged: bool,
    /// Static residual L1 norm from the last Newton solve (0 without statics)
    pub residual_norm: f64,
}

impl SolveReport {
    fn idle(time: f64) -> Self {
        Self {
            time,
            static_iterations: 0,
            integrator_iterations: 0,
            converged: true,
            residual_norm: 0.0,
        }
    }
}

/// Solver for a `Circuit`'s node potentials.
///
/// The partition is computed at construction and not tracked afterwards:
/// a topology change (or boundary flag change) makes `solve` fail with
/// `SolverError::StalePartition` until `rebuild` is called.
#[derive(Debug)]
pub struct CircuitSolver {
    config: CircuitSolverConfig,
    partition: Partition,
    /// Sized to the static set; `None` when it is empty
    newton: Option<MultiRoot>,
    /// Sized to the dynamic set; `None` when it is empty
    integrator: Option<Box<dyn Integrator>>,
    /// `[dynamic..., static...]`
    state: Vector,
    saved: Vector,
    deriv: Vector,
    time: f64,
}

impl CircuitSolver {
    pub fn new(circuit: &Circuit, config: CircuitSolverConfig) -> SolverResult<Self> {
        config.validate()?;
        let partition = Partition::from_circuit(circuit);
        let time = config.start_time;
        let mut solver = Self {
            config,
            partition,
            newton: None,
            integrator: None,
            state: Vector::zeros(0),
            saved: Vector::zeros(0),
            deriv: Vector::zeros(0),
            time,
        };
        solver.allocate(circuit)?;
        Ok(solver)
    }

    /// Recompute the partition after topology changes. The clock is kept.
    pub fn rebuild(&mut self, circuit: &Circuit) -> SolverResult<()> {
        self.partition = Partition::from_circuit(circuit);
        self.allocate(circuit)
    }

    fn allocate(&mut self, circuit: &Circuit) -> SolverResult<()> {
        let n_dyn = self.partition.dynamic_count();
        let n_static = self.partition.static_count();

        self.newton = (n_static > 0).then(|| MultiRoot::new(n_static, self.config.newton.clone()));
        self.integrator = (n_dyn > 0).then(|| {
            self.config
                .integrator
                .build(n_dyn, n_static, self.config.newton.clone())
        });
        self.state = Vector::zeros(n_dyn + n_static);
        self.saved = Vector::zeros(n_dyn + n_static);
        self.deriv = Vector::zeros(n_dyn);
        self.partition.gather(circuit, &mut self.state)?;

        debug!(
            boundary = self.partition.boundary().len(),
            dynamic = n_dyn,
            r#static = n_static,
            revision = self.partition.revision(),
            "partitioned circuit"
        );
        Ok(())
    }

    pub fn config(&self) -> &CircuitSolverConfig {
        &self.config
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn time_step(&self) -> f64 {
        self.config.time_step
    }

    pub fn set_time_step(&mut self, dt: f64) -> SolverResult<()> {
        check_time_step(dt)?;
        self.config.time_step = dt;
        Ok(())
    }

    /// Unknown potentials `[dynamic..., static...]` as of the last solve.
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    /// Advance the circuit by one `time_step` if it has dynamic unknowns,
    /// otherwise solve the static unknowns for flow balance.
    ///
    /// Starts from the circuit's current potentials. On error every unknown
    /// potential is restored to its value before the call and the clock is
    /// left unchanged.
    pub fn solve(&mut self, circuit: &mut Circuit) -> SolverResult<SolveReport> {
        if let Err(err) = self.partition.ensure_current(circuit) {
            warn!(%err, "solve refused: partition is stale");
            return Err(err);
        }
        self.partition.gather(circuit, &mut self.state)?;
        self.saved.copy_from(&self.state)?;

        let result = if self.integrator.is_some() {
            self.advance(circuit)
        } else {
            self.settle(circuit)
        };

        if let Err(err) = &result {
            self.rollback(circuit);
            warn!(time = self.time, dt = self.config.time_step, %err, "solve failed, potentials restored");
        }
        result
    }

    /// Static-only solve: one Newton run on flow balance.
    fn settle(&mut self, circuit: &mut Circuit) -> SolverResult<SolveReport> {
        let Some(newton) = self.newton.as_mut() else {
            return Ok(SolveReport::idle(self.time));
        };
        let statics = self.partition.statics();
        let report = newton.solve(&mut self.state, |x, out| {
            scatter(circuit, statics, x);
            net_flows(circuit, statics, out)
        })?;
        scatter(circuit, statics, &self.state);

        if !report.converged() {
            warn!(
                iterations = report.iterations,
                residual = report.residual_norm,
                "static solve did not converge"
            );
        }
        Ok(SolveReport {
            time: self.time,
            static_iterations: report.iterations,
            integrator_iterations: 0,
            converged: report.converged(),
            residual_norm: report.residual_norm,
        })
    }

    /// Transient step of the dynamic unknowns. Explicit integrators
    /// re-converge the statics inside every derivative evaluation; implicit
    /// ones solve them together with the step.
    fn advance(&mut self, circuit: &mut Circuit) -> SolverResult<SolveReport> {
        let Some(integrator) = self.integrator.as_deref_mut() else {
            return Ok(SolveReport::idle(self.time));
        };
        let t = self.time;
        let dt = self.config.time_step;
        let (mut dynamics, statics) = self
            .state
            .split_views_mut(self.partition.dynamic_count())?;

        let mut ode = NetworkOde {
            circuit,
            partition: &self.partition,
            newton: self.newton.as_mut(),
            statics,
            require_static_convergence: self.config.require_static_convergence,
            static_iterations: 0,
            static_converged: true,
            residual_norm: 0.0,
        };
        let step = integrator.step(&mut ode, t, &mut dynamics, dt)?;

        // The last evaluation ran at a trial state; settle the circuit at the
        // accepted one.
        ode.rhs(t + dt, &dynamics, &mut self.deriv)?;

        let report = SolveReport {
            time: t + dt,
            static_iterations: ode.static_iterations,
            integrator_iterations: step.iterations,
            converged: ode.static_converged,
            residual_norm: ode.residual_norm,
        };
        self.time = t + dt;
        debug!(
            time = self.time,
            integrator = integrator.name(),
            iterations = step.iterations,
            evaluations = step.evaluations,
            static_iterations = report.static_iterations,
            "transient step"
        );
        Ok(report)
    }

    fn rollback(&mut self, circuit: &mut Circuit) {
        let n_dyn = self.partition.dynamic_count();
        scatter(circuit, self.partition.dynamics(), &self.saved[..n_dyn]);
        scatter(circuit, self.partition.statics(), &self.saved[n_dyn..]);
        self.state.as_mut_slice().copy_from_slice(&self.saved);
    }
}

/// The dynamic subsystem seen by an integrator.
///
/// Each `rhs` writes the trial dynamic potentials into the circuit,
/// re-converges the static unknowns (warm-started from their last values)
/// and returns `net flow / capacity` per dynamic node. The static
/// potentials are its algebraic unknowns: `coupled_rhs` takes them as given
/// and returns their net flows as the constraint residual.
struct NetworkOde<'a> {
    circuit: &'a mut Circuit,
    partition: &'a Partition,
    newton: Option<&'a mut MultiRoot>,
    statics: VectorViewMut<'a>,
    require_static_convergence: bool,
    static_iterations: usize,
    static_converged: bool,
    residual_norm: f64,
}

impl NetworkOde<'_> {
    fn settle_statics(&mut self) -> SolverResult<()> {
        let Some(newton) = self.newton.as_deref_mut() else {
            return Ok(());
        };
        let partition = self.partition;
        let statics = partition.statics();
        let circuit = &mut *self.circuit;

        let report = newton.solve(&mut self.statics, |x, out| {
            scatter(circuit, statics, x);
            net_flows(circuit, statics, out)
        })?;
        scatter(circuit, statics, &self.statics);

        self.static_iterations += report.iterations;
        self.residual_norm = report.residual_norm;
        if !report.converged() {
            if self.require_static_convergence {
                return Err(SolverError::NotConverged {
                    iterations: report.iterations,
                    residual: report.residual_norm,
                });
            }
            self.static_converged = false;
        }
        Ok(())
    }
}

impl OdeSystem for NetworkOde<'_> {
    fn dimension(&self) -> usize {
        self.partition.dynamic_count()
    }

    fn rhs(&mut self, _t: f64, y: &[f64], dydt: &mut [f64]) -> SolverResult<()> {
        let partition = self.partition;
        scatter(self.circuit, partition.dynamics(), y);
        self.settle_statics()?;
        net_flows(self.circuit, partition.dynamics(), dydt)?;
        for (d, capacity) in dydt.iter_mut().zip(partition.capacities()) {
            *d /= capacity;
        }
        Ok(())
    }

    fn algebraic(&self) -> &[f64] {
        &self.statics
    }

    fn coupled_rhs(
        &mut self,
        _t: f64,
        y: &[f64],
        z: &[f64],
        dydt: &mut [f64],
        g: &mut [f64],
    ) -> SolverResult<()> {
        let partition = self.partition;
        scatter(self.circuit, partition.dynamics(), y);
        scatter(self.circuit, partition.statics(), z);
        net_flows(self.circuit, partition.statics(), g)?;
        net_flows(self.circuit, partition.dynamics(), dydt)?;
        for (d, capacity) in dydt.iter_mut().zip(partition.capacities()) {
            *d /= capacity;
        }
        Ok(())
    }

    fn set_algebraic(&mut self, z: &[f64]) {
        self.statics.copy_from_slice(z);
        scatter(self.circuit, self.partition.statics(), z);
    }
}
