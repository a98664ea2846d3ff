//! Time integrators for the dynamic (capacitive) unknowns.
//!
//! An integrator advances `y' = f(t, y)` by one step. It must leave `y`
//! untouched when it fails, so callers can retry with a smaller step.
//!
//! A system may also carry algebraic unknowns `z` constrained by
//! `g(t, y, z) = 0`. Its `rhs` solves them internally; implicit integrators
//! instead solve them together with the step through `coupled_rhs`, so the
//! coupling between `y` and `z` shows up in their Jacobian.

use std::fmt;

use rf_linalg::Vector;

use crate::error::{SolverError, SolverResult};
use crate::multiroot::{MultiRoot, MultiRootConfig};

/// A system of first-order ODEs.
pub trait OdeSystem {
    fn dimension(&self) -> usize;

    /// Compute `dydt = f(t, y)`.
    ///
    /// Takes `&mut self` so systems can write trial states into a model or
    /// warm-start nested solves.
    fn rhs(&mut self, t: f64, y: &[f64], dydt: &mut [f64]) -> SolverResult<()>;

    /// Current algebraic unknowns `z`. Empty for a pure ODE.
    fn algebraic(&self) -> &[f64] {
        &[]
    }

    /// Compute `dydt = f(t, y, z)` and `g = g(t, y, z)` at a trial `z`,
    /// without solving for it.
    fn coupled_rhs(
        &mut self,
        t: f64,
        y: &[f64],
        _z: &[f64],
        dydt: &mut [f64],
        _g: &mut [f64],
    ) -> SolverResult<()> {
        self.rhs(t, y, dydt)
    }

    /// Adopt `z`, solved by an integrator together with `y`.
    fn set_algebraic(&mut self, _z: &[f64]) {}
}

/// Adapter turning a closure into an `OdeSystem`.
pub struct FnSystem<F> {
    dimension: usize,
    f: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(f64, &[f64], &mut [f64]) -> SolverResult<()>,
{
    pub fn new(dimension: usize, f: F) -> Self {
        Self { dimension, f }
    }
}

impl<F> OdeSystem for FnSystem<F>
where
    F: FnMut(f64, &[f64], &mut [f64]) -> SolverResult<()>,
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn rhs(&mut self, t: f64, y: &[f64], dydt: &mut [f64]) -> SolverResult<()> {
        (self.f)(t, y, dydt)
    }
}

/// Outcome of one successful step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Nonlinear iterations used (0 for explicit methods)
    pub iterations: usize,
    /// Calls to `OdeSystem::rhs`
    pub evaluations: usize,
}

/// One-step time integrator.
pub trait Integrator: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Advance `y` from `t` to `t + dt`.
    fn step(
        &mut self,
        system: &mut dyn OdeSystem,
        t: f64,
        y: &mut [f64],
        dt: f64,
    ) -> SolverResult<StepReport>;
}

/// Integrator selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntegratorKind {
    /// Explicit Euler (1st-order, 1 rhs call per step).
    ForwardEuler,
    /// Classical Runge-Kutta (4th-order, 4 rhs calls per step).
    Rk4,
    /// Implicit Euler solved with Newton; stable for stiff capacitive networks.
    #[default]
    BackwardEuler,
}

impl IntegratorKind {
    /// Build an integrator with scratch space for `dimension` states and
    /// `algebraic` algebraic unknowns. Explicit methods ignore the latter.
    pub fn build(
        self,
        dimension: usize,
        algebraic: usize,
        newton: MultiRootConfig,
    ) -> Box<dyn Integrator> {
        match self {
            IntegratorKind::ForwardEuler => Box::new(ForwardEuler::new(dimension)),
            IntegratorKind::Rk4 => Box::new(Rk4::new(dimension)),
            IntegratorKind::BackwardEuler => {
                Box::new(BackwardEuler::coupled(dimension, algebraic, newton))
            }
        }
    }
}

fn check_dimension(system: &dyn OdeSystem, y: &[f64], scratch: usize) -> SolverResult<()> {
    for actual in [system.dimension(), y.len()] {
        if actual != scratch {
            return Err(SolverError::Dimension {
                what: "integrator state",
                expected: scratch,
                actual,
            });
        }
    }
    Ok(())
}

/// Forward Euler: `y1 = y0 + dt f(t, y0)`.
#[derive(Clone, Debug)]
pub struct ForwardEuler {
    k: Vector,
}

impl ForwardEuler {
    pub fn new(dimension: usize) -> Self {
        Self {
            k: Vector::zeros(dimension),
        }
    }
}

impl Integrator for ForwardEuler {
    fn name(&self) -> &'static str {
        "forward-euler"
    }

    fn step(
        &mut self,
        system: &mut dyn OdeSystem,
        t: f64,
        y: &mut [f64],
        dt: f64,
    ) -> SolverResult<StepReport> {
        check_dimension(system, y, self.k.len())?;
        system.rhs(t, y, &mut self.k)?;
        for (yi, ki) in y.iter_mut().zip(self.k.iter()) {
            *yi += dt * ki;
        }
        Ok(StepReport {
            iterations: 0,
            evaluations: 1,
        })
    }
}

/// Classical RK4 (Runge-Kutta 4th order).
#[derive(Clone, Debug)]
pub struct Rk4 {
    k1: Vector,
    k2: Vector,
    k3: Vector,
    k4: Vector,
    tmp: Vector,
}

impl Rk4 {
    pub fn new(dimension: usize) -> Self {
        Self {
            k1: Vector::zeros(dimension),
            k2: Vector::zeros(dimension),
            k3: Vector::zeros(dimension),
            k4: Vector::zeros(dimension),
            tmp: Vector::zeros(dimension),
        }
    }

    fn stage(tmp: &mut [f64], y: &[f64], k: &[f64], h: f64) {
        for ((t, yi), ki) in tmp.iter_mut().zip(y).zip(k) {
            *t = yi + h * ki;
        }
    }
}

impl Integrator for Rk4 {
    fn name(&self) -> &'static str {
        "rk4"
    }

    fn step(
        &mut self,
        system: &mut dyn OdeSystem,
        t: f64,
        y: &mut [f64],
        dt: f64,
    ) -> SolverResult<StepReport> {
        check_dimension(system, y, self.tmp.len())?;

        system.rhs(t, y, &mut self.k1)?;

        Self::stage(&mut self.tmp, y, &self.k1, 0.5 * dt);
        system.rhs(t + 0.5 * dt, &self.tmp, &mut self.k2)?;

        Self::stage(&mut self.tmp, y, &self.k2, 0.5 * dt);
        system.rhs(t + 0.5 * dt, &self.tmp, &mut self.k3)?;

        Self::stage(&mut self.tmp, y, &self.k3, dt);
        system.rhs(t + dt, &self.tmp, &mut self.k4)?;

        // y_new = y + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        for i in 0..y.len() {
            y[i] += dt / 6.0 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }

        Ok(StepReport {
            iterations: 0,
            evaluations: 4,
        })
    }
}

/// Backward Euler: solve `y1 - y0 - dt f(t + dt, y1, z1) = 0` together
/// with `g(t + dt, y1, z1) = 0` for `[y1, z1]`.
#[derive(Clone, Debug)]
pub struct BackwardEuler {
    newton: MultiRoot,
    y0: Vector,
    /// `[y1..., z1...]`
    w: Vector,
    k: Vector,
}

impl BackwardEuler {
    pub fn new(dimension: usize, newton: MultiRootConfig) -> Self {
        Self::coupled(dimension, 0, newton)
    }

    pub fn coupled(dimension: usize, algebraic: usize, newton: MultiRootConfig) -> Self {
        Self {
            newton: MultiRoot::new(dimension + algebraic, newton),
            y0: Vector::zeros(dimension),
            w: Vector::zeros(dimension + algebraic),
            k: Vector::zeros(dimension),
        }
    }
}

impl Integrator for BackwardEuler {
    fn name(&self) -> &'static str {
        "backward-euler"
    }

    fn step(
        &mut self,
        system: &mut dyn OdeSystem,
        t: f64,
        y: &mut [f64],
        dt: f64,
    ) -> SolverResult<StepReport> {
        let n = self.y0.len();
        check_dimension(system, y, n)?;
        let z = system.algebraic();
        if z.len() != self.w.len() - n {
            return Err(SolverError::Dimension {
                what: "algebraic state",
                expected: self.w.len() - n,
                actual: z.len(),
            });
        }
        self.w[n..].copy_from_slice(z);
        self.w[..n].copy_from_slice(y);
        self.y0.copy_from(y)?;

        let Self { newton, y0, w, k } = self;
        let mut evaluations = 0;
        let report = newton.solve(w, |trial, residual| {
            evaluations += 1;
            let (ty, tz) = trial.split_at(n);
            let (ry, rz) = residual.split_at_mut(n);
            system.coupled_rhs(t + dt, ty, tz, k, rz)?;
            for i in 0..n {
                ry[i] = ty[i] - y0[i] - dt * k[i];
            }
            Ok(())
        })?;

        if !report.converged() {
            return Err(SolverError::NotConverged {
                iterations: report.iterations,
                residual: report.residual_norm,
            });
        }

        y.copy_from_slice(&w[..n]);
        system.set_algebraic(&w[n..]);
        Ok(StepReport {
            iterations: report.iterations,
            evaluations,
        })
    }
}
