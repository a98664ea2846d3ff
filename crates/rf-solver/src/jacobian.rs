//! Finite difference Jacobian computation.

use rf_linalg::Matrix;

use crate::error::{SolverError, SolverResult};

/// Default perturbation for forward differences.
pub const FD_STEP: f64 = 1e-10;

/// Fill `jac` with the forward-difference Jacobian of `f` at `x`.
///
/// `f_base` must hold `f(x)`. For each column `j`, `x[j]` is perturbed by
/// `step`, `f` is evaluated into `f_trial`, and `x[j]` is restored to its
/// exact original value before the next column. Costs exactly `x.len()`
/// evaluations of `f`.
pub fn forward_difference_jacobian<F>(
    x: &mut [f64],
    f_base: &[f64],
    f: &mut F,
    step: f64,
    jac: &mut Matrix,
    f_trial: &mut [f64],
) -> SolverResult<()>
where
    F: FnMut(&[f64], &mut [f64]) -> SolverResult<()>,
{
    let n = x.len();
    let m = f_base.len();
    if jac.nrows() != m || jac.ncols() != n {
        return Err(SolverError::Dimension {
            what: "jacobian",
            expected: m * n,
            actual: jac.nrows() * jac.ncols(),
        });
    }
    if f_trial.len() != m {
        return Err(SolverError::Dimension {
            what: "trial residual",
            expected: m,
            actual: f_trial.len(),
        });
    }

    for j in 0..n {
        let original = x[j];
        x[j] = original + step;
        let evaluated = f(x, f_trial);
        x[j] = original;
        evaluated?;

        for i in 0..m {
            jac.set(i, j, (f_trial[i] - f_base[i]) / step);
        }
    }

    Ok(())
}
