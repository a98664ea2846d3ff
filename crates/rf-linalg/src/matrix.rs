//! Dense square matrix with in-place LU decomposition.

use std::ops::{Index, IndexMut};

use nalgebra::DMatrix;

use crate::error::{LinalgError, LinalgResult};

/// Pivots smaller than `PIVOT_RTOL * max|a_ij|` are treated as zero.
const PIVOT_RTOL: f64 = 1e-13;

/// Dense matrix.
///
/// After [`Matrix::lu_decompose`] the storage holds the packed factors
/// (unit-diagonal `L` below the diagonal, `U` on and above it) and the row
/// permutation is kept alongside. Any element write discards the
/// factorization.
#[derive(Clone, Debug)]
pub struct Matrix {
    data: DMatrix<f64>,
    /// `perm[i]` = original row now at position `i`.
    perm: Vec<usize>,
    factored: bool,
    work: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: DMatrix::zeros(rows, cols),
            perm: (0..rows).collect(),
            factored: false,
            work: vec![0.0; rows],
        }
    }

    pub fn square(n: usize) -> Self {
        Self::zeros(n, n)
    }

    /// Build from row-major values.
    pub fn from_row_slice(rows: usize, cols: usize, values: &[f64]) -> LinalgResult<Self> {
        if values.len() != rows * cols {
            return Err(LinalgError::DimensionMismatch {
                expected: rows * cols,
                actual: values.len(),
            });
        }
        let mut m = Self::zeros(rows, cols);
        m.data = DMatrix::from_row_slice(rows, cols, values);
        Ok(m)
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.factored = false;
        self.data[(row, col)] = value;
    }

    pub fn fill(&mut self, value: f64) {
        self.factored = false;
        self.data.fill(value);
    }

    pub fn is_factored(&self) -> bool {
        self.factored
    }

    /// LU-decompose in place with partial pivoting.
    ///
    /// Fails with [`LinalgError::Singular`] when a column has no pivot above
    /// the relative threshold; the matrix contents are then unspecified.
    pub fn lu_decompose(&mut self) -> LinalgResult<()> {
        let n = self.nrows();
        if n != self.ncols() {
            return Err(LinalgError::NotSquare {
                rows: n,
                cols: self.ncols(),
            });
        }

        self.factored = false;
        self.perm.clear();
        self.perm.extend(0..n);
        self.work.resize(n, 0.0);

        let scale = self.data.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let threshold = PIVOT_RTOL * scale;

        for k in 0..n {
            let mut max_val = self.data[(k, k)].abs();
            let mut max_row = k;
            for i in (k + 1)..n {
                let val = self.data[(i, k)].abs();
                if val > max_val {
                    max_val = val;
                    max_row = i;
                }
            }

            if !(max_val > threshold) {
                return Err(LinalgError::Singular { pivot_row: k });
            }

            if max_row != k {
                self.data.swap_rows(k, max_row);
                self.perm.swap(k, max_row);
            }

            let pivot = self.data[(k, k)];
            for i in (k + 1)..n {
                let factor = self.data[(i, k)] / pivot;
                self.data[(i, k)] = factor;
                for j in (k + 1)..n {
                    let ukj = self.data[(k, j)];
                    self.data[(i, j)] -= factor * ukj;
                }
            }
        }

        self.factored = true;
        Ok(())
    }

    /// Solve `A x = b` using the stored factors, overwriting `b` with `x`.
    pub fn lu_solve(&mut self, b: &mut [f64]) -> LinalgResult<()> {
        if !self.factored {
            return Err(LinalgError::NotFactored);
        }
        let n = self.nrows();
        if b.len() != n {
            return Err(LinalgError::DimensionMismatch {
                expected: n,
                actual: b.len(),
            });
        }

        for (i, &row) in self.perm.iter().enumerate() {
            self.work[i] = b[row];
        }

        // L y = P b
        for i in 0..n {
            let mut acc = self.work[i];
            for j in 0..i {
                acc -= self.data[(i, j)] * self.work[j];
            }
            self.work[i] = acc;
        }

        // U x = y
        for i in (0..n).rev() {
            let mut acc = self.work[i];
            for j in (i + 1)..n {
                acc -= self.data[(i, j)] * self.work[j];
            }
            self.work[i] = acc / self.data[(i, i)];
        }

        b.copy_from_slice(&self.work);
        Ok(())
    }

    /// Decompose and solve in one call.
    pub fn solve_in_place(&mut self, b: &mut [f64]) -> LinalgResult<()> {
        self.lu_decompose()?;
        self.lu_solve(b)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, idx: (usize, usize)) -> &f64 {
        &self.data[idx]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, idx: (usize, usize)) -> &mut f64 {
        self.factored = false;
        &mut self.data[idx]
    }
}
