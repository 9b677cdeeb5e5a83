//! Dense linear algebra on nalgebra matrices.

use crate::error::{Result, SansError};
use nalgebra::{DMatrix, DVector};

/// Floor applied to the diagonal scaling of the damped normal equations.
const MIN_DIAGONAL_SCALE: f64 = 1e-12;

/// Relative singular value cutoff, scaled by `max(rows, cols) * max(sigma)`.
fn svd_cutoff(singular_values: &DVector<f64>, rows: usize, cols: usize) -> f64 {
    singular_values.max() * rows.max(cols) as f64 * f64::EPSILON
}

/// Solve the damped normal equations `(JᵀJ + λ D) δ = -g`.
///
/// `D` is the diagonal of `JᵀJ` (Marquardt scaling), floored so parameters
/// with a vanishing column still receive some damping. Tries Cholesky first and
/// falls back to LU; returns `None` when both fail.
pub fn solve_damped(jtj: &DMatrix<f64>, gradient: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let mut a = jtj.clone();
    for i in 0..a.nrows() {
        a[(i, i)] += lambda * jtj[(i, i)].max(MIN_DIAGONAL_SCALE);
    }
    let rhs = -gradient.clone();

    if let Some(chol) = a.clone().cholesky() {
        return Some(chol.solve(&rhs));
    }
    a.lu().solve(&rhs)
}

/// Minimum-norm least-squares solution of `A x = b` through an SVD.
pub fn lstsq_svd(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    if a.nrows() != b.len() {
        return Err(SansError::DimensionMismatch(format!(
            "Design matrix has {} rows, right-hand side has {}",
            a.nrows(),
            b.len()
        )));
    }
    let (rows, cols) = a.shape();
    let svd = a.clone().svd(true, true);
    let eps = svd_cutoff(&svd.singular_values, rows, cols);
    svd.solve(b, eps)
        .map_err(|e| SansError::LinearAlgebra(e.to_string()))
}

/// Moore-Penrose pseudo-inverse.
pub fn pseudo_inverse(m: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let (rows, cols) = m.shape();
    let svd = m.clone().svd(true, true);
    let eps = svd_cutoff(&svd.singular_values, rows, cols);
    svd.pseudo_inverse(eps)
        .map_err(|e| SansError::LinearAlgebra(e.to_string()))
}

/// Inverse of a symmetric positive definite matrix, `None` if singular.
pub fn invert_symmetric(m: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    match m.clone().cholesky() {
        Some(chol) => Some(chol.inverse()),
        None => m.clone().try_inverse(),
    }
}
