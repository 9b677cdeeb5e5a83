//! # Covariance Matrix Calculations
//!
//! Parameter covariance from the Jacobian at a least-squares solution,
//! `covar = scale * inv(JᵀJ)`, and the quantities derived from it.

use ndarray::{Array1, Array2};

use crate::error::Result;
use crate::utils::linalg::invert_symmetric;
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};

/// Calculate the covariance matrix `scale * inv(JᵀJ)`.
///
/// Returns `Ok(None)` when `JᵀJ` is singular or the inverse is not finite;
/// callers decide how to report errors in that case.
///
/// # Arguments
///
/// * `jacobian` - The Jacobian of the weighted residuals at the solution
/// * `scale` - Multiplier applied to the inverse, e.g. the reduced chi-square
pub fn calculate_covariance(jacobian: &Array2<f64>, scale: f64) -> Result<Option<Array2<f64>>> {
    let j = ndarray_to_nalgebra(jacobian)?;
    let jtj = j.transpose() * &j;

    let inverse = match invert_symmetric(&jtj) {
        Some(inv) if inv.iter().all(|v| v.is_finite()) => inv,
        _ => return Ok(None),
    };

    Ok(Some(nalgebra_to_ndarray(&(inverse * scale))?))
}

/// Calculate correlation matrix from covariance matrix.
///
/// `correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])`, with zero where
/// a variance is not positive.
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            return 1.0;
        }
        let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
        if denom > 0.0 {
            covar[[i, j]] / denom
        } else {
            0.0
        }
    })
}

/// Standard errors, `sqrt(covar[i,i])`, or `None` where the variance is not
/// a positive finite number.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Vec<Option<f64>> {
    covar
        .diag()
        .iter()
        .map(|&v| if v.is_finite() && v >= 0.0 { Some(v.sqrt()) } else { None })
        .collect()
}

/// Reduced chi-square, `chisqr / (n_points - n_free)`, if there are spare degrees of freedom.
pub fn reduced_chi_square(chisqr: f64, n_points: usize, n_free: usize) -> Option<f64> {
    if n_points > n_free {
        Some(chisqr / (n_points - n_free) as f64)
    } else {
        None
    }
}

/// Propagate the covariance onto a linear functional `f = Σ a_i p_i`.
pub fn linear_variance(covar: &Array2<f64>, coefficients: &Array1<f64>) -> f64 {
    coefficients.dot(&covar.dot(coefficients))
}
