//! Finite difference Jacobians.

use crate::error::{Result, SansError};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default relative step for finite differences.
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Compute the Jacobian matrix using forward finite differences.
///
/// `J[i, j] = (r_i(p + h_j e_j) - r_i(p)) / h_j` where the step `h_j` is
/// `epsilon * |p_j|`, or `epsilon` itself when the parameter is smaller
/// than `epsilon`.
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The relative step size (defaults to [`DEFAULT_EPSILON`])
///
/// # Returns
///
/// * `Result<Array2<f64>>` - The `residual_count x parameter_count` Jacobian
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let base = problem.eval(params)?;
    let n_residuals = problem.residual_count();

    if base.len() != n_residuals {
        return Err(SansError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            n_residuals,
            base.len()
        )));
    }

    let mut jac = Array2::zeros((n_residuals, params.len()));
    let mut shifted = params.clone();

    for j in 0..params.len() {
        let p = params[j];
        let h = if p.abs() > eps { p.abs() * eps } else { eps };
        shifted[j] = p + h;
        let perturbed = problem.eval(&shifted)?;
        shifted[j] = p;

        jac.column_mut(j)
            .iter_mut()
            .zip(perturbed.iter().zip(base.iter()))
            .for_each(|(d, (rp, r0))| *d = (rp - r0) / h);
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // r1 = x^2 - 1, r2 = y^2 - 2, r3 = x * y
    struct Quadratic;

    impl Problem for Quadratic {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            let (x, y) = (params[0], params[1]);
            Ok(array![x.powi(2) - 1.0, y.powi(2) - 2.0, x * y])
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            3
        }
    }

    struct WrongLength;

    impl Problem for WrongLength {
        fn eval(&self, _params: &Array1<f64>) -> Result<Array1<f64>> {
            Ok(array![1.0])
        }

        fn parameter_count(&self) -> usize {
            1
        }

        fn residual_count(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_jacobian() {
        let jac = jacobian(&Quadratic, &array![2.0, 3.0], None).unwrap();

        assert_eq!(jac.shape(), &[3, 2]);
        assert_relative_eq!(jac[[0, 0]], 4.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[0, 1]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 1]], 6.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[2, 0]], 3.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[2, 1]], 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_jacobian_near_zero_parameter() {
        let jac = jacobian(&Quadratic, &array![0.0, 1e-12], Some(1e-7)).unwrap();
        assert_relative_eq!(jac[[0, 0]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[2, 1]], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_residual_count_checked() {
        assert!(matches!(
            jacobian(&WrongLength, &array![1.0], None),
            Err(SansError::DimensionMismatch(_))
        ));
    }
}
