//! Least-squares problem definition.
//!
//! A [`Problem`] maps a vector of free parameters to a vector of weighted
//! residuals. The curve-fit engine implements it over a Q-window; the solver
//! in [`crate::lm`] only ever sees this trait.

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A nonlinear least-squares problem.
pub trait Problem {
    /// Evaluate the residual vector at `params`.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Number of free parameters.
    fn parameter_count(&self) -> usize;

    /// Number of residuals returned by [`Problem::eval`].
    fn residual_count(&self) -> usize;

    /// Jacobian of the residuals, `J[i, j] = d r_i / d p_j`.
    ///
    /// The default uses forward finite differences with a step scaled to
    /// each parameter's magnitude.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Whether [`Problem::jacobian`] is analytical.
    fn has_custom_jacobian(&self) -> bool {
        false
    }

    /// Sum of squared residuals.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SansError;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// Guinier-like decay I = a * exp(-b * q^2) against fixed data.
    struct GuinierDecay {
        q: Array1<f64>,
        i: Array1<f64>,
    }

    impl Problem for GuinierDecay {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            if params.len() != 2 {
                return Err(SansError::DimensionMismatch(format!(
                    "Expected 2 parameters, got {}",
                    params.len()
                )));
            }
            Ok(self
                .q
                .iter()
                .zip(self.i.iter())
                .map(|(q, i)| i - params[0] * (-params[1] * q * q).exp())
                .collect())
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            self.q.len()
        }
    }

    fn decay() -> GuinierDecay {
        let q = array![0.01, 0.02, 0.03, 0.04];
        let i = q.mapv(|q: f64| 3.0 * (-100.0 * q * q).exp());
        GuinierDecay { q, i }
    }

    #[test]
    fn test_cost_is_zero_at_truth() {
        let problem = decay();
        let cost = problem.eval_cost(&array![3.0, 100.0]).unwrap();
        assert_relative_eq!(cost, 0.0, epsilon = 1e-20);
        assert!(problem.eval_cost(&array![2.0, 100.0]).unwrap() > 0.0);
    }

    #[test]
    fn test_default_jacobian_matches_analytic() {
        let problem = decay();
        let p = array![3.0, 100.0];
        let jac = problem.jacobian(&p).unwrap();
        assert_eq!(jac.shape(), &[4, 2]);
        for (k, q) in problem.q.iter().enumerate() {
            let e = (-p[1] * q * q).exp();
            assert_relative_eq!(jac[[k, 0]], -e, epsilon = 1e-6);
            assert_relative_eq!(jac[[k, 1]], p[0] * q * q * e, epsilon = 1e-6);
        }
        assert!(!problem.has_custom_jacobian());
    }

    #[test]
    fn test_parameter_mismatch() {
        let problem = decay();
        assert!(problem.eval(&array![1.0]).is_err());
    }
}
