//! Implementation of the Levenberg-Marquardt algorithm.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use std::fmt;
use tracing::{debug, warn};

use crate::error::{Result, SansError};
use crate::problem::Problem;
use crate::utils::linalg::solve_damped;
use crate::utils::matrix_convert::{
    faer_to_nalgebra, faer_vec_to_nalgebra, nalgebra_vec_to_ndarray, ndarray_to_faer,
    ndarray_vec_to_faer,
};

use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::trust_region::TrustRegion;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted iterations
    pub iterations: usize,

    /// Number of residual evaluations, including those spent on the Jacobian
    pub func_evals: usize,

    /// How the run terminated
    pub status: ConvergenceStatus,

    /// Whether the optimization converged
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// The Jacobian matrix at the solution (if requested)
    pub jacobian: Option<Array2<f64>>,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for relative change in the cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for relative change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for the gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set whether to calculate and return the Jacobian at the solution.
    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.config.calc_jacobian = calc_jacobian;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// A run that stops without converging still returns `Ok`; inspect
    /// [`LmResult::status`] to tell the cases apart. Errors are reserved for
    /// invalid input and failing residual evaluations.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(SansError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }
        if n_params == 0 {
            return Err(SansError::InvalidInput(
                "no free parameters to optimize".to_string(),
            ));
        }

        let jacobian_evals = if problem.has_custom_jacobian() { 0 } else { n_params };
        let criteria = ConvergenceCriteria::from(&self.config);
        let mut trust = TrustRegion::from_config(&self.config);

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;
        if residuals.len() != problem.residual_count() {
            return Err(SansError::DimensionMismatch(format!(
                "Expected {} residuals, got {}",
                problem.residual_count(),
                residuals.len()
            )));
        }
        let mut cost = sum_of_squares(&residuals);
        if !cost.is_finite() {
            return Err(SansError::FunctionEvaluation(
                "non-finite cost at the initial parameters".to_string(),
            ));
        }

        let mut jacobian = problem.jacobian(&params)?;
        func_evals += jacobian_evals;
        let mut iterations = 0;
        let mut status = ConvergenceStatus::Running;

        while status == ConvergenceStatus::Running {
            if cost == 0.0 {
                status = ConvergenceStatus::FunctionValueConvergence;
                break;
            }
            if iterations >= self.config.max_iterations {
                status = ConvergenceStatus::MaxIterationsReached;
                break;
            }

            let (jtj, gradient) = normal_equations(&jacobian, &residuals)?;
            if gradient.amax() < self.config.gtol {
                status = ConvergenceStatus::GradientConvergence;
                break;
            }

            loop {
                let step = match solve_damped(&jtj, &gradient, trust.lambda) {
                    Some(step) if step.iter().all(|v| v.is_finite()) => step,
                    _ => {
                        if trust.is_saturated() {
                            status = ConvergenceStatus::NumericalError;
                            break;
                        }
                        trust.increase();
                        continue;
                    }
                };

                let new_params = &params + &nalgebra_vec_to_ndarray(&step)?;
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;
                let new_cost = sum_of_squares(&new_residuals);

                let predicted = TrustRegion::predicted_reduction(&step, &gradient, &jtj);
                let rho = TrustRegion::gain_ratio(cost, new_cost, predicted);
                let relative_step = ConvergenceCriteria::relative_step(&params, &new_params);

                if trust.update_lambda(rho) {
                    iterations += 1;
                    status = criteria.check(&params, &new_params, cost, new_cost, iterations);
                    debug!(iteration = iterations, cost = new_cost, lambda = trust.lambda, "accepted step");

                    params = new_params;
                    residuals = new_residuals;
                    cost = new_cost;
                    if status == ConvergenceStatus::Running {
                        jacobian = problem.jacobian(&params)?;
                        func_evals += jacobian_evals;
                    }
                    break;
                }

                // A rejected step this small means the iterate can no longer move.
                if relative_step < self.config.xtol {
                    status = ConvergenceStatus::ParameterConvergence;
                    break;
                }
                if trust.is_saturated() {
                    status = ConvergenceStatus::LambdaSaturated;
                    break;
                }
            }
        }

        let success = status.is_converged();
        if !success {
            warn!(status = ?status, iterations, cost, "Levenberg-Marquardt did not converge");
        }

        let jacobian = if self.config.calc_jacobian {
            Some(problem.jacobian(&params)?)
        } else {
            None
        };

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            status,
            success,
            message: status.description().to_string(),
            jacobian,
        })
    }
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// Form `JᵀJ` and `g = Jᵀr` with faer products.
fn normal_equations(
    jacobian: &Array2<f64>,
    residuals: &Array1<f64>,
) -> Result<(DMatrix<f64>, DVector<f64>)> {
    let j = ndarray_to_faer(jacobian)?;
    let r = ndarray_vec_to_faer(residuals)?;

    let jtj = j.transpose() * &j;
    let g = j.transpose() * &r;

    Ok((faer_to_nalgebra(&jtj)?, faer_vec_to_nalgebra(&g)?))
}
