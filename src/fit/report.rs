//! Fit results.

use ndarray::Array2;
use std::fmt;

use crate::lm::ConvergenceStatus;
use crate::uncertainty::reduced_chi_square;

/// Outcome of one curve fit, listed over the free parameters.
#[derive(Debug, Clone)]
pub struct FitReport {
    /// Free parameter names, in model order
    pub names: Vec<String>,

    /// Best-fit values
    pub values: Vec<f64>,

    /// Standard errors, `None` where unavailable
    pub errors: Vec<Option<f64>>,

    /// Unreduced chi-square over the Q window
    pub chi2: f64,

    /// Number of residuals in the Q window
    pub n_points: usize,

    /// Parameter covariance, if `JᵀJ` could be inverted
    pub covariance: Option<Array2<f64>>,

    pub correlation: Option<Array2<f64>>,

    pub status: ConvergenceStatus,

    pub iterations: usize,

    pub func_evals: usize,

    pub message: String,
}

impl FitReport {
    /// Chi-square per degree of freedom, if there are spare points.
    pub fn reduced_chi2(&self) -> Option<f64> {
        reduced_chi_square(self.chi2, self.n_points, self.names.len())
    }

    pub fn converged(&self) -> bool {
        self.status.is_converged()
    }

    /// Value and error of one fitted parameter.
    pub fn get(&self, name: &str) -> Option<(f64, Option<f64>)> {
        let k = self.names.iter().position(|n| n == name)?;
        Some((self.values[k], self.errors[k]))
    }
}

impl fmt::Display for FitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Result:")?;
        writeln!(f, "  Status: {}", self.message)?;
        writeln!(f, "  Chi2: {:.6e} ({} points)", self.chi2, self.n_points)?;
        if let Some(reduced) = self.reduced_chi2() {
            writeln!(f, "  Reduced chi2: {:.6e}", reduced)?;
        }
        writeln!(f, "  Iterations: {} ({} evaluations)", self.iterations, self.func_evals)?;
        for ((name, value), error) in self.names.iter().zip(&self.values).zip(&self.errors) {
            match error {
                Some(err) => writeln!(f, "  {} = {:.6e} +- {:.2e}", name, value, err)?,
                None => writeln!(f, "  {} = {:.6e}", name, value)?,
            }
        }
        Ok(())
    }
}
