//! Damping control for the Levenberg-Marquardt step.
//!
//! The damping parameter shrinks after steps whose actual cost reduction
//! agrees with the linear model's prediction and grows after rejected steps.

use nalgebra::{DMatrix, DVector};

use super::config::LmConfig;

/// Gain-ratio controlled damping parameter.
#[derive(Debug, Clone)]
pub struct TrustRegion {
    /// Current value of the damping parameter
    pub lambda: f64,

    /// Minimum allowed value for the damping parameter
    pub lambda_min: f64,

    /// Maximum allowed value for the damping parameter
    pub lambda_max: f64,

    /// Factor to increase lambda by when a step is rejected
    pub lambda_increase_factor: f64,

    /// Factor to decrease lambda by after a good step
    pub lambda_decrease_factor: f64,

    /// Minimum gain ratio required to accept a step
    pub min_gain_ratio: f64,

    /// Gain ratio above which lambda is decreased
    pub good_gain_ratio: f64,
}

impl Default for TrustRegion {
    fn default() -> Self {
        Self::from_config(&LmConfig::default())
    }
}

impl TrustRegion {
    /// Damping controller seeded from a solver configuration.
    pub fn from_config(config: &LmConfig) -> Self {
        Self {
            lambda: config.initial_lambda,
            lambda_min: config.min_lambda,
            lambda_max: config.max_lambda,
            lambda_increase_factor: config.lambda_up_factor,
            lambda_decrease_factor: config.lambda_down_factor,
            min_gain_ratio: 1e-4,
            good_gain_ratio: 0.25,
        }
    }

    /// Updates lambda from the gain ratio and reports whether the step is accepted.
    pub fn update_lambda(&mut self, gain_ratio: f64) -> bool {
        if gain_ratio > self.min_gain_ratio {
            if gain_ratio > self.good_gain_ratio {
                self.lambda = (self.lambda * self.lambda_decrease_factor).max(self.lambda_min);
            }
            true
        } else {
            self.increase();
            false
        }
    }

    /// Raise lambda after a failed step computation.
    pub fn increase(&mut self) {
        self.lambda = (self.lambda * self.lambda_increase_factor).min(self.lambda_max);
    }

    /// Whether lambda has reached its upper bound.
    pub fn is_saturated(&self) -> bool {
        self.lambda >= self.lambda_max
    }

    /// Cost reduction predicted by the linearized model for `step`.
    ///
    /// With cost `rᵀr` and gradient `g = Jᵀr`, the model cost after the step is
    /// `rᵀr + 2 δᵀg + δᵀ(JᵀJ)δ`.
    pub fn predicted_reduction(step: &DVector<f64>, gradient: &DVector<f64>, jtj: &DMatrix<f64>) -> f64 {
        let curvature = jtj * step;
        -(2.0 * step.dot(gradient) + step.dot(&curvature))
    }

    /// Ratio of actual to predicted cost reduction.
    ///
    /// A non-finite new cost is never accepted.
    pub fn gain_ratio(current_cost: f64, new_cost: f64, predicted_reduction: f64) -> f64 {
        if !new_cost.is_finite() {
            return f64::NEG_INFINITY;
        }
        let actual_reduction = current_cost - new_cost;

        if predicted_reduction.abs() <= f64::MIN_POSITIVE {
            if actual_reduction >= 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            actual_reduction / predicted_reduction
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lambda_update() {
        let mut tr = TrustRegion::default();
        let start = tr.lambda;

        assert!(tr.update_lambda(0.9));
        assert!(tr.lambda < start);

        let before = tr.lambda;
        assert!(!tr.update_lambda(-1.0));
        assert!(tr.lambda > before);
    }

    #[test]
    fn test_saturation() {
        let mut tr = TrustRegion::default();
        for _ in 0..100 {
            tr.increase();
        }
        assert!(tr.is_saturated());
        assert_eq!(tr.lambda, tr.lambda_max);
    }

    #[test]
    fn test_predicted_reduction_for_gauss_newton_step() {
        // J = I, r = [1, 2]; the Gauss-Newton step removes the whole cost 5
        let jtj = DMatrix::identity(2, 2);
        let g = DVector::from_vec(vec![1.0, 2.0]);
        let step = -g.clone();
        let pred = TrustRegion::predicted_reduction(&step, &g, &jtj);
        assert!((pred - 5.0).abs() < 1e-12);
        assert_eq!(TrustRegion::gain_ratio(5.0, 0.0, pred), 1.0);
        assert_eq!(TrustRegion::gain_ratio(5.0, f64::NAN, pred), f64::NEG_INFINITY);
    }
}
