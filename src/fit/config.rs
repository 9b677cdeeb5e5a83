//! Options for curve fits.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lm::LmConfig;
use crate::utils::finite_difference::DEFAULT_EPSILON;

/// What to report as a parameter's standard error when the covariance is
/// unavailable or its diagonal entry is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StderrFallback {
    /// Report the fitted value itself, as older fit records do.
    #[default]
    ParameterValue,
    /// Report no error.
    Unavailable,
}

impl StderrFallback {
    pub(crate) fn apply(&self, value: f64) -> Option<f64> {
        match self {
            StderrFallback::ParameterValue => Some(value),
            StderrFallback::Unavailable => None,
        }
    }
}

/// Configuration of [`CurveFitEngine::fit`](super::CurveFitEngine::fit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Solver settings
    pub lm: LmConfig,

    /// Relative finite-difference step for the Jacobian. Default: 1e-8
    pub step_epsilon: f64,

    /// Multiply `inv(JᵀJ)` by the reduced chi-square. Default: false
    pub scale_covariance: bool,

    /// Error reported when the covariance cannot be used.
    pub stderr_fallback: StderrFallback,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            lm: LmConfig::default(),
            step_epsilon: DEFAULT_EPSILON,
            scale_covariance: false,
            stderr_fallback: StderrFallback::default(),
        }
    }
}

impl FitConfig {
    pub fn with_lm(mut self, lm: LmConfig) -> Self {
        self.lm = lm;
        self
    }

    pub fn with_step_epsilon(mut self, step_epsilon: f64) -> Self {
        self.step_epsilon = step_epsilon;
        self
    }

    pub fn with_scale_covariance(mut self, scale: bool) -> Self {
        self.scale_covariance = scale;
        self
    }

    pub fn with_stderr_fallback(mut self, fallback: StderrFallback) -> Self {
        self.stderr_fallback = fallback;
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
