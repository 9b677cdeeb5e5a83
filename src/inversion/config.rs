//! Numerical settings of the P(r) inversion.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Grid sizes and search ranges used by the inversion and its estimators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InversionConfig {
    /// r points in the smoothness penalty. Default: 20
    pub reg_points: usize,

    /// r points returned by `get_pr`. Default: 50
    pub pr_points: usize,

    /// Slices for Rg, oscillation and positivity integrals. Default: 101
    pub slice_points: usize,

    /// r points scanned when counting peaks of P(r). Default: 51
    pub peak_points: usize,

    /// Samples per slit dimension. Default: 21
    pub smear_points: usize,

    /// Smallest basis size tried by the term estimator. Default: 10
    pub nterm_min: usize,

    /// Largest basis size tried by the term estimator (exclusive), further
    /// capped by the number of points. Default: 50
    pub nterm_max: usize,

    /// Alpha reductions tried by the alpha estimator. Default: 10
    pub alpha_steps: usize,

    /// D_max points in an exploration sweep. Default: 25
    pub explore_points: usize,

    /// Run exploration points on the rayon pool. Default: true with the `parallel` feature
    pub parallel_explore: bool,
}

impl Default for InversionConfig {
    fn default() -> Self {
        Self {
            reg_points: 20,
            pr_points: 50,
            slice_points: 101,
            peak_points: 51,
            smear_points: 21,
            nterm_min: 10,
            nterm_max: 50,
            alpha_steps: 10,
            explore_points: 25,
            parallel_explore: cfg!(feature = "parallel"),
        }
    }
}

impl InversionConfig {
    pub fn with_explore_points(mut self, npts: usize) -> Self {
        self.explore_points = npts;
        self
    }

    pub fn with_parallel_explore(mut self, parallel: bool) -> Self {
        self.parallel_explore = parallel;
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
