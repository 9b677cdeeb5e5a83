//! Sweep of the inversion over a range of D_max.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::invertor::{InversionParams, Invertor};
use super::record::finite;
use crate::error::Result;

/// Output scalars of the inversion at one D_max, `None` where unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmaxPoint {
    pub d_max: f64,
    pub chi2: Option<f64>,
    pub rg: Option<f64>,
    pub iq0: Option<f64>,
    pub background: Option<f64>,
    pub osc: Option<f64>,
    pub pos: Option<f64>,
    pub pos_err: Option<f64>,
}

/// Result of a sweep. Points that failed are reported in `errors` and
/// left out of `points`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DmaxExploration {
    pub points: Vec<DmaxPoint>,
    pub errors: Vec<String>,
}

impl DmaxExploration {
    pub fn d_max(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.d_max).collect()
    }

    pub fn chi2(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.chi2).collect()
    }

    pub fn rg(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.rg).collect()
    }
}

/// Evenly spaced D_max values from `min` to `max` inclusive.
pub fn dmax_grid(min: f64, max: f64, npts: usize) -> Vec<f64> {
    match npts {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (npts - 1) as f64;
            (0..npts).map(|i| min + step * i as f64).collect()
        }
    }
}

fn explore_point(invertor: &Invertor, params: &InversionParams, d_max: f64) -> Result<DmaxPoint> {
    let solution = invertor.invert(&InversionParams {
        d_max,
        ..params.clone()
    })?;
    let point = DmaxPoint {
        d_max,
        chi2: finite(solution.chi2),
        rg: finite(solution.rg()),
        iq0: finite(solution.iq0()),
        background: finite(solution.background),
        osc: finite(solution.oscillations()),
        pos: finite(solution.positive_fraction()),
        pos_err: finite(solution.positive_fraction_1sigma()),
    };
    debug!(d_max, chi2 = ?point.chi2, rg = ?point.rg, "explored");
    Ok(point)
}

/// Invert at each D_max of the grid, keeping everything else in `params`.
pub fn explore_dmax(
    invertor: &Invertor,
    params: &InversionParams,
    min: f64,
    max: f64,
    npts: usize,
) -> DmaxExploration {
    let grid = dmax_grid(min, max, npts);

    #[cfg(feature = "parallel")]
    let outcomes: Vec<Result<DmaxPoint>> = if invertor.config().parallel_explore {
        grid.par_iter()
            .map(|&d| explore_point(invertor, params, d))
            .collect()
    } else {
        grid.iter().map(|&d| explore_point(invertor, params, d)).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<Result<DmaxPoint>> =
        grid.iter().map(|&d| explore_point(invertor, params, d)).collect();

    let mut exploration = DmaxExploration::default();
    for (d, outcome) in grid.iter().zip(outcomes) {
        match outcome {
            Ok(point) => exploration.points.push(point),
            Err(e) => exploration.errors.push(format!("D_max = {}: {}", d, e)),
        }
    }
    exploration
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inversion::basis::ortho_transformed;
    use crate::inversion::InversionConfig;
    use ndarray::Array1;

    fn invertor(parallel: bool) -> Invertor {
        let x = Array1::linspace(0.01, 0.25, 50);
        let y = x.mapv(|q| ortho_transformed(100.0, 1, q));
        let config = InversionConfig::default().with_parallel_explore(parallel);
        Invertor::new(x, y, Array1::ones(50), config).unwrap()
    }

    #[test]
    fn test_grid() {
        assert_eq!(dmax_grid(50.0, 150.0, 3), vec![50.0, 100.0, 150.0]);
        assert_eq!(dmax_grid(70.0, 150.0, 1), vec![70.0]);
        assert!(dmax_grid(70.0, 150.0, 0).is_empty());
    }

    #[test]
    fn test_explore_in_order() {
        let params = InversionParams {
            n_terms: 6,
            alpha: 1e-3,
            ..InversionParams::default()
        };
        let result = explore_dmax(&invertor(true), &params, 50.0, 150.0, 3);
        assert!(result.errors.is_empty());
        assert_eq!(result.d_max(), vec![50.0, 100.0, 150.0]);
        assert!(result.chi2().iter().all(|c| c.is_some_and(f64::is_finite)));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let params = InversionParams {
            n_terms: 6,
            ..InversionParams::default()
        };
        let parallel = explore_dmax(&invertor(true), &params, 60.0, 140.0, 5);
        let serial = explore_dmax(&invertor(false), &params, 60.0, 140.0, 5);
        assert_eq!(parallel.d_max(), serial.d_max());
        assert_eq!(parallel.chi2(), serial.chi2());
    }

    #[test]
    fn test_undefined_rg_is_unavailable() {
        // 1.5 φ₂ makes ∫P positive but ∫r²P negative
        let x = Array1::linspace(0.01, 0.25, 50);
        let y = x.mapv(|q| ortho_transformed(100.0, 1, q) + 1.5 * ortho_transformed(100.0, 2, q));
        let inv = Invertor::new(x, y, Array1::ones(50), InversionConfig::default()).unwrap();
        let params = InversionParams {
            n_terms: 2,
            alpha: 0.0,
            ..InversionParams::default()
        };
        let result = explore_dmax(&inv, &params, 100.0, 100.0, 1);
        let point = &result.points[0];
        assert_eq!(point.rg, None);
        assert!(point.chi2.is_some());
        assert!(point.pos.is_some());
    }

    #[test]
    fn test_failures_are_collected() {
        let result = explore_dmax(&invertor(false), &InversionParams::default(), -10.0, 10.0, 3);
        assert_eq!(result.points.len(), 1);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].starts_with("D_max = -10"));
    }
}
