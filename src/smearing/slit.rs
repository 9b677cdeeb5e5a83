//! Slit resolution for collimated (e.g. Bonse-Hart) instruments.

use ndarray::Array1;

use super::weights::{WeightMatrix, WeightRow};
use super::Smearer;
use crate::error::{Result, SansError};

/// Samples per slit dimension.
pub const DEFAULT_SLIT_POINTS: usize = 21;

/// Averages the model over a rectangular slit of the given width and height.
///
/// Output `i` is the mean of `I(sqrt((q_i + v)² + u²))` over `u ∈ [0, height]`
/// and `v ∈ [-width/2, width/2]`, with the model linearly interpolated
/// between the data points. Samples past the last Q are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SlitSmearer {
    q: Array1<f64>,
    width: f64,
    height: f64,
    weights: WeightMatrix,
}

impl SlitSmearer {
    /// Build the slit matrix for ascending `q`.
    pub fn new(q: &Array1<f64>, width: f64, height: f64) -> Result<Self> {
        Self::with_points(q, width, height, DEFAULT_SLIT_POINTS)
    }

    /// Build the slit matrix with `npts` samples along each slit dimension.
    pub fn with_points(q: &Array1<f64>, width: f64, height: f64, npts: usize) -> Result<Self> {
        if !(width >= 0.0 && height >= 0.0) {
            return Err(SansError::InvalidParameter(format!(
                "slit width and height must be non-negative, got {} and {}",
                width, height
            )));
        }
        if (1..q.len()).any(|k| q[k] < q[k - 1]) {
            return Err(SansError::InvalidInput(
                "slit smearing needs Q in ascending order".to_string(),
            ));
        }

        let heights = sample_axis(0.0, height, npts);
        let widths = sample_axis(-0.5 * width, 0.5 * width, npts);

        let rows = (0..q.len())
            .map(|i| {
                let mut dense = vec![0.0; q.len()];
                for &u in &heights {
                    for &v in &widths {
                        let shifted = ((q[i] + v).powi(2) + u * u).sqrt();
                        deposit(q, shifted, &mut dense);
                    }
                }
                WeightRow::from_dense(&dense).unwrap_or_else(|| WeightRow::identity(i))
            })
            .collect();

        Ok(Self {
            q: q.clone(),
            width,
            height,
            weights: WeightMatrix::new(rows),
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

impl Smearer for SlitSmearer {
    fn len(&self) -> usize {
        self.weights.len()
    }

    fn get_bin_range(&self, q_min: f64, q_max: f64) -> Option<(usize, usize)> {
        self.weights.bin_range(&self.q, q_min, q_max)
    }

    fn smear(&self, unsmeared: &Array1<f64>, first: usize, last: usize) -> Result<Array1<f64>> {
        self.weights.apply(unsmeared, first, last)
    }
}

/// `npts` evenly spaced samples on `[lo, hi]`, or just `lo` for an empty interval.
fn sample_axis(lo: f64, hi: f64, npts: usize) -> Vec<f64> {
    if hi <= lo || npts < 2 {
        return vec![0.5 * (lo + hi)];
    }
    let step = (hi - lo) / (npts - 1) as f64;
    (0..npts).map(|k| lo + step * k as f64).collect()
}

/// Spread one unit sample at `x` over its two neighbouring grid points.
fn deposit(q: &Array1<f64>, x: f64, dense: &mut [f64]) {
    let n = q.len();
    if n == 0 || x > q[n - 1] {
        return;
    }
    if n == 1 || x <= q[0] {
        dense[0] += 1.0;
        return;
    }
    let upper = q.iter().position(|&v| v >= x).unwrap_or(n - 1).clamp(1, n - 1);
    let lower = upper - 1;
    let span = q[upper] - q[lower];
    if span <= 0.0 {
        dense[upper] += 1.0;
        return;
    }
    let t = (x - q[lower]) / span;
    dense[lower] += 1.0 - t;
    dense[upper] += t;
}
