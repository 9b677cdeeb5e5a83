//! Gaussian point resolution.

use ndarray::Array1;

use super::weights::{WeightMatrix, WeightRow};
use super::Smearer;
use crate::error::{Result, SansError};

/// Gaussian tails are cut at this many widths.
const CUTOFF_SIGMAS: f64 = 3.0;

/// Smears each point with a Gaussian of width `dq[i]` along Q.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSmearer {
    q: Array1<f64>,
    dq: Array1<f64>,
    weights: WeightMatrix,
}

impl PointSmearer {
    /// Build the resolution matrix for points `q` with Gaussian widths `dq`.
    ///
    /// Each neighbour inside ±3σ is weighted by the Gaussian times its bin
    /// width. A zero width leaves that point unsmeared.
    pub fn new(q: &Array1<f64>, dq: &Array1<f64>) -> Result<Self> {
        if q.len() != dq.len() {
            return Err(SansError::DimensionMismatch(format!(
                "{} Q values but {} resolution widths",
                q.len(),
                dq.len()
            )));
        }
        let bin_widths = bin_widths(q);

        let rows = (0..q.len())
            .map(|i| {
                let sigma = dq[i];
                if !(sigma > 0.0) {
                    return WeightRow::identity(i);
                }
                let dense: Vec<f64> = (0..q.len())
                    .map(|j| {
                        let x = (q[j] - q[i]) / sigma;
                        if x.abs() <= CUTOFF_SIGMAS {
                            (-0.5 * x * x).exp() * bin_widths[j]
                        } else {
                            0.0
                        }
                    })
                    .collect();
                WeightRow::from_dense(&dense).unwrap_or_else(|| WeightRow::identity(i))
            })
            .collect();

        Ok(Self {
            q: q.clone(),
            dq: dq.clone(),
            weights: WeightMatrix::new(rows),
        })
    }

    /// Resolution widths the matrix was built from.
    pub fn widths(&self) -> &Array1<f64> {
        &self.dq
    }

    /// Minimum, mean and maximum width; zeros for an empty set.
    pub fn width_summary(&self) -> (f64, f64, f64) {
        if self.dq.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        let min = self.dq.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.dq.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = self.dq.sum() / self.dq.len() as f64;
        (min, avg, max)
    }
}

impl Smearer for PointSmearer {
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

/// Width of the Q interval each point represents. End points mirror their
/// only neighbour.
fn bin_widths(q: &Array1<f64>) -> Vec<f64> {
    let n = q.len();
    if n < 2 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|j| match j {
            0 => (q[1] - q[0]).abs(),
            j if j == n - 1 => (q[n - 1] - q[n - 2]).abs(),
            j => 0.5 * (q[j + 1] - q[j - 1]).abs(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    fn grid() -> Array1<f64> {
        Array1::linspace(0.01, 0.2, 40)
    }

    #[test]
    fn test_zero_width_is_identity() {
        let q = grid();
        let s = PointSmearer::new(&q, &Array1::zeros(q.len())).unwrap();
        let y = q.mapv(|x| 1.0 / x);
        let out = s.smear(&y, 0, q.len() - 1).unwrap();
        for (a, b) in out.iter().zip(y.iter()) {
            assert_relative_eq!(a, b);
        }
        assert_eq!(s.get_bin_range(0.05, 0.1), {
            let first = q.iter().position(|&x| x >= 0.05).unwrap();
            let last = q.iter().rposition(|&x| x <= 0.1).unwrap();
            Some((first, last))
        });
    }

    #[test]
    fn test_constant_is_preserved() {
        let q = grid();
        let s = PointSmearer::new(&q, &Array1::from_elem(q.len(), 0.01)).unwrap();
        let out = s.smear(&Array1::from_elem(q.len(), 3.0), 0, q.len() - 1).unwrap();
        for v in out.iter() {
            assert_relative_eq!(*v, 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_line_preserved_in_interior() {
        // A symmetric kernel on a uniform grid leaves a straight line unchanged.
        let q = grid();
        let s = PointSmearer::new(&q, &Array1::from_elem(q.len(), 0.005)).unwrap();
        let y = q.mapv(|x| 2.0 * x + 1.0);
        let out = s.smear(&y, 0, q.len() - 1).unwrap();
        for k in 10..30 {
            assert_relative_eq!(out[k], y[k], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_bin_range_widens_with_resolution() {
        let q = grid();
        let s = PointSmearer::new(&q, &Array1::from_elem(q.len(), 0.01)).unwrap();
        let (first, last) = s.get_bin_range(0.1, 0.12).unwrap();
        let inner_first = q.iter().position(|&x| x >= 0.1).unwrap();
        let inner_last = q.iter().rposition(|&x| x <= 0.12).unwrap();
        assert!(first < inner_first);
        assert!(last > inner_last);
        assert!(s.get_bin_range(1.0, 2.0).is_none());
    }

    #[test]
    fn test_length_mismatch() {
        assert!(PointSmearer::new(&grid(), &Array1::zeros(3)).is_err());
    }

    #[test]
    fn test_width_summary() {
        let q = Array1::linspace(0.1, 0.3, 3);
        let s = PointSmearer::new(&q, &ndarray::array![0.01, 0.02, 0.03]).unwrap();
        let (min, avg, max) = s.width_summary();
        assert_relative_eq!(min, 0.01);
        assert_relative_eq!(avg, 0.02);
        assert_relative_eq!(max, 0.03);
    }
}
