//! Sparse row-normalized resolution weights shared by the smearers.

use ndarray::Array1;

use crate::error::{Result, SansError};

/// One output point: contiguous weights starting at input index `first`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WeightRow {
    pub first: usize,
    pub weights: Vec<f64>,
}

impl WeightRow {
    /// Row that copies input `i` through unchanged.
    pub fn identity(i: usize) -> Self {
        Self {
            first: i,
            weights: vec![1.0],
        }
    }

    /// Compress a dense weight vector to its non-zero span and normalize it.
    /// Returns `None` when every weight is zero.
    pub fn from_dense(dense: &[f64]) -> Option<Self> {
        let first = dense.iter().position(|w| *w > 0.0)?;
        let last = dense.iter().rposition(|w| *w > 0.0)?;
        let total: f64 = dense[first..=last].iter().sum();
        Some(Self {
            first,
            weights: dense[first..=last].iter().map(|w| w / total).collect(),
        })
    }

    /// Last input index with non-zero weight.
    pub fn last(&self) -> usize {
        self.first + self.weights.len() - 1
    }
}

/// Resolution matrix with one [`WeightRow`] per Q point.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WeightMatrix {
    rows: Vec<WeightRow>,
}

impl WeightMatrix {
    pub fn new(rows: Vec<WeightRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Smallest span of inputs that every output with `q_min <= q <= q_max` reads from.
    pub fn bin_range(&self, q: &Array1<f64>, q_min: f64, q_max: f64) -> Option<(usize, usize)> {
        self.rows
            .iter()
            .zip(q.iter())
            .filter(|(_, &qi)| qi >= q_min && qi <= q_max)
            .map(|(row, _)| (row.first, row.last()))
            .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)))
    }

    /// Apply the weights to `unsmeared`, reading only inputs in `first..=last`.
    ///
    /// Each row is renormalized over the inputs it may read; rows that read
    /// nothing produce zero.
    pub fn apply(&self, unsmeared: &Array1<f64>, first: usize, last: usize) -> Result<Array1<f64>> {
        if unsmeared.len() != self.rows.len() {
            return Err(SansError::DimensionMismatch(format!(
                "Smearer built for {} points, got {}",
                self.rows.len(),
                unsmeared.len()
            )));
        }

        Ok(self
            .rows
            .iter()
            .map(|row| {
                let lo = row.first.max(first);
                let hi = row.last().min(last);
                if lo > hi {
                    return 0.0;
                }
                let (mut acc, mut norm) = (0.0, 0.0);
                for j in lo..=hi {
                    let w = row.weights[j - row.first];
                    acc += w * unsmeared[j];
                    norm += w;
                }
                if norm > 0.0 {
                    acc / norm
                } else {
                    0.0
                }
            })
            .collect())
    }
}
