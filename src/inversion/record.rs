//! Stored form of an inversion: its settings and its output.

use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::invertor::{InversionParams, PrSolution};
use crate::error::{Result, SansError};
use crate::flat_map::{FlatMap, FlatMapExt};

/// Settings of an inversion run and the data it refers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InversionProblem {
    pub data_id: Option<i64>,
    pub params: InversionParams,
}

impl InversionProblem {
    pub fn new(params: InversionParams) -> Self {
        Self {
            data_id: None,
            params,
        }
    }

    pub fn with_data_id(mut self, data_id: i64) -> Self {
        self.data_id = Some(data_id);
        self
    }

    /// Flatten the settings into string keys. Unset Q bounds are omitted.
    pub fn as_flat_map(&self) -> FlatMap {
        let p = &self.params;
        let mut map = FlatMap::new();
        if let Some(id) = self.data_id {
            map.put("data", id);
        }
        map.put("d_max", p.d_max);
        map.put("n_terms", p.n_terms);
        map.put("alpha", p.alpha);
        if let Some(q_min) = p.q_min {
            map.put("q_min", q_min);
        }
        if let Some(q_max) = p.q_max {
            map.put("q_max", q_max);
        }
        map.put("slit_height", p.slit_height);
        map.put("slit_width", p.slit_width);
        map.put("has_bck", p.has_bck);
        map
    }

    /// Update the settings from string keys; absent keys leave their field
    /// unchanged and a null Q bound clears it.
    pub fn populate_from_flat_map(&mut self, map: &FlatMap) -> Result<()> {
        if let Some(id) = map.integer("data") {
            self.data_id = Some(id);
        }
        let p = &mut self.params;
        if let Some(d_max) = map.number("d_max") {
            p.d_max = d_max;
        }
        if let Some(n) = map.integer("n_terms") {
            p.n_terms = usize::try_from(n).map_err(|_| {
                SansError::InvalidParameter(format!("n_terms must not be negative, got {}", n))
            })?;
        }
        if let Some(alpha) = map.number("alpha") {
            p.alpha = alpha;
        }
        if let Some(value) = map.get("q_min") {
            p.q_min = value.as_f64();
        }
        if let Some(value) = map.get("q_max") {
            p.q_max = value.as_f64();
        }
        if let Some(h) = map.number("slit_height") {
            p.slit_height = h;
        }
        if let Some(w) = map.number("slit_width") {
            p.slit_width = w;
        }
        if let Some(bck) = map.get("has_bck") {
            p.has_bck = bck.as_bool();
        }
        Ok(())
    }

    pub fn from_flat_map(map: &FlatMap) -> Result<Self> {
        let mut problem = Self::default();
        problem.populate_from_flat_map(map)?;
        Ok(problem)
    }
}

/// Whether a stored record holds a coefficient or a covariance entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoefficientKind {
    Coefficient,
    Covariance,
}

/// One stored entry of the coefficient vector or covariance matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoefficientRecord {
    pub kind: CoefficientKind,
    pub main_index: usize,
    /// Column of a covariance entry
    pub secondary_index: Option<usize>,
    pub value: f64,
}

pub(super) fn finite(v: f64) -> Option<f64> {
    if v.is_nan() {
        None
    } else {
        Some(v)
    }
}

/// Results of an inversion. Scalars that came out NaN are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct InversionOutput {
    pub chi2: Option<f64>,
    pub rg: Option<f64>,
    pub background: Option<f64>,
    pub iq0: Option<f64>,
    pub osc: Option<f64>,
    pub pos_frac: Option<f64>,
    pub pos_frac_1sigma: Option<f64>,
    pub suggested_alpha: Option<f64>,
    pub coefficients: Array1<f64>,
    pub covariance: Array2<f64>,
}

impl InversionOutput {
    pub fn from_solution(solution: &PrSolution) -> Self {
        Self {
            chi2: finite(solution.chi2),
            rg: finite(solution.rg()),
            background: finite(solution.background),
            iq0: finite(solution.iq0()),
            osc: finite(solution.oscillations()),
            pos_frac: finite(solution.positive_fraction()),
            pos_frac_1sigma: finite(solution.positive_fraction_1sigma()),
            suggested_alpha: finite(solution.suggested_alpha),
            coefficients: solution.coefficients.clone(),
            covariance: solution.covariance.clone(),
        }
    }

    pub fn n_terms(&self) -> usize {
        self.coefficients.len()
    }

    /// Labelled scalars for display.
    pub fn summary(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("Chi2", self.chi2),
            ("Rg (Å)", self.rg),
            ("Bck", self.background),
            ("I(Q=0)", self.iq0),
            ("Osc", self.osc),
            ("R+", self.pos_frac),
            ("R++", self.pos_frac_1sigma),
        ]
    }

    /// Coefficients followed by the covariance in row-major order.
    pub fn coefficient_records(&self) -> Vec<CoefficientRecord> {
        let coefficients = self.coefficients.iter().enumerate().map(|(i, &value)| CoefficientRecord {
            kind: CoefficientKind::Coefficient,
            main_index: i,
            secondary_index: None,
            value,
        });
        let covariance = self.covariance.indexed_iter().map(|((i, j), &value)| CoefficientRecord {
            kind: CoefficientKind::Covariance,
            main_index: i,
            secondary_index: Some(j),
            value,
        });
        coefficients.chain(covariance).collect()
    }

    /// Rebuild coefficients and covariance for `n_terms` basis functions.
    ///
    /// Entries not present in `records` are zero. The scalars are left unset.
    pub fn from_records(n_terms: usize, records: &[CoefficientRecord]) -> Result<Self> {
        let mut coefficients = Array1::zeros(n_terms);
        let mut covariance = Array2::zeros((n_terms, n_terms));
        for record in records {
            let out_of_range = |i: usize| {
                SansError::DimensionMismatch(format!(
                    "record index {} outside a basis of {} terms",
                    i, n_terms
                ))
            };
            if record.main_index >= n_terms {
                return Err(out_of_range(record.main_index));
            }
            match (record.kind, record.secondary_index) {
                (CoefficientKind::Coefficient, _) => coefficients[record.main_index] = record.value,
                (CoefficientKind::Covariance, Some(j)) if j < n_terms => {
                    covariance[[record.main_index, j]] = record.value
                }
                (CoefficientKind::Covariance, Some(j)) => return Err(out_of_range(j)),
                (CoefficientKind::Covariance, None) => {
                    return Err(SansError::InvalidInput(format!(
                        "covariance record {} has no column index",
                        record.main_index
                    )))
                }
            }
        }
        Ok(Self {
            chi2: None,
            rg: None,
            background: None,
            iq0: None,
            osc: None,
            pos_frac: None,
            pos_frac_1sigma: None,
            suggested_alpha: None,
            coefficients,
            covariance,
        })
    }
}

impl fmt::Display for InversionOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.summary() {
            match value {
                Some(v) => writeln!(f, "{}: {:.4e}", label, v)?,
                None => writeln!(f, "{}: -", label)?,
            }
        }
        Ok(())
    }
}
