//! One-dimensional I(Q) data sets.
//!
//! A [`Dataset1D`] holds parallel arrays: Q, I, an optional σI and optional
//! resolution metadata (point dQ, or slit height and width). Only Q and I are
//! validated on construction; the fit engine decides what to do with error
//! bars that do not line up.

use ndarray::Array1;
use std::path::Path;

use crate::error::{Result, SansError};

/// A 1-D scattering curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset1D {
    /// Identity used by fit and inversion records to refer back to the data
    pub id: Option<i64>,
    pub q: Array1<f64>,
    pub i: Array1<f64>,
    /// Uncertainty on I
    pub di: Option<Array1<f64>>,
    /// Point resolution, one width per Q
    pub dq: Option<Array1<f64>>,
    /// Slit height (dxl)
    pub slit_height: Option<Array1<f64>>,
    /// Slit width (dxw)
    pub slit_width: Option<Array1<f64>>,
}

impl Dataset1D {
    /// Create a data set from Q and I, which must have equal length.
    pub fn new(q: Array1<f64>, i: Array1<f64>) -> Result<Self> {
        if q.len() != i.len() {
            return Err(SansError::DataShape(format!(
                "Q has {} points but I has {}",
                q.len(),
                i.len()
            )));
        }
        Ok(Self {
            id: None,
            q,
            i,
            di: None,
            dq: None,
            slit_height: None,
            slit_width: None,
        })
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Attach σI as given; the length is not checked here.
    pub fn with_errors(mut self, di: Array1<f64>) -> Self {
        self.di = Some(di);
        self
    }

    /// Attach point resolution widths.
    pub fn with_point_resolution(mut self, dq: Array1<f64>) -> Result<Self> {
        self.check_metadata_len("dQ", dq.len())?;
        self.dq = Some(dq);
        Ok(self)
    }

    /// Attach slit height and width arrays.
    pub fn with_slit_resolution(mut self, height: Array1<f64>, width: Array1<f64>) -> Result<Self> {
        self.check_metadata_len("slit height", height.len())?;
        self.check_metadata_len("slit width", width.len())?;
        self.slit_height = Some(height);
        self.slit_width = Some(width);
        Ok(self)
    }

    fn check_metadata_len(&self, what: &str, len: usize) -> Result<()> {
        if len != self.q.len() {
            return Err(SansError::DataShape(format!(
                "{} has {} points but Q has {}",
                what,
                len,
                self.q.len()
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    /// Smallest Q, or `None` for an empty set.
    pub fn q_min(&self) -> Option<f64> {
        self.q.iter().copied().reduce(f64::min)
    }

    /// Largest Q, or `None` for an empty set.
    pub fn q_max(&self) -> Option<f64> {
        self.q.iter().copied().reduce(f64::max)
    }

    /// Keep only points with Q > 0. Returns the filtered set and how many
    /// points were dropped. Metadata arrays of the wrong length are dropped.
    pub fn positive_q(&self) -> (Dataset1D, usize) {
        let keep: Vec<usize> = (0..self.len()).filter(|&k| self.q[k] > 0.0).collect();
        let pick = |a: &Array1<f64>| -> Option<Array1<f64>> {
            if a.len() == self.len() {
                Some(keep.iter().map(|&k| a[k]).collect())
            } else {
                None
            }
        };
        let filtered = Dataset1D {
            id: self.id,
            q: keep.iter().map(|&k| self.q[k]).collect(),
            i: keep.iter().map(|&k| self.i[k]).collect(),
            di: self.di.as_ref().and_then(pick),
            dq: self.dq.as_ref().and_then(pick),
            slit_height: self.slit_height.as_ref().and_then(pick),
            slit_width: self.slit_width.as_ref().and_then(pick),
        };
        (filtered, self.len() - keep.len())
    }

    /// Parse whitespace or comma separated columns: Q, I, [σI, [dQ]].
    ///
    /// Lines that do not start with at least two numbers (headers, comments)
    /// are skipped. σI and dQ are kept only if every data line has them.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for line in text.lines() {
            let fields: Vec<f64> = line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .map_while(|s| s.parse::<f64>().ok())
                .collect();
            if fields.len() >= 2 {
                rows.push(fields);
            }
        }
        if rows.is_empty() {
            return Err(SansError::NoUsableData(
                "no numeric Q, I columns found".to_string(),
            ));
        }

        let column = |k: usize| -> Array1<f64> { rows.iter().map(|r| r[k]).collect() };
        let n_cols = rows.iter().map(Vec::len).min().unwrap_or(2);

        let mut data = Dataset1D::new(column(0), column(1))?;
        if n_cols >= 3 {
            data.di = Some(column(2));
        }
        if n_cols >= 4 {
            data.dq = Some(column(3));
        }
        Ok(data)
    }

    /// Read a text file with [`Dataset1D::from_text`].
    pub fn read_text_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_text(&text)
    }
}
