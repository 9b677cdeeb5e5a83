//! # Instrument Resolution Smearing
//!
//! A [`Smearer`] turns a model curve evaluated at the data's Q points into
//! the curve the instrument would have measured. Two kernels are provided:
//!
//! - [`PointSmearer`]: Gaussian resolution with a width per point (pinhole SANS)
//! - [`SlitSmearer`]: rectangular slit of fixed width and height (USANS)
//!
//! Fit records pick a kernel with a [`SmearingSelection`] and carry its
//! user-facing parameters through a [`SmearAdapter`].

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::Dataset1D;
use crate::error::{Result, SansError};

mod adapter;
mod point;
mod slit;
mod weights;

pub use adapter::{
    adapter_for, adapter_from_params, default_adapter_for, NoSmearAdapter, PointAdapter,
    SlitAdapter, SmearAdapter, SmearingAdapter, SMEAR_DQ, SMEAR_DQ_AVG, SMEAR_DQ_MAX,
    SMEAR_DQ_MIN, SMEAR_HEIGHT, SMEAR_WIDTH,
};
pub use point::PointSmearer;
pub use slit::{SlitSmearer, DEFAULT_SLIT_POINTS};

/// Resolution function over a fixed set of Q points.
pub trait Smearer {
    /// Number of Q points the smearer was built for.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index range of unsmeared points needed to smear every point with
    /// `q_min <= q <= q_max`, or `None` if no point lies in that window.
    fn get_bin_range(&self, q_min: f64, q_max: f64) -> Option<(usize, usize)>;

    /// Smear `unsmeared`, reading only indices `first..=last`.
    fn smear(&self, unsmeared: &Array1<f64>, first: usize, last: usize) -> Result<Array1<f64>>;
}

/// A concrete resolution kernel.
#[derive(Debug, Clone, PartialEq)]
pub enum SmearingKernel {
    Point(PointSmearer),
    Slit(SlitSmearer),
}

impl SmearingKernel {
    /// Short kind label used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SmearingKernel::Point(_) => "point",
            SmearingKernel::Slit(_) => "slit",
        }
    }

    pub fn selection(&self) -> SmearingSelection {
        match self {
            SmearingKernel::Point(_) => SmearingSelection::Point,
            SmearingKernel::Slit(_) => SmearingSelection::Slit,
        }
    }
}

impl Smearer for SmearingKernel {
    fn len(&self) -> usize {
        match self {
            SmearingKernel::Point(s) => s.len(),
            SmearingKernel::Slit(s) => s.len(),
        }
    }

    fn get_bin_range(&self, q_min: f64, q_max: f64) -> Option<(usize, usize)> {
        match self {
            SmearingKernel::Point(s) => s.get_bin_range(q_min, q_max),
            SmearingKernel::Slit(s) => s.get_bin_range(q_min, q_max),
        }
    }

    fn smear(&self, unsmeared: &Array1<f64>, first: usize, last: usize) -> Result<Array1<f64>> {
        match self {
            SmearingKernel::Point(s) => s.smear(unsmeared, first, last),
            SmearingKernel::Slit(s) => s.smear(unsmeared, first, last),
        }
    }
}

/// Persisted smearing choice of a fit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum SmearingSelection {
    /// No smearing
    #[default]
    None,
    /// Whatever resolution the data set carries
    DataDefault,
    /// Point smearing with user-supplied width
    Point,
    /// Slit smearing with user-supplied width and height
    Slit,
}

impl SmearingSelection {
    pub const ALL: [SmearingSelection; 4] = [
        SmearingSelection::None,
        SmearingSelection::DataDefault,
        SmearingSelection::Point,
        SmearingSelection::Slit,
    ];

    pub fn id(&self) -> i64 {
        match self {
            SmearingSelection::None => 0,
            SmearingSelection::DataDefault => 1,
            SmearingSelection::Point => 2,
            SmearingSelection::Slit => 3,
        }
    }

    pub fn from_id(id: i64) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.id() == id)
            .ok_or(SansError::UnknownSmearing(id))
    }

    /// Display name, also stored under the `smear_type` key.
    pub fn name(&self) -> &'static str {
        match self {
            SmearingSelection::None => "None",
            SmearingSelection::DataDefault => "Data default",
            SmearingSelection::Point => "Point smearing",
            SmearingSelection::Slit => "Slit smearing",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }
}

impl TryFrom<i64> for SmearingSelection {
    type Error = SansError;

    fn try_from(id: i64) -> Result<Self> {
        Self::from_id(id)
    }
}

impl From<SmearingSelection> for i64 {
    fn from(s: SmearingSelection) -> i64 {
        s.id()
    }
}

impl fmt::Display for SmearingSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The resolution kernel a data set asks for on its own.
///
/// Slit metadata wins over point widths; an all-zero resolution means no
/// smearing.
pub fn smear_selection(data: &Dataset1D) -> Result<Option<SmearingKernel>> {
    let has_nonzero = |a: &Option<Array1<f64>>| {
        a.as_ref().map_or(false, |a| a.iter().any(|v| *v != 0.0))
    };
    let leading = |a: &Option<Array1<f64>>| a.as_ref().and_then(|a| a.get(0).copied()).unwrap_or(0.0);

    if has_nonzero(&data.slit_height) || has_nonzero(&data.slit_width) {
        let height = leading(&data.slit_height);
        let width = leading(&data.slit_width);
        return Ok(Some(SmearingKernel::Slit(SlitSmearer::new(&data.q, width, height)?)));
    }

    match &data.dq {
        Some(dq) if dq.len() == data.len() && dq.iter().any(|v| *v > 0.0) => {
            Ok(Some(SmearingKernel::Point(PointSmearer::new(&data.q, dq)?)))
        }
        _ => Ok(None),
    }
}
