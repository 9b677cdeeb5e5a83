//! Smearing adapters.
//!
//! An adapter is the user-facing side of a resolution kernel: it exposes the
//! kernel's settings as named parameters, stores them in fit records and
//! rebuilds the kernel for a data set on demand.

use ndarray::Array1;

use super::{smear_selection, PointSmearer, SlitSmearer, SmearingKernel, SmearingSelection};
use crate::data::Dataset1D;
use crate::error::{Result, SansError};
use crate::flat_map::{FlatMap, FlatMapExt};
use crate::parameters::ModelParameter;

pub const SMEAR_DQ: &str = "smear_dq";
pub const SMEAR_DQ_MIN: &str = "smear_dq_min";
pub const SMEAR_DQ_AVG: &str = "smear_dq_avg";
pub const SMEAR_DQ_MAX: &str = "smear_dq_max";
pub const SMEAR_WIDTH: &str = "smear_width";
pub const SMEAR_HEIGHT: &str = "smear_height";

/// Common interface of the smearing adapters.
pub trait SmearingAdapter {
    /// Kernel family this adapter configures.
    fn selection(&self) -> SmearingSelection;

    /// True when the settings describe the data's own resolution and are
    /// not meant to be edited.
    fn is_fixed(&self) -> bool;

    /// Settings as parameters. They carry no error and never take part in a fit.
    fn get_parameters(&self) -> Vec<ModelParameter>;

    /// Kernel for `data`, or `None` for no smearing.
    fn build_smearer(&self, data: &Dataset1D) -> Result<Option<SmearingKernel>>;

    /// Value stored under the `smear_type` key.
    fn smear_type_name(&self) -> &'static str {
        self.selection().name()
    }

    /// `smear_type` plus one key per setting.
    fn to_flat_map(&self) -> FlatMap {
        let mut map = FlatMap::new();
        map.put("smear_type", self.smear_type_name());
        for p in self.get_parameters() {
            map.put(&p.name, p.value);
        }
        map
    }
}

fn setting(name: &str, value: f64) -> ModelParameter {
    ModelParameter::new(name, value)
}

/// A kernel and a parameter map are mutually exclusive sources.
fn check_sources(kernel: Option<&SmearingKernel>, params: Option<&FlatMap>) -> Result<()> {
    if kernel.is_some() && params.map_or(false, |p| !p.is_empty()) {
        return Err(SansError::InvalidAdapterConstruction(
            "an adapter is built from either a kernel or a parameter map, not both".to_string(),
        ));
    }
    Ok(())
}

/// Adapter for "no smearing".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoSmearAdapter;

impl SmearingAdapter for NoSmearAdapter {
    fn selection(&self) -> SmearingSelection {
        SmearingSelection::None
    }

    fn is_fixed(&self) -> bool {
        true
    }

    fn get_parameters(&self) -> Vec<ModelParameter> {
        Vec::new()
    }

    fn build_smearer(&self, _data: &Dataset1D) -> Result<Option<SmearingKernel>> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PointWidths {
    /// Read-only summary of per-point widths
    Summary { min: f64, avg: f64, max: f64 },
    /// One editable width for every point
    Uniform(f64),
}

/// Point smearing settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointAdapter {
    widths: PointWidths,
}

impl PointAdapter {
    /// Build from either a point kernel or a parameter map.
    ///
    /// Without a kernel, `is_fixed` picks the summary settings
    /// (`smear_dq_min`, `smear_dq_avg`, `smear_dq_max`) or the single editable
    /// `smear_dq`. Missing keys default to zero.
    pub fn new(kernel: Option<&SmearingKernel>, params: Option<&FlatMap>, is_fixed: bool) -> Result<Self> {
        check_sources(kernel, params)?;
        match kernel {
            Some(kernel) => Self::from_kernel(kernel),
            None => Ok(Self::from_params(params.unwrap_or(&FlatMap::new()), is_fixed)),
        }
    }

    /// Summarize the widths of a point kernel.
    pub fn from_kernel(kernel: &SmearingKernel) -> Result<Self> {
        match kernel {
            SmearingKernel::Point(s) => {
                let (min, avg, max) = s.width_summary();
                Ok(Self::summary(min, avg, max))
            }
            other => Err(SansError::AdapterTypeMismatch {
                expected: "point",
                found: other.kind(),
            }),
        }
    }

    pub fn from_params(params: &FlatMap, is_fixed: bool) -> Self {
        let get = |key: &str| params.number(key).unwrap_or(0.0);
        if is_fixed {
            Self::summary(get(SMEAR_DQ_MIN), get(SMEAR_DQ_AVG), get(SMEAR_DQ_MAX))
        } else {
            Self::uniform(get(SMEAR_DQ))
        }
    }

    /// Editable adapter with one width for every point.
    pub fn uniform(dq: f64) -> Self {
        Self {
            widths: PointWidths::Uniform(dq),
        }
    }

    /// Fixed adapter describing the data's own widths.
    pub fn summary(min: f64, avg: f64, max: f64) -> Self {
        Self {
            widths: PointWidths::Summary { min, avg, max },
        }
    }
}

impl SmearingAdapter for PointAdapter {
    fn selection(&self) -> SmearingSelection {
        SmearingSelection::Point
    }

    fn is_fixed(&self) -> bool {
        matches!(self.widths, PointWidths::Summary { .. })
    }

    fn get_parameters(&self) -> Vec<ModelParameter> {
        match self.widths {
            PointWidths::Summary { min, avg, max } => vec![
                setting(SMEAR_DQ_MIN, min),
                setting(SMEAR_DQ_AVG, avg),
                setting(SMEAR_DQ_MAX, max),
            ],
            PointWidths::Uniform(dq) => vec![setting(SMEAR_DQ, dq)],
        }
    }

    /// A fixed adapter uses the data's own widths when it has them and falls
    /// back to the recorded average otherwise.
    fn build_smearer(&self, data: &Dataset1D) -> Result<Option<SmearingKernel>> {
        let dq = match (self.widths, &data.dq) {
            (PointWidths::Summary { .. }, Some(dq)) if dq.len() == data.len() => dq.clone(),
            (PointWidths::Summary { avg, .. }, _) => Array1::from_elem(data.len(), avg),
            (PointWidths::Uniform(dq), _) => Array1::from_elem(data.len(), dq),
        };
        Ok(Some(SmearingKernel::Point(PointSmearer::new(&data.q, &dq)?)))
    }
}

/// Slit smearing settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlitAdapter {
    pub width: f64,
    pub height: f64,
    is_fixed: bool,
}

impl SlitAdapter {
    /// Build from either a slit kernel or a parameter map with
    /// `smear_width` and `smear_height`.
    pub fn new(kernel: Option<&SmearingKernel>, params: Option<&FlatMap>, is_fixed: bool) -> Result<Self> {
        check_sources(kernel, params)?;
        match kernel {
            Some(kernel) => Self::from_kernel(kernel),
            None => Ok(Self::from_params(params.unwrap_or(&FlatMap::new()), is_fixed)),
        }
    }

    pub fn from_kernel(kernel: &SmearingKernel) -> Result<Self> {
        match kernel {
            SmearingKernel::Slit(s) => Ok(Self {
                width: s.width(),
                height: s.height(),
                is_fixed: true,
            }),
            other => Err(SansError::AdapterTypeMismatch {
                expected: "slit",
                found: other.kind(),
            }),
        }
    }

    pub fn from_params(params: &FlatMap, is_fixed: bool) -> Self {
        Self {
            width: params.number(SMEAR_WIDTH).unwrap_or(0.0),
            height: params.number(SMEAR_HEIGHT).unwrap_or(0.0),
            is_fixed,
        }
    }
}

impl SmearingAdapter for SlitAdapter {
    fn selection(&self) -> SmearingSelection {
        SmearingSelection::Slit
    }

    fn is_fixed(&self) -> bool {
        self.is_fixed
    }

    fn get_parameters(&self) -> Vec<ModelParameter> {
        vec![setting(SMEAR_WIDTH, self.width), setting(SMEAR_HEIGHT, self.height)]
    }

    fn build_smearer(&self, data: &Dataset1D) -> Result<Option<SmearingKernel>> {
        let smearer = SlitSmearer::new(&data.q, self.width, self.height)?;
        Ok(Some(SmearingKernel::Slit(smearer)))
    }
}

/// Any smearing adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmearAdapter {
    NoSmear(NoSmearAdapter),
    Point(PointAdapter),
    Slit(SlitAdapter),
}

impl SmearAdapter {
    fn inner(&self) -> &dyn SmearingAdapter {
        match self {
            SmearAdapter::NoSmear(a) => a,
            SmearAdapter::Point(a) => a,
            SmearAdapter::Slit(a) => a,
        }
    }

    /// Adapter describing an existing kernel.
    pub fn from_kernel(kernel: &SmearingKernel) -> Result<Self> {
        match kernel {
            SmearingKernel::Point(_) => Ok(SmearAdapter::Point(PointAdapter::from_kernel(kernel)?)),
            SmearingKernel::Slit(_) => Ok(SmearAdapter::Slit(SlitAdapter::from_kernel(kernel)?)),
        }
    }
}

impl SmearingAdapter for SmearAdapter {
    fn selection(&self) -> SmearingSelection {
        self.inner().selection()
    }

    fn is_fixed(&self) -> bool {
        self.inner().is_fixed()
    }

    fn get_parameters(&self) -> Vec<ModelParameter> {
        self.inner().get_parameters()
    }

    fn build_smearer(&self, data: &Dataset1D) -> Result<Option<SmearingKernel>> {
        self.inner().build_smearer(data)
    }
}

/// Adapter with default settings for a kernel family, or `None` when the
/// selection has no settings of its own.
pub fn adapter_for(selection: SmearingSelection, is_fixed: bool) -> Option<SmearAdapter> {
    adapter_from_params(selection, &FlatMap::new(), is_fixed)
}

/// Adapter for a kernel family with settings read from `params`.
pub fn adapter_from_params(
    selection: SmearingSelection,
    params: &FlatMap,
    is_fixed: bool,
) -> Option<SmearAdapter> {
    match selection {
        SmearingSelection::Point => Some(SmearAdapter::Point(PointAdapter::from_params(params, is_fixed))),
        SmearingSelection::Slit => Some(SmearAdapter::Slit(SlitAdapter::from_params(params, is_fixed))),
        SmearingSelection::None | SmearingSelection::DataDefault => None,
    }
}

/// Fixed adapter for the resolution `data` carries, `None` when it carries none.
pub fn default_adapter_for(data: &Dataset1D) -> Result<Option<SmearAdapter>> {
    smear_selection(data)?
        .map(|kernel| SmearAdapter::from_kernel(&kernel))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smearing::Smearer;
    use ndarray::Array1;

    fn data() -> Dataset1D {
        let q = Array1::linspace(0.01, 0.1, 10);
        let i = q.mapv(|x| 1.0 / x);
        Dataset1D::new(q, i).unwrap()
    }

    fn point_kernel() -> SmearingKernel {
        let d = data();
        let dq = Array1::linspace(0.001, 0.003, 10);
        SmearingKernel::Point(PointSmearer::new(&d.q, &dq).unwrap())
    }

    fn slit_kernel() -> SmearingKernel {
        SmearingKernel::Slit(SlitSmearer::new(&data().q, 0.0, 0.05).unwrap())
    }

    #[test]
    fn test_kernel_and_params_are_exclusive() {
        let mut params = FlatMap::new();
        params.put(SMEAR_DQ, 0.01);
        let kernel = point_kernel();
        assert!(matches!(
            PointAdapter::new(Some(&kernel), Some(&params), false),
            Err(SansError::InvalidAdapterConstruction(_))
        ));
        // An empty map next to a kernel is fine.
        assert!(PointAdapter::new(Some(&kernel), Some(&FlatMap::new()), false).is_ok());
    }

    #[test]
    fn test_wrong_kernel_kind() {
        let err = PointAdapter::new(Some(&slit_kernel()), None, true).unwrap_err();
        assert!(matches!(
            err,
            SansError::AdapterTypeMismatch {
                expected: "point",
                found: "slit"
            }
        ));
        assert!(SlitAdapter::from_kernel(&point_kernel()).is_err());
    }

    #[test]
    fn test_point_parameter_counts() {
        let fixed = PointAdapter::new(Some(&point_kernel()), None, false).unwrap();
        assert!(fixed.is_fixed());
        let params = fixed.get_parameters();
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name, SMEAR_DQ_MIN);
        assert!((params[1].value - 0.002).abs() < 1e-12);
        assert!(params.iter().all(|p| p.error.is_none()));

        let editable = PointAdapter::new(None, None, false).unwrap();
        assert!(!editable.is_fixed());
        assert_eq!(editable.get_parameters().len(), 1);
    }

    #[test]
    fn test_slit_always_two_parameters() {
        for is_fixed in [true, false] {
            let adapter = adapter_for(SmearingSelection::Slit, is_fixed).unwrap();
            assert_eq!(adapter.get_parameters().len(), 2);
            assert_eq!(adapter.is_fixed(), is_fixed);
        }
        assert!(adapter_for(SmearingSelection::None, false).is_none());
        assert!(adapter_for(SmearingSelection::DataDefault, true).is_none());
    }

    #[test]
    fn test_editable_point_uses_its_width() {
        let mut params = FlatMap::new();
        params.put(SMEAR_DQ, 0.004);
        let adapter = adapter_from_params(SmearingSelection::Point, &params, false).unwrap();
        match adapter.build_smearer(&data()).unwrap() {
            Some(SmearingKernel::Point(s)) => {
                assert!(s.widths().iter().all(|w| *w == 0.004));
            }
            other => panic!("expected point kernel, got {:?}", other),
        }
    }

    #[test]
    fn test_fixed_point_prefers_data_widths() {
        let dq = Array1::linspace(0.001, 0.003, 10);
        let d = data().with_point_resolution(dq.clone()).unwrap();
        let adapter = PointAdapter::summary(0.0, 0.5, 1.0);
        match adapter.build_smearer(&d).unwrap() {
            Some(SmearingKernel::Point(s)) => assert_eq!(s.widths(), &dq),
            other => panic!("expected point kernel, got {:?}", other),
        }
        match adapter.build_smearer(&data()).unwrap() {
            Some(SmearingKernel::Point(s)) => assert!(s.widths().iter().all(|w| *w == 0.5)),
            other => panic!("expected point kernel, got {:?}", other),
        }
    }

    #[test]
    fn test_flat_map_keys() {
        let adapter = SmearAdapter::Slit(SlitAdapter::from_params(&FlatMap::new(), false));
        let map = adapter.to_flat_map();
        assert_eq!(map.text("smear_type"), Some("Slit smearing"));
        assert_eq!(map.number(SMEAR_WIDTH), Some(0.0));
        assert_eq!(map.number(SMEAR_HEIGHT), Some(0.0));
        assert!(NoSmearAdapter.to_flat_map().len() == 1);
    }

    #[test]
    fn test_default_adapter_for_data() {
        assert!(default_adapter_for(&data()).unwrap().is_none());

        let d = data()
            .with_slit_resolution(Array1::from_elem(10, 0.05), Array1::zeros(10))
            .unwrap();
        let adapter = default_adapter_for(&d).unwrap().unwrap();
        assert_eq!(adapter.selection(), SmearingSelection::Slit);
        assert!(adapter.is_fixed());
        let kernel = adapter.build_smearer(&d).unwrap().unwrap();
        assert_eq!(kernel.len(), 10);
    }
}
