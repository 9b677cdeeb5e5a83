//! Fit records.
//!
//! A [`FitProblem`] holds everything needed to reproduce a fit: the model,
//! its full parameter list, the Q window and the smearing choice, plus the
//! chi-square of the last run. It refers to its data set by id only.

use ndarray::Array1;
use std::fmt;
use tracing::debug;

use super::config::FitConfig;
use super::engine::CurveFitEngine;
use super::report::FitReport;
use crate::data::Dataset1D;
use crate::error::Result;
use crate::model::ScatteringModel;
use crate::models::{create_model, ModelId};
use crate::parameters::{ModelParameter, ParameterSet};
use crate::smearing::{
    smear_selection, SmearAdapter, SmearingAdapter, SmearingKernel, SmearingSelection,
};

/// Model curve over the fit window, without fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCurve {
    pub data_id: Option<i64>,
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    pub chi2: f64,
}

/// Configuration and last result of a model fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitProblem {
    pub model_id: ModelId,
    pub data_id: Option<i64>,
    /// Always the model's full parameter list, in catalog order
    pub parameters: ParameterSet,
    pub q_min: Option<f64>,
    pub q_max: Option<f64>,
    pub smearing: SmearingSelection,
    pub smear_adapter: Option<SmearAdapter>,
    pub chi2: Option<f64>,
}

impl FitProblem {
    /// New problem with the model's default, fixed parameters.
    pub fn new(model_id: ModelId) -> Result<Self> {
        Ok(Self {
            model_id,
            data_id: None,
            parameters: model_id.default_parameters()?,
            q_min: None,
            q_max: None,
            smearing: SmearingSelection::None,
            smear_adapter: None,
            chi2: None,
        })
    }

    pub fn with_data_id(mut self, data_id: i64) -> Self {
        self.data_id = Some(data_id);
        self
    }

    pub fn with_q_range(mut self, q_min: Option<f64>, q_max: Option<f64>) -> Self {
        self.q_min = q_min;
        self.q_max = q_max;
        self
    }

    pub fn with_smearing(mut self, smearing: SmearingSelection, adapter: Option<SmearAdapter>) -> Self {
        self.smearing = smearing;
        self.smear_adapter = adapter;
        self
    }

    pub fn model_name(&self) -> &'static str {
        self.model_id.name()
    }

    /// Reset to the model defaults, then merge `incoming` by name.
    ///
    /// Names the model does not have are ignored, so the list stays complete.
    pub fn process_parameter_list(&mut self, incoming: &[ModelParameter]) -> Result<()> {
        self.parameters = self.model_id.default_parameters()?;
        let merged = self.parameters.merge(incoming);
        debug!(merged, ignored = incoming.len() - merged, "merged parameter list");
        Ok(())
    }

    /// Whether any parameter is free to fit.
    pub fn fit_parameter_selected(&self) -> bool {
        self.parameters.has_free()
    }

    /// Set one parameter's value and whether it is fitted.
    pub fn set_parameter(&mut self, name: &str, value: f64, free: bool) -> Result<()> {
        self.parameters.set_value(name, value)?;
        if let Some(p) = self.parameters.get_mut(name) {
            p.is_fixed = !free;
        }
        Ok(())
    }

    /// Model instance carrying this problem's values and free flags.
    pub fn build_model(&self) -> Result<Box<dyn ScatteringModel>> {
        let mut model = create_model(self.model_id.id())?;
        model.parameters_mut().merge(self.parameters.as_slice());
        Ok(model)
    }

    /// Kernel to fit `data` with.
    ///
    /// `DataDefault` uses the data's own resolution; otherwise the adapter
    /// decides, and no adapter means no smearing.
    pub fn smearer(&self, data: &Dataset1D) -> Result<Option<SmearingKernel>> {
        if self.smearing == SmearingSelection::DataDefault {
            return smear_selection(data);
        }
        match &self.smear_adapter {
            Some(adapter) => adapter.build_smearer(data),
            None => Ok(None),
        }
    }

    /// Engine over `data` with this problem's model, window and smearing.
    pub fn engine<'a>(&self, data: &'a Dataset1D) -> Result<CurveFitEngine<'a>> {
        CurveFitEngine::new(
            self.build_model()?,
            data,
            self.smearer(data)?,
            self.q_min,
            self.q_max,
        )
    }

    /// Evaluate the current parameters over the window.
    pub fn compute_model(&self, data: &Dataset1D) -> Result<ModelCurve> {
        let engine = self.engine(data)?;
        let (x, y) = engine.get_model_distribution()?;
        Ok(ModelCurve {
            data_id: data.id,
            x,
            y,
            chi2: engine.chi2()?,
        })
    }

    /// Fit the free parameters to `data` and store values, errors and chi-square.
    pub fn perform_fit(&mut self, data: &Dataset1D, config: &FitConfig) -> Result<FitReport> {
        let mut engine = self.engine(data)?;
        let report = engine.fit(config)?;
        self.parameters = engine.model().parameters().clone();
        self.chi2 = Some(report.chi2);
        Ok(report)
    }
}

impl fmt::Display for FitProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model ID: {} ({})", self.model_id.id(), self.model_id.name())?;
        for p in &self.parameters {
            let marker = if p.is_fixed { "" } else { "*" };
            match p.error {
                Some(err) => writeln!(f, "  {}{} = {} +- {}", p.name, marker, p.value, err)?,
                None => writeln!(f, "  {}{} = {}", p.name, marker, p.value)?,
            }
        }
        let bound = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
        writeln!(f)?;
        writeln!(f, "Q min = {}  Q max = {}", bound(self.q_min), bound(self.q_max))?;
        write!(f, "Smearing: {}", self.smearing)?;
        if let Some(adapter) = &self.smear_adapter {
            write!(f, "\n  is_fixed = {}", adapter.is_fixed())?;
            for p in adapter.get_parameters() {
                write!(f, "  {} = {}", p.name, p.value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smearing::PointAdapter;
    use approx::assert_relative_eq;

    fn ramp() -> Dataset1D {
        let x = Array1::range(0.0, 13.0, 1.0);
        Dataset1D::new(x.clone(), x).unwrap().with_id(7)
    }

    #[test]
    fn test_new_uses_defaults() {
        let p = FitProblem::new(ModelId::Line).unwrap();
        assert_eq!(p.parameters.names(), vec!["A", "B"]);
        assert!(!p.fit_parameter_selected());
        assert!(FitProblem::new(ModelId::Cylinder).is_err());
    }

    #[test]
    fn test_partial_list_is_merged() {
        let mut p = FitProblem::new(ModelId::Sphere).unwrap();
        p.process_parameter_list(&[ModelParameter::free("radius", 42.0), ModelParameter::new("bogus", 1.0)])
            .unwrap();
        assert_eq!(p.parameters.len(), ModelId::Sphere.parameter_info().unwrap().len());
        assert_eq!(p.parameters.value("radius").unwrap(), 42.0);
        assert!(p.fit_parameter_selected());
    }

    #[test]
    fn test_compute_model() {
        let mut p = FitProblem::new(ModelId::Line).unwrap();
        p.set_parameter("A", 1.0, false).unwrap();
        p.set_parameter("B", 0.0, false).unwrap();
        let curve = p.with_q_range(Some(2.0), Some(4.0)).compute_model(&ramp()).unwrap();
        assert_eq!(curve.data_id, Some(7));
        assert_eq!(curve.x.to_vec(), vec![2.0, 3.0, 4.0]);
        assert_eq!(curve.y.to_vec(), vec![2.0, 3.0, 4.0]);
        assert_eq!(curve.chi2, 0.0);
    }

    #[test]
    fn test_perform_fit_writes_back() {
        let mut p = FitProblem::new(ModelId::Line).unwrap();
        p.set_parameter("A", 1.0, true).unwrap();
        p.set_parameter("B", 1.0, true).unwrap();
        let report = p.perform_fit(&ramp(), &FitConfig::default()).unwrap();

        assert!(report.converged());
        assert_relative_eq!(p.parameters.value("A").unwrap(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.parameters.value("B").unwrap(), 0.0, epsilon = 1e-6);
        assert!(p.parameters.get("B").unwrap().error.is_some());
        assert_eq!(p.chi2, Some(report.chi2));
    }

    #[test]
    fn test_smearer_selection() {
        let data = ramp().with_point_resolution(Array1::from_elem(13, 0.5)).unwrap();
        let mut p = FitProblem::new(ModelId::Line).unwrap();
        assert!(p.smearer(&data).unwrap().is_none());

        p.smearing = SmearingSelection::DataDefault;
        assert!(matches!(p.smearer(&data).unwrap(), Some(SmearingKernel::Point(_))));

        p.smearing = SmearingSelection::Point;
        p.smear_adapter = Some(SmearAdapter::Point(PointAdapter::uniform(0.0)));
        assert!(matches!(p.smearer(&data).unwrap(), Some(SmearingKernel::Point(_))));
    }

    #[test]
    fn test_display() {
        let mut p = FitProblem::new(ModelId::Line).unwrap();
        p.set_parameter("A", 2.0, true).unwrap();
        let text = p.to_string();
        assert!(text.starts_with("Model ID: 31 (Linear)\n"));
        assert!(text.contains("  A* = 2\n"));
        assert!(text.contains("  B = 1\n"));
        assert!(text.contains("Smearing: None"));
    }
}
