//! Least-squares fitting of a scattering model to I(Q) data.
//!
//! The engine turns (model, data, smearer, Q window) into the weighted
//! residual vector `(I - I_model) / σI` over the free model parameters and
//! hands it to the Levenberg-Marquardt solver.
//!
//! With smearing active, the model is evaluated over a wider Q range than the
//! fit window: every unsmeared point that the smearer reads for a visible
//! point. Only points inside the window become residuals.

use ndarray::{Array1, Array2};
use tracing::{info, warn};

use super::config::FitConfig;
use super::report::FitReport;
use crate::data::Dataset1D;
use crate::error::{Result, SansError};
use crate::lm::LevenbergMarquardt;
use crate::model::ScatteringModel;
use crate::parameters::ParameterSet;
use crate::problem::Problem;
use crate::smearing::{Smearer, SmearingKernel};
use crate::uncertainty::{
    calculate_correlation, calculate_covariance, reduced_chi_square,
    standard_errors_from_covariance,
};
use crate::utils::finite_difference::{self, DEFAULT_EPSILON};

/// Curve-fit engine over one data set.
pub struct CurveFitEngine<'a> {
    model: Box<dyn ScatteringModel>,
    data: &'a Dataset1D,
    smearer: Option<SmearingKernel>,
    dy: Array1<f64>,
    q_min: f64,
    q_max: f64,
    first_bin: usize,
    last_bin: usize,
    /// Points inside the fit window
    idx: Vec<bool>,
    /// Points the model is evaluated at
    idx_unsmeared: Vec<bool>,
    step_epsilon: f64,
}

impl<'a> CurveFitEngine<'a> {
    /// Create an engine. A missing window bound defaults to the data's own
    /// Q extent.
    ///
    /// σI is replaced by unit errors when it is absent, has the wrong length
    /// or is zero everywhere.
    pub fn new(
        model: Box<dyn ScatteringModel>,
        data: &'a Dataset1D,
        smearer: Option<SmearingKernel>,
        q_min: Option<f64>,
        q_max: Option<f64>,
    ) -> Result<Self> {
        if data.q.len() != data.i.len() {
            return Err(SansError::DataShape(format!(
                "Q has {} points but I has {}",
                data.q.len(),
                data.i.len()
            )));
        }
        if data.is_empty() {
            return Err(SansError::NoUsableData("data set is empty".to_string()));
        }

        let dy = match &data.di {
            Some(di) if di.len() == data.len() && di.iter().any(|v| *v != 0.0) => di.clone(),
            _ => {
                warn!(points = data.len(), "no usable error bars, using unit errors");
                Array1::ones(data.len())
            }
        };

        let mut engine = Self {
            model,
            data,
            smearer,
            dy,
            q_min: 0.0,
            q_max: 0.0,
            first_bin: 0,
            last_bin: data.len() - 1,
            idx: Vec::new(),
            idx_unsmeared: Vec::new(),
            step_epsilon: DEFAULT_EPSILON,
        };
        engine.set_q_range(q_min, q_max)?;
        Ok(engine)
    }

    /// Move the fit window and recompute the evaluation range.
    pub fn set_q_range(&mut self, q_min: Option<f64>, q_max: Option<f64>) -> Result<()> {
        let q = &self.data.q;
        let q_min = q_min.or_else(|| self.data.q_min()).unwrap_or(0.0);
        let q_max = q_max.or_else(|| self.data.q_max()).unwrap_or(0.0);

        let idx: Vec<bool> = q.iter().map(|&x| x >= q_min && x <= q_max).collect();
        if !idx.iter().any(|&inside| inside) {
            return Err(SansError::NoUsableData(format!(
                "no data points between Q = {} and Q = {}",
                q_min, q_max
            )));
        }

        let (first, last) = match &self.smearer {
            Some(smearer) => {
                if smearer.len() != q.len() {
                    return Err(SansError::DimensionMismatch(format!(
                        "smearer built for {} points, data has {}",
                        smearer.len(),
                        q.len()
                    )));
                }
                smearer.get_bin_range(q_min, q_max).ok_or_else(|| {
                    SansError::NoUsableData("smearer covers no point in the Q window".to_string())
                })?
            }
            None => (0, q.len() - 1),
        };

        let (lo, hi) = if self.smearer.is_some() {
            (q[first], q[last])
        } else {
            (q_min, q_max)
        };

        self.q_min = q_min;
        self.q_max = q_max;
        self.first_bin = first;
        self.last_bin = last;
        self.idx = idx;
        self.idx_unsmeared = q.iter().map(|&x| x >= lo && x <= hi).collect();
        Ok(())
    }

    /// Current fit window.
    pub fn q_range(&self) -> (f64, f64) {
        (self.q_min, self.q_max)
    }

    /// Number of residuals.
    pub fn n_points(&self) -> usize {
        self.idx.iter().filter(|&&inside| inside).count()
    }

    pub fn model(&self) -> &dyn ScatteringModel {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> &mut dyn ScatteringModel {
        self.model.as_mut()
    }

    /// Give the model back, with whatever values the last fit left in it.
    pub fn into_model(self) -> Box<dyn ScatteringModel> {
        self.model
    }

    /// Model curve over all points, smeared if a smearer is set. Points
    /// outside the evaluation range are zero before smearing.
    fn model_curve(&self, params: &ParameterSet) -> Result<Array1<f64>> {
        let n = self.data.len();
        let x: Array1<f64> = self
            .data
            .q
            .iter()
            .zip(&self.idx_unsmeared)
            .filter(|(_, &keep)| keep)
            .map(|(&q, _)| q)
            .collect();

        let values = self.model.eval_with(params, &x)?;
        if values.len() != x.len() {
            return Err(SansError::DimensionMismatch(format!(
                "model returned {} values for {} Q points",
                values.len(),
                x.len()
            )));
        }

        let mut fx = Array1::zeros(n);
        let targets = (0..n).filter(|&k| self.idx_unsmeared[k]);
        for (k, v) in targets.zip(values.iter()) {
            fx[k] = *v;
        }

        if let Some(smearer) = &self.smearer {
            fx = smearer.smear(&fx, self.first_bin, self.last_bin)?;
        }
        if fx.len() != self.dy.len() {
            return Err(SansError::DimensionMismatch(format!(
                "invalid error array {} <> {}",
                self.dy.len(),
                fx.len()
            )));
        }
        Ok(fx)
    }

    fn weighted_residuals(&self, params: &ParameterSet) -> Result<Array1<f64>> {
        let fx = self.model_curve(params)?;
        Ok((0..self.data.len())
            .filter(|&k| self.idx[k])
            .map(|k| (self.data.i[k] - fx[k]) / self.dy[k])
            .collect())
    }

    /// Model parameters with `free` written into the free slots.
    fn trial_parameters(&self, free: &Array1<f64>) -> Result<ParameterSet> {
        let mut params = self.model.parameters().clone();
        params.set_free_values(free)?;
        Ok(params)
    }

    /// Residuals at the model's current parameters.
    pub fn residuals(&self) -> Result<Array1<f64>> {
        self.weighted_residuals(self.model.parameters())
    }

    /// Unreduced chi-square at the model's current parameters.
    pub fn chi2(&self) -> Result<f64> {
        Ok(self.residuals()?.iter().map(|r| r * r).sum())
    }

    /// Q and model intensity over the fit window, at the current parameters.
    pub fn get_model_distribution(&self) -> Result<(Array1<f64>, Array1<f64>)> {
        let fx = self.model_curve(self.model.parameters())?;
        let inside = (0..self.data.len()).filter(|&k| self.idx[k]);
        let (x, y): (Vec<f64>, Vec<f64>) = inside.map(|k| (self.data.q[k], fx[k])).unzip();
        Ok((Array1::from(x), Array1::from(y)))
    }

    /// Fit the free parameters, starting from their current values.
    ///
    /// Best-fit values and standard errors are written back into the model
    /// whether or not the solver converged; the report says which.
    pub fn fit(&mut self, config: &FitConfig) -> Result<FitReport> {
        let names = self.model.parameters().free_names();
        if names.is_empty() {
            return Err(SansError::InvalidInput(
                "no parameter is selected for fitting".to_string(),
            ));
        }
        self.step_epsilon = config.step_epsilon;

        let mut lm_config = config.lm.clone();
        lm_config.calc_jacobian = true;
        let solver = LevenbergMarquardt::with_config(lm_config);
        let initial = self.model.parameters().free_values();
        let result = solver.minimize(&*self, initial)?;

        self.model.parameters_mut().set_free_values(&result.params)?;
        let chi2 = result.cost;
        let n_points = result.residuals.len();

        let jacobian: Array2<f64> = match result.jacobian {
            Some(j) => j,
            None => self.jacobian(&result.params)?,
        };
        let scale = if config.scale_covariance {
            reduced_chi_square(chi2, n_points, names.len()).unwrap_or(1.0)
        } else {
            1.0
        };
        let covariance = calculate_covariance(&jacobian, scale)?;

        let values: Vec<f64> = result.params.to_vec();
        let errors: Vec<Option<f64>> = match &covariance {
            Some(cov) => standard_errors_from_covariance(cov)
                .into_iter()
                .zip(&values)
                .map(|(err, &v)| err.or_else(|| config.stderr_fallback.apply(v)))
                .collect(),
            None => {
                warn!("covariance unavailable, applying {:?} error fallback", config.stderr_fallback);
                values.iter().map(|&v| config.stderr_fallback.apply(v)).collect()
            }
        };

        for (name, err) in names.iter().zip(&errors) {
            if let Some(param) = self.model.parameters_mut().get_mut(name) {
                param.error = *err;
            }
        }

        if result.success {
            info!(chi2, iterations = result.iterations, status = ?result.status, "fit finished");
        } else {
            warn!(chi2, iterations = result.iterations, status = ?result.status, "fit did not converge");
        }

        Ok(FitReport {
            names,
            values,
            errors,
            chi2,
            n_points,
            correlation: covariance.as_ref().map(calculate_correlation),
            covariance,
            status: result.status,
            iterations: result.iterations,
            func_evals: result.func_evals,
            message: result.message,
        })
    }
}

impl Problem for CurveFitEngine<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let trial = self.trial_parameters(params)?;
        self.weighted_residuals(&trial)
    }

    fn parameter_count(&self) -> usize {
        self.model.parameters().iter().filter(|p| !p.is_fixed).count()
    }

    fn residual_count(&self) -> usize {
        self.n_points()
    }

    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        finite_difference::jacobian(self, params, Some(self.step_epsilon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{create_model, ModelId};
    use crate::smearing::PointSmearer;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    fn line_model(a: f64, b: f64) -> Box<dyn ScatteringModel> {
        let mut model = create_model(ModelId::Line.id()).unwrap();
        model.set_param("A", a).unwrap();
        model.set_param("B", b).unwrap();
        model
    }

    fn ramp() -> Dataset1D {
        let x = Array1::range(0.0, 10.0, 1.0);
        Dataset1D::new(x.clone(), x).unwrap()
    }

    #[test]
    fn test_chi2_of_zero_model() {
        let data = ramp();
        let engine = CurveFitEngine::new(line_model(0.0, 0.0), &data, None, None, None).unwrap();
        let expected: f64 = data.i.iter().map(|y| y * y).sum();
        assert_relative_eq!(engine.chi2().unwrap(), expected);
    }

    #[test]
    fn test_window_selects_residuals() {
        let data = ramp();
        let engine =
            CurveFitEngine::new(line_model(1.0, 0.0), &data, None, Some(2.0), Some(5.5)).unwrap();
        assert_eq!(engine.residuals().unwrap().len(), 4);
        let (x, y) = engine.get_model_distribution().unwrap();
        assert_eq!(x.to_vec(), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(y.to_vec(), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_empty_window_rejected() {
        let data = ramp();
        let err = CurveFitEngine::new(line_model(1.0, 0.0), &data, None, Some(20.0), Some(30.0));
        assert!(matches!(err, Err(SansError::NoUsableData(_))));
    }

    #[test]
    fn test_zero_errors_become_unit_errors() {
        let data = ramp().with_errors(Array1::zeros(10));
        let engine = CurveFitEngine::new(line_model(0.0, 1.0), &data, None, None, None).unwrap();
        let r = engine.residuals().unwrap();
        assert_eq!(r[0], -1.0);
        assert_eq!(r[9], 8.0);
    }

    #[test]
    fn test_errors_weight_residuals() {
        let data = ramp().with_errors(Array1::from_elem(10, 2.0));
        let engine = CurveFitEngine::new(line_model(0.0, 0.0), &data, None, None, None).unwrap();
        assert_eq!(engine.residuals().unwrap()[4], 2.0);
    }

    #[test]
    fn test_smearing_widens_evaluation() {
        let data = ramp();
        let smearer = PointSmearer::new(&data.q, &Array1::from_elem(10, 1.0)).unwrap();
        let engine = CurveFitEngine::new(
            line_model(1.0, 0.0),
            &data,
            Some(SmearingKernel::Point(smearer)),
            Some(4.0),
            Some(5.0),
        )
        .unwrap();
        assert_eq!(engine.n_points(), 2);
        assert!(engine.idx_unsmeared.iter().filter(|&&k| k).count() > 2);
        // A straight line is unchanged by a symmetric kernel away from the ends.
        let (_, y) = engine.get_model_distribution().unwrap();
        assert_relative_eq!(y[0], 4.0, epsilon = 1e-12);
        assert_relative_eq!(y[1], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_smearer_length_checked() {
        let data = ramp();
        let q = Array1::range(0.0, 5.0, 1.0);
        let smearer = PointSmearer::new(&q, &Array1::zeros(5)).unwrap();
        let err = CurveFitEngine::new(
            line_model(1.0, 0.0),
            &data,
            Some(SmearingKernel::Point(smearer)),
            None,
            None,
        );
        assert!(matches!(err, Err(SansError::DimensionMismatch(_))));
    }

    #[test]
    fn test_fit_line() {
        let x = Array1::range(0.0, 13.0, 1.0);
        let data = Dataset1D::new(x.clone(), x).unwrap();
        let mut model = line_model(1.0, 1.0);
        for name in ["A", "B"] {
            model.parameters_mut().get_mut(name).unwrap().is_fixed = false;
        }
        let mut engine = CurveFitEngine::new(model, &data, None, None, None).unwrap();
        let report = engine.fit(&FitConfig::default()).unwrap();

        assert!(report.converged(), "{}", report.message);
        assert_relative_eq!(report.values[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(report.values[1], 0.0, epsilon = 1e-6);
        assert!(report.chi2 < 1e-10);
        assert!(report.covariance.is_some());
        assert_eq!(engine.model().get_param("A").unwrap(), report.values[0]);
        assert!(engine.model().parameters().get("A").unwrap().error.is_some());
    }

    #[test]
    fn test_fit_without_free_parameters() {
        let data = ramp();
        let mut engine = CurveFitEngine::new(line_model(1.0, 0.0), &data, None, None, None).unwrap();
        assert!(matches!(
            engine.fit(&FitConfig::default()),
            Err(SansError::InvalidInput(_))
        ));
    }
}
