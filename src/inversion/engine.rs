//! Calculation facade over [`Invertor`]: data preparation, user messages
//! and the curves shown next to an inversion.

use ndarray::Array1;
use tracing::{info, warn};

use super::config::InversionConfig;
use super::estimator::{estimate_numterms, TermEstimate};
use super::explorer::{self, DmaxExploration};
use super::invertor::{InversionParams, Invertor, PrSolution};
use super::record::InversionOutput;
use crate::data::Dataset1D;
use crate::error::{Result, SansError};

pub const NO_ERROR_BARS: &str =
    "The loaded file had no error bars, statistical errors are assumed.";

/// User message for `count` dropped points with Q <= 0.
pub fn skipped_message(count: usize) -> Option<String> {
    match count {
        0 => None,
        1 => Some("A q-value was skipped because it was negative or equal to zero.".to_string()),
        n => Some(format!(
            "{} q-values were skipped because they were negative or equal to zero.",
            n
        )),
    }
}

/// Error bars assumed for data that has none.
pub fn statistical_errors(i: &Array1<f64>) -> Array1<f64> {
    let i0 = i.get(0).copied().unwrap_or(0.0).abs();
    i.mapv(|v| 0.05 * i0.sqrt() * v.abs().sqrt() + 0.01 * i0)
}

/// Sampled curve `(x, y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct IqCurve {
    pub q: Array1<f64>,
    pub i: Array1<f64>,
}

/// P(r) with its error band.
#[derive(Debug, Clone, PartialEq)]
pub struct PrCurve {
    pub r: Array1<f64>,
    pub p: Array1<f64>,
    pub dp: Array1<f64>,
}

/// Everything produced by one inversion.
#[derive(Debug, Clone)]
pub struct InversionResult {
    /// Model intensity at the data Q values
    pub iq: IqCurve,
    pub pr: PrCurve,
    pub output: InversionOutput,
    pub solution: PrSolution,
}

/// Runs inversions for one set of parameters and collects the messages meant
/// for the user.
#[derive(Debug, Clone, Default)]
pub struct InversionEngine {
    pub params: InversionParams,
    pub config: InversionConfig,
    /// Informational messages
    pub messages: Vec<String>,
    /// Failures that did not stop the calculation
    pub errors: Vec<String>,
}

impl InversionEngine {
    pub fn new(params: InversionParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn with_config(params: InversionParams, config: InversionConfig) -> Self {
        Self {
            params,
            config,
            ..Self::default()
        }
    }

    fn note(&mut self, message: String) {
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }

    /// Drop points with Q <= 0 and fill in missing error bars. Messages and
    /// errors from the previous run are cleared.
    pub fn prepare(&mut self, data: &Dataset1D) -> Result<Invertor> {
        self.messages.clear();
        self.errors.clear();
        if let Some(di) = &data.di {
            if di.len() != data.len() {
                return Err(SansError::DataShape(format!(
                    "σI has {} points but Q has {}",
                    di.len(),
                    data.len()
                )));
            }
        }
        let (data, skipped) = data.positive_q();
        if let Some(message) = skipped_message(skipped) {
            warn!(skipped, "dropped points with Q <= 0");
            self.note(message);
        }
        if data.is_empty() {
            return Err(SansError::NoUsableData(
                "the data has no points with Q > 0".to_string(),
            ));
        }

        let err = match data.di {
            Some(di) => di,
            None => {
                self.note(NO_ERROR_BARS.to_string());
                statistical_errors(&data.i)
            }
        };
        Invertor::new(data.q, data.i, err, self.config.clone())
    }

    /// Invert `data` with the current parameters.
    pub fn invert(&mut self, data: &Dataset1D) -> Result<InversionResult> {
        let invertor = self.prepare(data)?;
        let solution = invertor.invert(&self.params)?;
        let output = InversionOutput::from_solution(&solution);
        info!(
            chi2 = solution.chi2,
            rg = ?output.rg,
            n_points = solution.n_points,
            "inversion complete"
        );
        let iq = self.get_iq_calc(&solution, &data.q);
        let pr = self.get_pr(&solution);
        Ok(InversionResult {
            iq,
            pr,
            output,
            solution,
        })
    }

    /// Model intensity at `q`, slit-smeared when the parameters set a slit.
    /// Q <= 0 gives zero and a skip message.
    pub fn get_iq_calc(&mut self, solution: &PrSolution, q: &Array1<f64>) -> IqCurve {
        let skipped = q.iter().filter(|&&v| v <= 0.0).count();
        if let Some(message) = skipped_message(skipped) {
            self.note(message);
        }
        let i = q.mapv(|v| if v > 0.0 { solution.iq_calc(v) } else { 0.0 });
        IqCurve { q: q.clone(), i }
    }

    /// P(r) on `pr_points` evenly spaced radii from 0 to D_max.
    pub fn get_pr(&self, solution: &PrSolution) -> PrCurve {
        let npts = self.config.pr_points;
        let step = if npts > 1 {
            solution.d_max / (npts - 1) as f64
        } else {
            0.0
        };
        let r = Array1::from_shape_fn(npts, |i| step * i as f64);
        let (p, dp): (Vec<f64>, Vec<f64>) = r.iter().map(|&r| solution.pr_err(r)).unzip();
        PrCurve {
            r,
            p: Array1::from(p),
            dp: Array1::from(dp),
        }
    }

    /// Propose a basis size and alpha for `data` at the current D_max.
    pub fn estimate(&mut self, data: &Dataset1D) -> Result<TermEstimate> {
        let invertor = self.prepare(data)?;
        let estimate = estimate_numterms(&invertor, &self.params)?;
        if let Some(message) = &estimate.message {
            self.note(message.clone());
        }
        info!(n_terms = estimate.n_terms, alpha = estimate.alpha, "estimated parameters");
        Ok(estimate)
    }

    /// Estimate and adopt the basis size and alpha.
    pub fn apply_estimate(&mut self, data: &Dataset1D) -> Result<TermEstimate> {
        let estimate = self.estimate(data)?;
        self.params.n_terms = estimate.n_terms;
        self.params.alpha = estimate.alpha;
        Ok(estimate)
    }

    /// Invert over a D_max grid. Bounds default to half and one and a half
    /// times the current D_max, the point count to `explore_points`.
    pub fn explore_dmax(
        &mut self,
        data: &Dataset1D,
        min: Option<f64>,
        max: Option<f64>,
        npts: Option<usize>,
    ) -> Result<DmaxExploration> {
        let invertor = self.prepare(data)?;
        let min = min.unwrap_or(0.5 * self.params.d_max);
        let max = max.unwrap_or(1.5 * self.params.d_max);
        let npts = npts.unwrap_or(self.config.explore_points);
        let exploration = explorer::explore_dmax(&invertor, &self.params, min, max, npts);
        for error in &exploration.errors {
            warn!(%error, "D_max point failed");
        }
        self.errors.extend(exploration.errors.iter().cloned());
        Ok(exploration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inversion::basis::ortho_transformed;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn data() -> Dataset1D {
        let q = Array1::linspace(0.01, 0.3, 60);
        let i = q.mapv(|q| ortho_transformed(100.0, 1, q) + 0.3 * ortho_transformed(100.0, 2, q));
        let di = i.mapv(|v: f64| 0.02 * v.abs() + 1.0);
        Dataset1D::new(q, i).unwrap().with_errors(di)
    }

    fn engine() -> InversionEngine {
        InversionEngine::new(InversionParams {
            d_max: 100.0,
            n_terms: 8,
            alpha: 1e-4,
            ..InversionParams::default()
        })
    }

    #[test]
    fn test_skip_messages() {
        assert_eq!(skipped_message(0), None);
        assert_eq!(
            skipped_message(1).unwrap(),
            "A q-value was skipped because it was negative or equal to zero."
        );
        assert_eq!(
            skipped_message(3).unwrap(),
            "3 q-values were skipped because they were negative or equal to zero."
        );
    }

    #[test]
    fn test_prepare_filters_and_assumes_errors() {
        let data = Dataset1D::new(array![-1.0, 0.0, 1.0, 2.0, 3.0], array![5.0, 5.0, 4.0, 1.0, 0.25]).unwrap();
        let mut engine = engine();
        let invertor = engine.prepare(&data).unwrap();
        assert_eq!(invertor.len(), 3);
        assert!(engine.messages.contains(&skipped_message(2).unwrap()));
        assert!(engine.messages.iter().any(|m| m == NO_ERROR_BARS));
        // I₀ is the first retained intensity
        assert_relative_eq!(invertor.err()[0], 0.05 * 2.0 * 2.0 + 0.04);
    }

    #[test]
    fn test_prepare_failures() {
        let mut engine = engine();
        let none_positive = Dataset1D::new(array![-1.0, 0.0], array![1.0, 1.0]).unwrap();
        assert!(matches!(engine.prepare(&none_positive), Err(SansError::NoUsableData(_))));
        let mismatched = data().with_errors(array![1.0]);
        assert!(matches!(engine.prepare(&mismatched), Err(SansError::DataShape(_))));
    }

    #[test]
    fn test_invert_outputs() {
        let mut engine = engine();
        let result = engine.invert(&data()).unwrap();
        assert_eq!(result.iq.q.len(), 60);
        assert_eq!(result.pr.r.len(), 50);
        assert_eq!(result.pr.r[0], 0.0);
        assert_relative_eq!(result.pr.r[49], 100.0);
        assert_eq!(result.output.n_terms(), 8);
        assert!(result.output.chi2.is_some());
        assert!(engine.messages.is_empty());
    }

    #[test]
    fn test_iq_calc_skips_non_positive() {
        let mut engine = engine();
        let result = engine.invert(&data()).unwrap();
        let curve = engine.get_iq_calc(&result.solution, &array![0.0, 0.05]);
        assert_eq!(curve.i[0], 0.0);
        assert_relative_eq!(curve.i[1], result.solution.iq(0.05));
        assert_eq!(engine.messages, vec![skipped_message(1).unwrap()]);
    }

    #[test]
    fn test_messages_reset_between_runs() {
        let mut engine = engine();
        let skipped = Dataset1D::new(array![-1.0, 0.0, 0.05, 0.1, 0.2], array![5.0, 5.0, 4.0, 2.0, 1.0])
            .unwrap()
            .with_errors(Array1::ones(5));
        engine.invert(&skipped).unwrap();
        assert_eq!(engine.messages, vec![skipped_message(2).unwrap()]);

        engine.invert(&data()).unwrap();
        assert!(engine.messages.is_empty());
    }

    #[test]
    fn test_iq_aligned_with_input() {
        let mut engine = engine();
        let q = array![0.0, 0.05, 0.1, 0.2];
        let data = Dataset1D::new(q.clone(), array![5.0, 4.0, 2.0, 1.0])
            .unwrap()
            .with_errors(Array1::ones(4));
        let result = engine.invert(&data).unwrap();
        assert_eq!(result.iq.q, q);
        assert_eq!(result.iq.i[0], 0.0);
        assert_relative_eq!(result.iq.i[2], result.solution.iq_calc(0.1));
        assert_eq!(engine.messages, vec![skipped_message(1).unwrap()]);
    }

    #[test]
    fn test_explore_defaults() {
        let mut engine = engine();
        engine.config = engine.config.clone().with_explore_points(3);
        let exploration = engine.explore_dmax(&data(), None, None, None).unwrap();
        assert_eq!(exploration.d_max(), vec![50.0, 100.0, 150.0]);
        assert!(engine.errors.is_empty());
    }
}
