//! Regularized linear inversion of I(Q) into P(r).
//!
//! The coefficients of the sine basis solve the stacked least-squares system
//!
//! ```text
//! | Φ(q) / σ          |       | I / σ |
//! | √α · Δr · φ''(r)  | c  =  |   0   |
//! ```
//!
//! where the lower block penalizes the curvature of P(r) on a grid of
//! `reg_points` radii. An optional leading column of `1/σ` fits a flat
//! background.

use nalgebra::{DMatrix, DVector};
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::basis::{
    ortho, ortho_derived, ortho_second_derived, ortho_transformed, ortho_transformed_smeared,
};
use super::config::InversionConfig;
use crate::error::{Result, SansError};
use crate::utils::linalg::{lstsq_svd, pseudo_inverse};
use crate::utils::matrix_convert::{
    faer_to_nalgebra, nalgebra_to_ndarray, nalgebra_vec_to_ndarray, ndarray_to_faer,
    ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

/// Settings of one inversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InversionParams {
    /// Largest distance in the particle
    pub d_max: f64,
    /// Number of basis functions
    pub n_terms: usize,
    /// Weight of the smoothness penalty
    pub alpha: f64,
    pub q_min: Option<f64>,
    pub q_max: Option<f64>,
    pub slit_height: f64,
    pub slit_width: f64,
    /// Fit a flat background along with P(r)
    pub has_bck: bool,
}

impl Default for InversionParams {
    fn default() -> Self {
        Self {
            d_max: 140.0,
            n_terms: 10,
            alpha: 1e-4,
            q_min: None,
            q_max: None,
            slit_height: 0.0,
            slit_width: 0.0,
            has_bck: false,
        }
    }
}

impl InversionParams {
    /// Whether `q` lies inside the optional Q window.
    pub fn accept_q(&self, q: f64) -> bool {
        self.q_min.map_or(true, |lo| q >= lo) && self.q_max.map_or(true, |hi| q <= hi)
    }

    pub fn is_smeared(&self) -> bool {
        self.slit_height > 0.0 || self.slit_width > 0.0
    }

    fn validate(&self) -> Result<()> {
        if !(self.d_max > 0.0) {
            return Err(SansError::InvalidParameter(format!(
                "D_max must be positive, got {}",
                self.d_max
            )));
        }
        if self.n_terms == 0 {
            return Err(SansError::InvalidParameter(
                "at least one basis function is needed".to_string(),
            ));
        }
        Ok(())
    }
}

/// Coefficients and covariance of one inversion, with the quantities
/// derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct PrSolution {
    pub d_max: f64,
    /// Basis coefficients, `coefficients[k]` multiplies `φ_{k+1}`
    pub coefficients: Array1<f64>,
    pub covariance: Array2<f64>,
    pub background: f64,
    /// Chi-square over the data rows only
    pub chi2: f64,
    /// Alpha that would balance the data and penalty terms
    pub suggested_alpha: f64,
    /// Data points inside the Q window
    pub n_points: usize,
    slit_height: f64,
    slit_width: f64,
    slice_points: usize,
    peak_points: usize,
    smear_points: usize,
}

impl PrSolution {
    fn terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.coefficients.iter().enumerate().map(|(k, &c)| (k + 1, c))
    }

    /// P(r).
    pub fn pr(&self, r: f64) -> f64 {
        self.terms().map(|(n, c)| c * ortho(self.d_max, n, r)).sum()
    }

    /// P(r) and its standard deviation from the coefficient covariance.
    pub fn pr_err(&self, r: f64) -> (f64, f64) {
        let basis: Array1<f64> = (1..=self.coefficients.len())
            .map(|n| ortho(self.d_max, n, r))
            .collect();
        let variance = basis.dot(&self.covariance.dot(&basis));
        (self.pr(r), variance.abs().sqrt())
    }

    /// dP/dr.
    pub fn dpr_dr(&self, r: f64) -> f64 {
        self.terms().map(|(n, c)| c * ortho_derived(self.d_max, n, r)).sum()
    }

    /// Unsmeared model intensity, background included.
    pub fn iq(&self, q: f64) -> f64 {
        let sum: f64 = self.terms().map(|(n, c)| c * ortho_transformed(self.d_max, n, q)).sum();
        sum + self.background
    }

    /// Slit-smeared model intensity, background included.
    pub fn iq_smeared(&self, q: f64) -> f64 {
        let sum: f64 = self
            .terms()
            .map(|(n, c)| {
                c * ortho_transformed_smeared(
                    self.d_max,
                    n,
                    q,
                    self.slit_height,
                    self.slit_width,
                    self.smear_points,
                )
            })
            .sum();
        sum + self.background
    }

    /// Model intensity as measured: smeared when the inversion used a slit.
    pub fn iq_calc(&self, q: f64) -> f64 {
        if self.slit_height > 0.0 || self.slit_width > 0.0 {
            self.iq_smeared(q)
        } else {
            self.iq(q)
        }
    }

    /// Extrapolated I(Q = 0), without background.
    pub fn iq0(&self) -> f64 {
        self.terms().map(|(n, c)| c * ortho_transformed(self.d_max, n, 0.0)).sum()
    }

    fn slices(&self, count: usize) -> impl Iterator<Item = f64> + '_ {
        let dr = self.d_max / count as f64;
        (0..count).map(move |i| dr * i as f64)
    }

    /// Radius of gyration, `sqrt(∫r²P / 2∫P)`.
    pub fn rg(&self) -> f64 {
        let (sum, sum_r2) = self.slices(self.slice_points).fold((0.0, 0.0), |(s, s2), r| {
            let p = self.pr(r);
            (s + p, s2 + r * r * p)
        });
        (sum_r2 / (2.0 * sum)).sqrt()
    }

    /// `sqrt(∫P'² / ∫P²) · D/π`; about one for a single smooth peak.
    pub fn oscillations(&self) -> f64 {
        let (p2, dp2) = self.slices(self.slice_points).fold((0.0, 0.0), |(a, b), r| {
            let p = self.pr(r);
            let dp = self.dpr_dr(r);
            (a + p * p, b + dp * dp)
        });
        (dp2 / p2).sqrt() * self.d_max / std::f64::consts::PI
    }

    /// Share of `∫|P|` coming from positive P.
    pub fn positive_fraction(&self) -> f64 {
        let (pos, total) = self.slices(self.slice_points).fold((0.0, 0.0), |(pos, total), r| {
            let p = self.pr(r);
            (if p > 0.0 { pos + p } else { pos }, total + p.abs())
        });
        pos / total
    }

    /// Share of `∫|P|` coming from P more than one standard deviation above zero.
    pub fn positive_fraction_1sigma(&self) -> f64 {
        let (pos, total) = self.slices(self.slice_points).fold((0.0, 0.0), |(pos, total), r| {
            let (p, err) = self.pr_err(r);
            (if p > err { pos + p } else { pos }, total + p.abs())
        });
        pos / total
    }

    /// Number of local maxima of P(r) on the peak grid.
    pub fn peaks(&self) -> usize {
        let mut previous = 0.0;
        let mut rising = false;
        let mut count = 0;
        for r in self.slices(self.peak_points) {
            let value = self.pr(r);
            if previous <= value {
                rising = true;
            } else {
                if rising {
                    count += 1;
                }
                rising = false;
            }
            previous = value;
        }
        count
    }
}

/// Stacked system of one inversion.
struct DesignMatrix {
    a: Array2<f64>,
    b: Array1<f64>,
    n_points: usize,
}

/// Inversion over one prepared data set (Q > 0, positive errors).
#[derive(Debug, Clone)]
pub struct Invertor {
    x: Array1<f64>,
    y: Array1<f64>,
    err: Array1<f64>,
    config: InversionConfig,
}

impl Invertor {
    pub fn new(x: Array1<f64>, y: Array1<f64>, err: Array1<f64>, config: InversionConfig) -> Result<Self> {
        if x.len() != y.len() || x.len() != err.len() {
            return Err(SansError::DataShape(format!(
                "Q, I and error arrays have {}, {} and {} points",
                x.len(),
                y.len(),
                err.len()
            )));
        }
        if x.is_empty() {
            return Err(SansError::NoUsableData("no points with Q > 0".to_string()));
        }
        if x.iter().any(|&q| !(q > 0.0)) {
            return Err(SansError::InvalidInput("inversion needs Q > 0".to_string()));
        }
        if err.iter().any(|&e| !(e > 0.0)) {
            return Err(SansError::InvalidInput(
                "error bars must be positive".to_string(),
            ));
        }
        Ok(Self { x, y, err, config })
    }

    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn err(&self) -> &Array1<f64> {
        &self.err
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn config(&self) -> &InversionConfig {
        &self.config
    }

    fn transform(&self, params: &InversionParams, n: usize, q: f64) -> f64 {
        if params.is_smeared() {
            ortho_transformed_smeared(
                params.d_max,
                n,
                q,
                params.slit_height,
                params.slit_width,
                self.config.smear_points,
            )
        } else {
            ortho_transformed(params.d_max, n, q)
        }
    }

    fn design_matrix(&self, params: &InversionParams, alpha: f64) -> Result<DesignMatrix> {
        let accepted: Vec<usize> = (0..self.len()).filter(|&k| params.accept_q(self.x[k])).collect();
        if accepted.is_empty() {
            return Err(SansError::NoUsableData(
                "no data points inside the Q window".to_string(),
            ));
        }

        let offset = usize::from(params.has_bck);
        let n_cols = params.n_terms + offset;
        let nr = self.config.reg_points;
        let n_points = accepted.len();
        let mut a = Array2::zeros((n_points + nr, n_cols));
        let mut b = Array1::zeros(n_points + nr);

        for (row, &k) in accepted.iter().enumerate() {
            let (q, sigma) = (self.x[k], self.err[k]);
            if params.has_bck {
                a[[row, 0]] = 1.0 / sigma;
            }
            for n in 1..=params.n_terms {
                a[[row, n - 1 + offset]] = self.transform(params, n, q) / sigma;
            }
            b[row] = self.y[k] / sigma;
        }

        let sqrt_alpha = alpha.abs().sqrt();
        let dr = params.d_max / nr as f64;
        for i in 0..nr {
            let r = dr * i as f64;
            for n in 1..=params.n_terms {
                a[[n_points + i, n - 1 + offset]] =
                    sqrt_alpha * dr * ortho_second_derived(params.d_max, n, r);
            }
        }
        Ok(DesignMatrix { a, b, n_points })
    }

    /// Size of the data and penalty blocks, `(Σ a_data², Σ a_reg²)`.
    fn block_sizes(design: &DesignMatrix) -> (f64, f64) {
        let data = design.a.slice(s![..design.n_points, ..]);
        let reg = design.a.slice(s![design.n_points.., ..]);
        (
            data.iter().map(|v| v * v).sum(),
            reg.iter().map(|v| v * v).sum(),
        )
    }

    /// Alpha at which the penalty block is as large as the data block.
    pub fn reference_alpha(&self, params: &InversionParams) -> Result<f64> {
        params.validate()?;
        let (sum_sig, sum_reg) = Self::block_sizes(&self.design_matrix(params, 1.0)?);
        Ok(if sum_reg > 0.0 { sum_sig / sum_reg } else { 0.0 })
    }

    /// Solve for the coefficients.
    pub fn invert(&self, params: &InversionParams) -> Result<PrSolution> {
        params.validate()?;
        let design = self.design_matrix(params, params.alpha)?;
        let n_cols = design.a.ncols();

        let a: DMatrix<f64> = ndarray_to_nalgebra(&design.a)?;
        let b: DVector<f64> = ndarray_vec_to_nalgebra(&design.b)?;
        let c = lstsq_svd(&a, &b)?;

        let residuals = &a * &c - &b;
        let chi2_full = residuals.norm_squared();
        let chi2 = residuals.rows(0, design.n_points).norm_squared();

        let dof = design.n_points as f64 - n_cols as f64;
        let scale = if dof != 0.0 { (chi2_full / dof).abs() } else { chi2_full };
        let covariance = match Self::normal_matrix(&design.a).and_then(|m| pseudo_inverse(&m)) {
            Ok(inv) => nalgebra_to_ndarray(&(inv * scale))?,
            Err(e) => {
                warn!(error = %e, "could not estimate coefficient errors");
                Array2::zeros((n_cols, n_cols))
            }
        };

        let (sum_sig, sum_reg) = Self::block_sizes(&design);
        let suggested_alpha = if params.alpha.abs() > 0.0 && sum_reg > 0.0 {
            sum_sig / (sum_reg / params.alpha)
        } else {
            0.0
        };

        let c = nalgebra_vec_to_ndarray(&c)?;
        let offset = usize::from(params.has_bck);
        let background = if params.has_bck { c[0] } else { 0.0 };
        debug!(
            d_max = params.d_max,
            n_terms = params.n_terms,
            alpha = params.alpha,
            chi2,
            "inverted"
        );

        Ok(PrSolution {
            d_max: params.d_max,
            coefficients: c.slice(s![offset..]).to_owned(),
            covariance: covariance.slice(s![offset.., offset..]).to_owned(),
            background,
            chi2,
            suggested_alpha,
            n_points: design.n_points,
            slit_height: params.slit_height,
            slit_width: params.slit_width,
            slice_points: self.config.slice_points,
            peak_points: self.config.peak_points,
            smear_points: self.config.smear_points,
        })
    }

    /// `AᵀA` through faer.
    fn normal_matrix(a: &Array2<f64>) -> Result<DMatrix<f64>> {
        let a = ndarray_to_faer(a)?;
        let ata = a.transpose() * &a;
        faer_to_nalgebra(&ata)
    }
}
