//! # Model Fitting
//!
//! Nonlinear least-squares fitting of scattering models to 1-D data.
//!
//! - [`CurveFitEngine`]: residuals, chi-square and the fit itself over a Q window
//! - [`FitProblem`]: the persistent description of a fit and its last result
//! - [`FitConfig`]: solver and error-reporting options
//!
//! ```
//! use ndarray::Array1;
//! use sansfit_rs::data::Dataset1D;
//! use sansfit_rs::fit::{FitConfig, FitProblem};
//! use sansfit_rs::models::ModelId;
//!
//! let x = Array1::range(0.0, 13.0, 1.0);
//! let data = Dataset1D::new(x.clone(), x).unwrap();
//!
//! let mut problem = FitProblem::new(ModelId::Line).unwrap();
//! problem.set_parameter("A", 1.0, true).unwrap();
//! problem.set_parameter("B", 1.0, true).unwrap();
//!
//! let report = problem.perform_fit(&data, &FitConfig::default()).unwrap();
//! assert!(report.converged());
//! assert!(report.chi2 < 1e-10);
//! ```

mod config;
mod engine;
mod flat_map;
mod problem;
mod report;

pub use config::{FitConfig, StderrFallback};
pub use engine::CurveFitEngine;
pub use flat_map::{checked_key, error_key, fit_problem_from_flat_map};
pub use problem::{FitProblem, ModelCurve};
pub use report::FitReport;
