//! # sansfit-rs
//!
//! Numerical core of a small-angle scattering analysis service:
//!
//! - Levenberg-Marquardt fitting of parametric scattering models to I(Q),
//!   optionally smeared by point or slit resolution, over a Q window
//! - Regularized inversion of I(Q) into the pair-distance distribution P(r),
//!   with estimation of the basis size and regularization weight and a sweep
//!   over D_max
//! - Fit and inversion records that round-trip through a flat key/value map
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::Array1;
//! use sansfit_rs::data::Dataset1D;
//! use sansfit_rs::fit::{FitConfig, FitProblem};
//! use sansfit_rs::models::ModelId;
//!
//! let q = Array1::linspace(0.005, 0.1, 40);
//! let i = q.mapv(|q| 200.0 * (-(q * 30.0_f64).powi(2) / 3.0).exp());
//! let data = Dataset1D::new(q, i).unwrap();
//!
//! let mut problem = FitProblem::new(ModelId::Guinier).unwrap();
//! problem.set_parameter("scale", 150.0, true).unwrap();
//! problem.set_parameter("rg", 25.0, true).unwrap();
//! let report = problem.perform_fit(&data, &FitConfig::default()).unwrap();
//! let (rg, _) = report.get("rg").unwrap();
//! assert!((rg - 30.0).abs() < 1e-4);
//! ```

pub mod error;

pub mod flat_map;
pub mod parameters;
pub mod problem;
pub mod utils;

pub mod lm;
pub mod uncertainty;

pub mod data;
pub mod model;
pub mod models;

pub mod fit;
pub mod inversion;
pub mod smearing;

// Re-exports for convenience
pub use data::Dataset1D;
pub use error::{Result, SansError};
pub use fit::{CurveFitEngine, FitConfig, FitProblem, FitReport};
pub use inversion::{InversionEngine, InversionOutput, InversionParams, InversionProblem};
pub use lm::LevenbergMarquardt;
pub use model::ScatteringModel;
pub use models::ModelId;
pub use problem::Problem;
pub use smearing::{SmearAdapter, SmearingAdapter, SmearingSelection};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
