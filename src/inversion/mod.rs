//! # P(r) Inversion
//!
//! Recovers the pair-distance distribution P(r) from I(Q) by a regularized
//! expansion in the sine basis of [`basis`].
//!
//! - [`Invertor`] holds prepared data and solves for one set of [`InversionParams`]
//! - [`InversionEngine`] prepares raw data, collects user messages and
//!   produces the displayed curves
//! - [`estimate_numterms`] / [`estimate_alpha`] propose the basis size and
//!   regularization weight
//! - [`explore_dmax`] sweeps D_max
//! - [`InversionProblem`] and [`InversionOutput`] are the stored records
//!
//! ```
//! use ndarray::Array1;
//! use sansfit_rs::data::Dataset1D;
//! use sansfit_rs::inversion::{basis, InversionEngine, InversionParams};
//!
//! let q = Array1::linspace(0.01, 0.3, 50);
//! let i = q.mapv(|q| basis::ortho_transformed(80.0, 1, q));
//! let data = Dataset1D::new(q, i).unwrap();
//!
//! let mut engine = InversionEngine::new(InversionParams {
//!     d_max: 80.0,
//!     n_terms: 6,
//!     alpha: 0.0,
//!     ..InversionParams::default()
//! });
//! let result = engine.invert(&data).unwrap();
//! assert!((result.solution.coefficients[0] - 1.0).abs() < 1e-6);
//! ```

pub mod basis;
mod config;
mod engine;
mod estimator;
mod explorer;
mod invertor;
mod record;

pub use config::InversionConfig;
pub use engine::{
    skipped_message, statistical_errors, InversionEngine, InversionResult, IqCurve, PrCurve,
    NO_ERROR_BARS,
};
pub use estimator::{estimate_alpha, estimate_numterms, AlphaEstimate, TermEstimate, ALPHA_TOO_LARGE};
pub use explorer::{dmax_grid, explore_dmax, DmaxExploration, DmaxPoint};
pub use invertor::{InversionParams, Invertor, PrSolution};
pub use record::{CoefficientKind, CoefficientRecord, InversionOutput, InversionProblem};
