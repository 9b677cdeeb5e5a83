//! Levenberg-Marquardt algorithm implementation.
//!
//! Damped Gauss-Newton iterations with Marquardt diagonal scaling and a
//! gain-ratio controlled damping parameter. The solver works on anything that
//! implements [`crate::problem::Problem`] and reports how it terminated through
//! [`ConvergenceStatus`], so callers can tell a converged fit from one that
//! ran out of iterations.

pub mod algorithm;
pub mod config;
pub mod convergence;
pub mod trust_region;

pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::LmConfig;
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
pub use trust_region::TrustRegion;
