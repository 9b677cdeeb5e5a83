//! # Uncertainty Calculation
//!
//! Covariance, correlation and standard errors for fitted parameters.

mod covariance;

pub use covariance::{
    calculate_correlation, calculate_covariance, linear_variance, reduced_chi_square,
    standard_errors_from_covariance,
};
