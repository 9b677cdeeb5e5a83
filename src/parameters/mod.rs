//! # Parameter System
//!
//! Named model parameters with a value, an optional standard error and a
//! fixed/free flag. A [`ParameterSet`] keeps the full, ordered parameter list
//! of one model; partial lists coming from storage or user input are merged
//! into it by name and never replace it.
//!
//! ## Example Usage
//!
//! ```rust
//! use sansfit_rs::parameters::{ModelParameter, ParameterSet};
//!
//! let mut params = ParameterSet::new();
//! params.push(ModelParameter::new("radius", 60.0));
//! params.push(ModelParameter::new("background", 0.0));
//!
//! // Only free parameters reach the optimizer
//! params.get_mut("radius").unwrap().is_fixed = false;
//! assert_eq!(params.free_names(), vec!["radius".to_string()]);
//!
//! // Merging by name leaves unknown names alone
//! let merged = params.merge(&[ModelParameter::new("radius", 45.0), ModelParameter::new("theta", 1.0)]);
//! assert_eq!(merged, 1);
//! assert_eq!(params.value("radius").unwrap(), 45.0);
//! ```

pub mod parameter;
pub mod parameters;

pub use parameter::{ModelParameter, ParameterInfo};
pub use parameters::ParameterSet;
