//! Individual model parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named model parameter.
///
/// `is_fixed == false` marks the parameter as a free fit variable. Freshly
/// created parameters are fixed, so nothing is fitted unless asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameter {
    /// Short name, unique within a model
    pub name: String,

    /// Current value
    pub value: f64,

    /// Standard error from the last fit, if any
    pub error: Option<f64>,

    /// Whether the optimizer must leave this parameter alone
    pub is_fixed: bool,
}

impl ModelParameter {
    /// Create a fixed parameter with no error.
    ///
    /// # Examples
    ///
    /// ```
    /// use sansfit_rs::parameters::ModelParameter;
    ///
    /// let p = ModelParameter::new("scale", 1.0);
    /// assert!(p.is_fixed);
    /// assert_eq!(p.error, None);
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            error: None,
            is_fixed: true,
        }
    }

    /// Create a free parameter.
    pub fn free(name: &str, value: f64) -> Self {
        Self {
            is_fixed: false,
            ..Self::new(name, value)
        }
    }

    /// Set the standard error.
    pub fn with_error(mut self, error: f64) -> Self {
        self.error = Some(error);
        self
    }
}

impl fmt::Display for ModelParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)?;
        if let Some(err) = self.error {
            write!(f, " +- {}", err)?;
        }
        if !self.is_fixed {
            write!(f, " (free)")?;
        }
        Ok(())
    }
}

/// Static description of a parameter in the model catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub long_name: &'static str,
    pub units: &'static str,
    pub default: f64,
}

impl ParameterInfo {
    pub const fn new(name: &'static str, long_name: &'static str, units: &'static str, default: f64) -> Self {
        Self {
            name,
            long_name,
            units,
            default,
        }
    }

    /// A fixed parameter at the catalog default.
    pub fn to_parameter(&self) -> ModelParameter {
        ModelParameter::new(self.name, self.default)
    }
}
