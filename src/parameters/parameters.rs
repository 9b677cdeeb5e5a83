//! Ordered parameter collections.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::parameter::{ModelParameter, ParameterInfo};
use crate::error::{Result, SansError};

/// The full, ordered parameter list of one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    params: Vec<ModelParameter>,
}

impl ParameterSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set of fixed parameters at their catalog defaults.
    pub fn from_defaults(infos: &[ParameterInfo]) -> Self {
        Self {
            params: infos.iter().map(ParameterInfo::to_parameter).collect(),
        }
    }

    /// Append a parameter, replacing any parameter of the same name in place.
    pub fn push(&mut self, param: ModelParameter) {
        match self.get_mut(&param.name) {
            Some(existing) => *existing = param,
            None => self.params.push(param),
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelParameter> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ModelParameter> {
        self.params.iter_mut()
    }

    pub fn as_slice(&self) -> &[ModelParameter] {
        &self.params
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&ModelParameter> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModelParameter> {
        self.params.iter_mut().find(|p| p.name == name)
    }

    /// Value of the named parameter.
    pub fn value(&self, name: &str) -> Result<f64> {
        self.get(name)
            .map(|p| p.value)
            .ok_or_else(|| SansError::ParameterNotFound(name.to_string()))
    }

    /// Overwrite the value of the named parameter.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<()> {
        let param = self
            .get_mut(name)
            .ok_or_else(|| SansError::ParameterNotFound(name.to_string()))?;
        param.value = value;
        Ok(())
    }

    /// Parameter names in order.
    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }

    /// Parameter values in order.
    pub fn values(&self) -> Array1<f64> {
        self.params.iter().map(|p| p.value).collect()
    }

    /// Names of the free parameters, in order.
    pub fn free_names(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| !p.is_fixed)
            .map(|p| p.name.clone())
            .collect()
    }

    /// Values of the free parameters, in order.
    pub fn free_values(&self) -> Array1<f64> {
        self.params
            .iter()
            .filter(|p| !p.is_fixed)
            .map(|p| p.value)
            .collect()
    }

    /// Whether at least one parameter is free.
    pub fn has_free(&self) -> bool {
        self.params.iter().any(|p| !p.is_fixed)
    }

    /// Write `values` into the free parameters, in order.
    pub fn set_free_values(&mut self, values: &Array1<f64>) -> Result<()> {
        let n_free = self.params.iter().filter(|p| !p.is_fixed).count();
        if values.len() != n_free {
            return Err(SansError::DimensionMismatch(format!(
                "Expected {} free parameter values, got {}",
                n_free,
                values.len()
            )));
        }
        for (param, value) in self.params.iter_mut().filter(|p| !p.is_fixed).zip(values.iter()) {
            param.value = *value;
        }
        Ok(())
    }

    /// Merge a partial parameter list by name.
    ///
    /// Known names take the incoming value, error and fixed flag; unknown
    /// names are ignored. Returns how many parameters were updated.
    pub fn merge(&mut self, incoming: &[ModelParameter]) -> usize {
        let mut merged = 0;
        for param in incoming {
            if let Some(existing) = self.get_mut(&param.name) {
                existing.value = param.value;
                existing.error = param.error;
                existing.is_fixed = param.is_fixed;
                merged += 1;
            }
        }
        merged
    }

    /// Drop all standard errors.
    pub fn clear_errors(&mut self) {
        self.params.iter_mut().for_each(|p| p.error = None);
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.params {
            writeln!(f, "  {}", p)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a ModelParameter;
    type IntoIter = std::slice::Iter<'a, ModelParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
