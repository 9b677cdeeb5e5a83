//! Flat key-value parameter maps.
//!
//! Fit and inversion records cross the storage and form boundary as a flat
//! map of string keys to scalar values. Key names are part of that contract
//! and must not change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// Scalar stored under one flat-map key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlatValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// String-keyed map with deterministic key order.
pub type FlatMap = BTreeMap<String, FlatValue>;

impl FlatValue {
    /// Numeric view; text is parsed, booleans are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FlatValue::Int(i) => Some(*i as f64),
            FlatValue::Float(f) => Some(*f),
            FlatValue::Text(s) => s.trim().parse().ok(),
            FlatValue::Null | FlatValue::Bool(_) => None,
        }
    }

    /// Integer view; floats must be integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FlatValue::Int(i) => Some(*i),
            FlatValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            FlatValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Checkbox semantics: `true`, non-zero integers and "on"/"true"/"1" are set.
    pub fn as_bool(&self) -> bool {
        match self {
            FlatValue::Bool(b) => *b,
            FlatValue::Int(i) => *i != 0,
            FlatValue::Float(f) => *f != 0.0,
            FlatValue::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "on" | "true" | "1"),
            FlatValue::Null => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlatValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FlatValue::Null)
    }
}

impl From<f64> for FlatValue {
    fn from(v: f64) -> Self {
        FlatValue::Float(v)
    }
}

impl From<i64> for FlatValue {
    fn from(v: i64) -> Self {
        FlatValue::Int(v)
    }
}

impl From<usize> for FlatValue {
    fn from(v: usize) -> Self {
        FlatValue::Int(v as i64)
    }
}

impl From<bool> for FlatValue {
    fn from(v: bool) -> Self {
        FlatValue::Bool(v)
    }
}

impl From<&str> for FlatValue {
    fn from(v: &str) -> Self {
        FlatValue::Text(v.to_string())
    }
}

impl From<String> for FlatValue {
    fn from(v: String) -> Self {
        FlatValue::Text(v)
    }
}

impl From<Option<f64>> for FlatValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(FlatValue::Null, FlatValue::Float)
    }
}

/// Typed lookups on a [`FlatMap`].
pub trait FlatMapExt {
    /// Number under `key`, `None` when absent, null or not numeric.
    fn number(&self, key: &str) -> Option<f64>;

    fn integer(&self, key: &str) -> Option<i64>;

    /// Checkbox under `key`; absent means unchecked.
    fn flag(&self, key: &str) -> bool;

    fn text(&self, key: &str) -> Option<&str>;

    /// Insert `value` under `key`.
    fn put<V: Into<FlatValue>>(&mut self, key: &str, value: V);
}

impl FlatMapExt for FlatMap {
    fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FlatValue::as_f64)
    }

    fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(FlatValue::as_i64)
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key).map_or(false, FlatValue::as_bool)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FlatValue::as_str)
    }

    fn put<V: Into<FlatValue>>(&mut self, key: &str, value: V) {
        self.insert(key.to_string(), value.into());
    }
}

/// Serialize a flat map as a JSON object.
pub fn to_json(map: &FlatMap) -> Result<String> {
    Ok(serde_json::to_string(map)?)
}

/// Parse a JSON object into a flat map.
pub fn from_json(json: &str) -> Result<FlatMap> {
    Ok(serde_json::from_str(json)?)
}
