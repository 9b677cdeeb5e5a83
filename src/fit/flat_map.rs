//! Flat-map codec for [`FitProblem`].
//!
//! Keys:
//!
//! | key | value |
//! |-----|-------|
//! | `model` | model id |
//! | `q_min`, `q_max` | window bounds, omitted when unset; a negative `q_min` or non-positive `q_max` is ignored on read |
//! | `smearing` | smearing selection id |
//! | `smear_type` | adapter name, followed by its settings (`smear_dq`, ...) |
//! | `<name>` | parameter value |
//! | `checked_<name>` | parameter is free (`chk_<name>` is read too); absent means fixed when the map carries `model` or parameter values |
//! | `error_<name>` | standard error, omitted when unset |

use tracing::debug;

use super::problem::FitProblem;
use crate::error::Result;
use crate::flat_map::{FlatMap, FlatMapExt};
use crate::models::ModelId;
use crate::smearing::{
    adapter_from_params, NoSmearAdapter, SmearAdapter, SmearingAdapter, SmearingSelection,
};

pub fn checked_key(name: &str) -> String {
    format!("checked_{}", name)
}

pub fn error_key(name: &str) -> String {
    format!("error_{}", name)
}

fn legacy_checked_key(name: &str) -> String {
    format!("chk_{}", name)
}

impl FitProblem {
    /// Flatten the problem into string keys.
    pub fn as_flat_map(&self) -> FlatMap {
        let mut map = FlatMap::new();
        map.put("model", self.model_id.id());
        if let Some(q_min) = self.q_min {
            map.put("q_min", q_min);
        }
        if let Some(q_max) = self.q_max {
            map.put("q_max", q_max);
        }
        map.put("smearing", self.smearing.id());
        if let Some(adapter) = &self.smear_adapter {
            map.extend(adapter.to_flat_map());
        }

        for p in &self.parameters {
            map.put(&p.name, p.value);
            map.put(&checked_key(&p.name), !p.is_fixed);
            if let Some(err) = p.error {
                map.put(&error_key(&p.name), err);
            }
        }
        map
    }

    /// Update the problem from string keys.
    ///
    /// A different `model` id resets the parameters to that model's defaults
    /// before the rest of the map is read. Keys the problem does not know are
    /// ignored, and absent keys leave their field unchanged, except the
    /// checked flags: a form leaves out unticked boxes, so once the map
    /// carries the model id or any parameter value, a parameter without a
    /// checked key is fixed.
    pub fn populate_from_flat_map(&mut self, map: &FlatMap) -> Result<()> {
        if let Some(id) = map.integer("model") {
            let model_id = ModelId::from_id(id)?;
            if model_id != self.model_id {
                self.parameters = model_id.default_parameters()?;
                self.model_id = model_id;
                self.chi2 = None;
            }
        }

        if let Some(value) = map.get("q_min") {
            match value.as_f64() {
                Some(q) if q < 0.0 => {}
                q => self.q_min = q,
            }
        }
        if let Some(value) = map.get("q_max") {
            match value.as_f64() {
                Some(q) if q <= 0.0 => {}
                q => self.q_max = q,
            }
        }

        if let Some(id) = map.integer("smearing") {
            self.smearing = SmearingSelection::from_id(id)?;
        }
        match map.text("smear_type").and_then(SmearingSelection::from_name) {
            Some(SmearingSelection::None) => {
                self.smear_adapter = Some(SmearAdapter::NoSmear(NoSmearAdapter));
            }
            Some(kind) => {
                let is_fixed = self.smearing == SmearingSelection::DataDefault;
                self.smear_adapter = adapter_from_params(kind, map, is_fixed);
            }
            None if self.smearing == SmearingSelection::None => self.smear_adapter = None,
            None => {}
        }

        let is_form = map.contains_key("model")
            || self.parameters.iter().any(|p| map.contains_key(&p.name));
        let mut updated = 0;
        for p in self.parameters.iter_mut() {
            if let Some(value) = map.number(&p.name) {
                p.value = value;
                updated += 1;
            }
            let checked = map
                .get(&checked_key(&p.name))
                .or_else(|| map.get(&legacy_checked_key(&p.name)));
            match checked {
                Some(checked) => p.is_fixed = !checked.as_bool(),
                None if is_form => p.is_fixed = true,
                None => {}
            }
            if let Some(err) = map.get(&error_key(&p.name)) {
                p.error = err.as_f64();
            }
        }
        debug!(updated, keys = map.len(), "populated fit problem");
        Ok(())
    }
}

/// Parse a stored flat map into a new problem.
pub fn fit_problem_from_flat_map(map: &FlatMap) -> Result<FitProblem> {
    let model_id = map
        .integer("model")
        .map(ModelId::from_id)
        .transpose()?
        .unwrap_or(ModelId::Sphere);
    let mut problem = FitProblem::new(model_id)?;
    problem.populate_from_flat_map(map)?;
    Ok(problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SansError;
    use crate::smearing::{PointAdapter, SMEAR_DQ, SMEAR_DQ_AVG};

    fn line_problem() -> FitProblem {
        let mut p = FitProblem::new(ModelId::Line).unwrap();
        p.set_parameter("A", 1.5, true).unwrap();
        p.parameters.get_mut("A").unwrap().error = Some(0.25);
        p.q_min = Some(0.01);
        p
    }

    #[test]
    fn test_keys() {
        let map = line_problem().as_flat_map();
        assert_eq!(map.integer("model"), Some(31));
        assert_eq!(map.number("q_min"), Some(0.01));
        assert!(!map.contains_key("q_max"));
        assert_eq!(map.integer("smearing"), Some(0));
        assert_eq!(map.number("A"), Some(1.5));
        assert!(map.flag("checked_A"));
        assert!(!map.flag("checked_B"));
        assert_eq!(map.number("error_A"), Some(0.25));
        assert!(!map.contains_key("error_B"));
        assert!(!map.contains_key("smear_type"));
    }

    #[test]
    fn test_round_trip() {
        let mut original = line_problem();
        original.smearing = SmearingSelection::Point;
        original.smear_adapter = Some(SmearAdapter::Point(PointAdapter::uniform(0.003)));
        let map = original.as_flat_map();
        assert_eq!(map.number(SMEAR_DQ), Some(0.003));

        let restored = fit_problem_from_flat_map(&map).unwrap();
        assert_eq!(restored, original);
        assert_eq!(restored.as_flat_map(), map);
    }

    #[test]
    fn test_fixed_adapter_round_trip() {
        let mut original = line_problem();
        original.smearing = SmearingSelection::DataDefault;
        original.smear_adapter = Some(SmearAdapter::Point(PointAdapter::summary(0.001, 0.002, 0.004)));
        let map = original.as_flat_map();
        assert_eq!(map.number(SMEAR_DQ_AVG), Some(0.002));
        assert_eq!(fit_problem_from_flat_map(&map).unwrap(), original);
    }

    #[test]
    fn test_model_change_resets_parameters() {
        let mut p = line_problem();
        let mut map = FlatMap::new();
        map.put("model", ModelId::Guinier.id());
        map.put("A", 9.0);
        map.put("rg", 25.0);
        map.put("chk_rg", "on");
        p.populate_from_flat_map(&map).unwrap();

        assert_eq!(p.model_id, ModelId::Guinier);
        assert!(!p.parameters.contains("A"));
        assert_eq!(p.parameters.value("rg").unwrap(), 25.0);
        assert!(!p.parameters.get("rg").unwrap().is_fixed);
    }

    #[test]
    fn test_smearing_cleared() {
        let mut p = line_problem();
        p.smearing = SmearingSelection::Slit;
        p.smear_adapter = adapter_from_params(SmearingSelection::Slit, &FlatMap::new(), false);
        let mut map = FlatMap::new();
        map.put("smearing", 0i64);
        p.populate_from_flat_map(&map).unwrap();
        assert!(p.smear_adapter.is_none());
    }

    #[test]
    fn test_bad_ids() {
        let mut map = FlatMap::new();
        map.put("model", 3i64);
        assert!(matches!(
            fit_problem_from_flat_map(&map),
            Err(SansError::UnknownModel(3))
        ));
        let mut map = FlatMap::new();
        map.put("smearing", 8i64);
        assert!(matches!(
            line_problem().populate_from_flat_map(&map),
            Err(SansError::UnknownSmearing(8))
        ));
    }

    #[test]
    fn test_unticked_parameter_becomes_fixed() {
        let mut p = line_problem();
        assert!(!p.parameters.get("A").unwrap().is_fixed);
        let mut map = FlatMap::new();
        map.put("model", ModelId::Line.id());
        map.put("A", 2.0);
        map.put("B", 0.0);
        p.populate_from_flat_map(&map).unwrap();
        assert_eq!(p.parameters.value("A").unwrap(), 2.0);
        assert!(p.parameters.get("A").unwrap().is_fixed);
        assert!(p.parameters.get("B").unwrap().is_fixed);

        // Without model or parameter values the flags are kept
        let mut p = line_problem();
        let mut map = FlatMap::new();
        map.put("q_max", 0.2);
        p.populate_from_flat_map(&map).unwrap();
        assert!(!p.parameters.get("A").unwrap().is_fixed);
    }

    #[test]
    fn test_out_of_range_window_ignored() {
        let mut p = line_problem();
        p.q_max = Some(0.3);
        let mut map = FlatMap::new();
        map.put("q_min", -0.1);
        map.put("q_max", 0.0);
        p.populate_from_flat_map(&map).unwrap();
        assert_eq!(p.q_min, Some(0.01));
        assert_eq!(p.q_max, Some(0.3));

        map.put("q_min", 0.0);
        map.put("q_max", 0.25);
        p.populate_from_flat_map(&map).unwrap();
        assert_eq!(p.q_min, Some(0.0));
        assert_eq!(p.q_max, Some(0.25));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut p = line_problem();
        let before = p.clone();
        let mut map = FlatMap::new();
        map.put("csrfmiddlewaretoken", "abc");
        map.put("radius", 3.0);
        p.populate_from_flat_map(&map).unwrap();
        assert_eq!(p, before);
    }
}
