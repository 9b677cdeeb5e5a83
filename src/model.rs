//! Scattering model interface.
//!
//! A model is a function `I(Q; params)` plus the named parameters it reads.
//! Evaluation never mutates the model: [`ScatteringModel::eval_with`] takes the
//! parameter set explicitly, which lets the fit engine try trial parameters
//! from behind a shared reference.

use ndarray::Array1;

use crate::error::Result;
use crate::models::ModelId;
use crate::parameters::ParameterSet;

/// A parametric intensity model.
pub trait ScatteringModel: Send + Sync {
    /// Catalog identifier of the model.
    fn id(&self) -> ModelId;

    /// Display name.
    fn name(&self) -> &'static str {
        self.id().name()
    }

    /// Current parameters, including any orientation parameters.
    fn parameters(&self) -> &ParameterSet;

    /// Mutable access to the current parameters.
    fn parameters_mut(&mut self) -> &mut ParameterSet;

    /// Evaluate the model at each Q using `params` instead of the stored values.
    fn eval_with(&self, params: &ParameterSet, q: &Array1<f64>) -> Result<Array1<f64>>;

    /// Evaluate the model at each Q with its current parameters.
    fn evaluate(&self, q: &Array1<f64>) -> Result<Array1<f64>> {
        self.eval_with(self.parameters(), q)
    }

    /// Value of a parameter.
    fn get_param(&self, name: &str) -> Result<f64> {
        self.parameters().value(name)
    }

    /// Overwrite a parameter value.
    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        self.parameters_mut().set_value(name, value)
    }

    /// Names of parameters that only matter for oriented 2-D data.
    fn orientation_params(&self) -> &[&'static str] {
        &[]
    }

    /// Parameter names open to fitting, in order; orientation parameters are excluded.
    fn list_param_names(&self) -> Vec<String> {
        let orientation = self.orientation_params();
        self.parameters()
            .iter()
            .filter(|p| !orientation.iter().any(|o| *o == p.name))
            .map(|p| p.name.clone())
            .collect()
    }

    /// Clone into a new boxed model.
    fn clone_box(&self) -> Box<dyn ScatteringModel>;
}

impl Clone for Box<dyn ScatteringModel> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl std::fmt::Debug for dyn ScatteringModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScatteringModel")
            .field("id", &self.id())
            .field("parameters", self.parameters())
            .finish()
    }
}
