//! Model catalog.
//!
//! Models are addressed by stable integer ids that are persisted with fit
//! records. [`ModelId`] is the closed registry of those ids; [`create_model`]
//! resolves an id to a model instance with catalog default parameters.
//! Catalogued shapes that need orientation averaging or numerical
//! integration have no kernel here and resolve to [`SansError::UnknownModel`].

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SansError};
use crate::model::ScatteringModel;
use crate::parameters::{ParameterInfo, ParameterSet};

pub mod shape;
pub mod shape_independent;

/// Model family shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelCategory {
    ShapeBased,
    ShapeIndependent,
}

impl ModelCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ModelCategory::ShapeBased => "Shape-Based Models",
            ModelCategory::ShapeIndependent => "Shape-Independent Models",
        }
    }
}

macro_rules! model_ids {
    ($($variant:ident = $id:literal, $name:literal, $category:ident;)*) => {
        /// Stable model identifiers.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub enum ModelId {
            $($variant,)*
        }

        impl ModelId {
            /// Every catalogued model, in id order.
            pub const ALL: &'static [ModelId] = &[$(ModelId::$variant,)*];

            /// Persisted integer id.
            pub fn id(&self) -> i64 {
                match self {
                    $(ModelId::$variant => $id,)*
                }
            }

            /// Display name.
            pub fn name(&self) -> &'static str {
                match self {
                    $(ModelId::$variant => $name,)*
                }
            }

            pub fn category(&self) -> ModelCategory {
                match self {
                    $(ModelId::$variant => ModelCategory::$category,)*
                }
            }

            /// Resolve a persisted id.
            pub fn from_id(id: i64) -> Result<Self> {
                match id {
                    $($id => Ok(ModelId::$variant),)*
                    other => Err(SansError::UnknownModel(other)),
                }
            }
        }
    };
}

model_ids! {
    Sphere = 0, "Sphere", ShapeBased;
    Cylinder = 1, "Cylinder", ShapeBased;
    CoreShell = 4, "Core-Shell Sphere", ShapeBased;
    Vesicle = 5, "Vesicle", ShapeBased;
    MultiShell = 6, "Multi-Shell Sphere", ShapeBased;
    CoreShellCylinder = 7, "Core-Shell Cylinder", ShapeBased;
    HollowCylinder = 8, "Hollow Cylinder", ShapeBased;
    FlexibleCylinder = 9, "Flexible Cylinder", ShapeBased;
    StackedDisks = 10, "Stacked Disks", ShapeBased;
    Parallelepiped = 11, "Parallelepiped", ShapeBased;
    EllipticalCylinder = 12, "Elliptical Cylinder", ShapeBased;
    Ellipsoid = 13, "Ellipsoid", ShapeBased;
    CoreShellEllipsoid = 14, "Core-Shell Ellipsoid", ShapeBased;
    TriaxialEllipsoid = 15, "Triaxial Ellipsoid", ShapeBased;
    Lamellar = 16, "Lamellar", ShapeBased;
    LamellarFfhg = 17, "Lamellar FF HG", ShapeBased;
    LamellarPs = 18, "Lamellar PS", ShapeBased;
    LamellarPshg = 19, "Lamellar PS HG", ShapeBased;
    BePolyelectrolyte = 20, "BE Polyelectrolyte", ShapeIndependent;
    Dab = 21, "Debye-Anderson-Brumberger", ShapeIndependent;
    Guinier = 22, "Guinier", ShapeIndependent;
    Debye = 23, "Debye", ShapeIndependent;
    Porod = 24, "Porod", ShapeIndependent;
    GaussPeak = 25, "Gaussian Peak", ShapeIndependent;
    LorentzPeak = 26, "Lorentzian Peak", ShapeIndependent;
    Fractal = 27, "Fractal", ShapeIndependent;
    Lorentz = 28, "Lorentz", ShapeIndependent;
    PowerLaw = 29, "Power Law", ShapeIndependent;
    TeubnerStrey = 30, "Teubner-Strey", ShapeIndependent;
    Line = 31, "Linear", ShapeIndependent;
}

impl TryFrom<i64> for ModelId {
    type Error = SansError;

    fn try_from(id: i64) -> Result<Self> {
        ModelId::from_id(id)
    }
}

impl From<ModelId> for i64 {
    fn from(id: ModelId) -> i64 {
        id.id()
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Intensity kernel: parameter values in catalog order, then Q.
pub type Kernel = fn(&[f64], f64) -> f64;

/// Catalog entry with a closed-form kernel.
#[derive(Clone, Copy)]
pub struct ModelDefinition {
    pub id: ModelId,
    pub parameters: &'static [ParameterInfo],
    pub kernel: Kernel,
}

impl ModelId {
    /// Kernel and parameter table, if this model is implemented.
    pub fn definition(&self) -> Option<ModelDefinition> {
        let entry = |parameters: &'static [ParameterInfo], kernel: Kernel| {
            Some(ModelDefinition {
                id: *self,
                parameters,
                kernel,
            })
        };
        use crate::models::shape_independent as si;
        match self {
            ModelId::Sphere => entry(shape::SPHERE_PARAMS, shape::sphere),
            ModelId::CoreShell => entry(shape::CORE_SHELL_PARAMS, shape::core_shell),
            ModelId::Vesicle => entry(shape::VESICLE_PARAMS, shape::vesicle),
            ModelId::Lamellar => entry(shape::LAMELLAR_PARAMS, shape::lamellar),
            ModelId::Dab => entry(si::DAB_PARAMS, si::dab),
            ModelId::Guinier => entry(si::GUINIER_PARAMS, si::guinier),
            ModelId::Debye => entry(si::DEBYE_PARAMS, si::debye),
            ModelId::Porod => entry(si::POROD_PARAMS, si::porod),
            ModelId::GaussPeak => entry(si::PEAK_PARAMS, si::gauss_peak),
            ModelId::LorentzPeak => entry(si::PEAK_PARAMS, si::lorentz_peak),
            ModelId::Lorentz => entry(si::LORENTZ_PARAMS, si::lorentz),
            ModelId::PowerLaw => entry(si::POWER_LAW_PARAMS, si::power_law),
            ModelId::TeubnerStrey => entry(si::TEUBNER_STREY_PARAMS, si::teubner_strey),
            ModelId::Line => entry(si::LINE_PARAMS, si::line),
            _ => None,
        }
    }

    /// Whether [`create_model`] can build this model.
    pub fn is_available(&self) -> bool {
        self.definition().is_some()
    }

    /// Catalog parameter table.
    pub fn parameter_info(&self) -> Result<&'static [ParameterInfo]> {
        self.definition()
            .map(|d| d.parameters)
            .ok_or(SansError::UnknownModel(self.id()))
    }

    /// Fixed parameters at their catalog defaults.
    pub fn default_parameters(&self) -> Result<ParameterSet> {
        Ok(ParameterSet::from_defaults(self.parameter_info()?))
    }
}

/// Implemented models, grouped by category label.
pub fn catalog() -> Vec<(&'static str, Vec<ModelId>)> {
    [ModelCategory::ShapeBased, ModelCategory::ShapeIndependent]
        .iter()
        .map(|cat| {
            let ids = ModelId::ALL
                .iter()
                .copied()
                .filter(|id| id.category() == *cat && id.is_available())
                .collect();
            (cat.label(), ids)
        })
        .collect()
}

/// A catalog model: a closed-form kernel and its parameters.
#[derive(Clone)]
pub struct CatalogModel {
    definition: ModelDefinition,
    params: ParameterSet,
}

impl CatalogModel {
    pub fn new(id: ModelId) -> Result<Self> {
        let definition = id.definition().ok_or(SansError::UnknownModel(id.id()))?;
        Ok(Self {
            params: ParameterSet::from_defaults(definition.parameters),
            definition,
        })
    }

    /// Catalog parameter table, with units and long names.
    pub fn parameter_info(&self) -> &'static [ParameterInfo] {
        self.definition.parameters
    }
}

impl ScatteringModel for CatalogModel {
    fn id(&self) -> ModelId {
        self.definition.id
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    fn eval_with(&self, params: &ParameterSet, q: &Array1<f64>) -> Result<Array1<f64>> {
        let values = self
            .definition
            .parameters
            .iter()
            .map(|info| params.value(info.name))
            .collect::<Result<Vec<f64>>>()?;
        let kernel = self.definition.kernel;
        Ok(q.mapv(|q| kernel(&values, q)))
    }

    fn clone_box(&self) -> Box<dyn ScatteringModel> {
        Box::new(self.clone())
    }
}

/// Resolve a persisted model id to a model with default parameters.
pub fn create_model(id: i64) -> Result<Box<dyn ScatteringModel>> {
    Ok(Box::new(CatalogModel::new(ModelId::from_id(id)?)?))
}
