//! The exported model aggregate.
//!
//! A [`Model`] is what the one-time export pipeline writes to disk and
//! what the consuming process loads back: the parameter registry, the
//! named functional units, the impact metadata and a table of compiled
//! formulas keyed by axis and impact. Once constructed or loaded it is
//! read only; `evaluate` builds a fresh substitution per call and can
//! run concurrently from any number of threads.

pub mod lambda;
pub mod types;


pub use lambda::{AxisCase, AxisKey, Lambda, LambdaBody, LambdaValue};
pub use types::{Evaluation, FunctionalUnit, Impact};

use crate::expr::{EvalError, DEFAULT_NUM_DIGITS};
use crate::params::{ParamRegistry, ParamValue, ParameterError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// The axis holding the undecomposed aggregate expressions.
pub const TOTAL_AXIS: &str = "total";

/// Integrity violation in a constructed or deserialized model. Fatal:
/// the model is rejected as a whole.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StructuralError {
    #[error("expression for '{owner}' references undeclared parameter '{name}'")]
    DanglingParameter { owner: String, name: String },

    #[error("axis split for '{owner}' repeats key '{key}'")]
    DuplicateAxisKey { owner: String, key: String },

    #[error("functional unit '{0}' has an axis-split quantity; a scalar is required")]
    AxisSplitFunctionalUnit(String),

    #[error("axis '{axis}' maps impact '{key}' which is not declared")]
    UnknownImpactKey { axis: String, key: String },

    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

/// Failure to persist or reload a model file.
#[derive(Debug, Error)]
pub enum ModelFileError {
    #[error("failed to read or write model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed model document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Structural(#[from] StructuralError),
}

/// Failure of a single `evaluate` call. The model itself stays valid.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluateError {
    #[error("unknown axis '{0}'")]
    UnknownAxis(String),

    #[error("no expression for impact '{impact}' under axis '{axis}'")]
    UnknownImpact { axis: String, impact: String },

    #[error("unknown functional unit '{0}'")]
    UnknownFunctionalUnit(String),

    #[error("functional unit '{0}' evaluates to zero under the given parameters")]
    DivisionByZero(String),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Expression table: axis name -> impact key -> compiled formula.
pub type ExpressionTable = BTreeMap<String, BTreeMap<String, Lambda>>;

/// The aggregate root. Constructed once by the export pipeline,
/// persisted with [`Model::to_file`], reconstructed with
/// [`Model::from_file`], then queried through `evaluate` and the
/// read-only accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    params: ParamRegistry,
    functional_units: BTreeMap<String, FunctionalUnit>,
    impacts: BTreeMap<String, Impact>,
    expressions: ExpressionTable,
}

impl Model {
    /// Build a model, rounding literal coefficients to the default 3
    /// significant digits and validating structural integrity.
    pub fn new(
        params: ParamRegistry,
        functional_units: BTreeMap<String, FunctionalUnit>,
        impacts: BTreeMap<String, Impact>,
        expressions: ExpressionTable,
    ) -> Result<Self, StructuralError> {
        Self::with_rounding(
            params,
            functional_units,
            impacts,
            expressions,
            DEFAULT_NUM_DIGITS,
        )
    }

    /// As [`Model::new`] with an explicit significant-digit count.
    /// Rounding happens here, once; evaluation never rounds.
    pub fn with_rounding(
        params: ParamRegistry,
        functional_units: BTreeMap<String, FunctionalUnit>,
        impacts: BTreeMap<String, Impact>,
        expressions: ExpressionTable,
        num_digits: u32,
    ) -> Result<Self, StructuralError> {
        let mut model = Self {
            params,
            functional_units,
            impacts,
            expressions,
        };
        for fu in model.functional_units.values_mut() {
            fu.quantity.round_literals(num_digits);
        }
        for table in model.expressions.values_mut() {
            for lambda in table.values_mut() {
                lambda.round_literals(num_digits);
            }
        }
        model.rebind();
        model.validate()?;
        Ok(model)
    }

    /// Recompute the derived per-lambda parameter sets. Needed after
    /// deserialization, which skips them on the wire.
    fn rebind(&mut self) {
        for fu in self.functional_units.values_mut() {
            fu.quantity.rebind();
        }
        for table in self.expressions.values_mut() {
            for lambda in table.values_mut() {
                lambda.rebind();
            }
        }
    }

    /// Check every structural invariant: parameter references resolve,
    /// axis splits have unique keys, functional units are scalar, and
    /// every impact key under an axis is declared.
    fn validate(&self) -> Result<(), StructuralError> {
        for (name, fu) in &self.functional_units {
            if !fu.quantity.is_scalar() {
                return Err(StructuralError::AxisSplitFunctionalUnit(name.clone()));
            }
            self.validate_lambda(&format!("functional unit '{}'", name), &fu.quantity)?;
        }

        for (axis, table) in &self.expressions {
            for (impact_key, lambda) in table {
                if !self.impacts.contains_key(impact_key) {
                    return Err(StructuralError::UnknownImpactKey {
                        axis: axis.clone(),
                        key: impact_key.clone(),
                    });
                }
                let owner = format!("{}/{}", axis, impact_key);
                self.validate_lambda(&owner, lambda)?;
            }
        }
        Ok(())
    }

    fn validate_lambda(&self, owner: &str, lambda: &Lambda) -> Result<(), StructuralError> {
        if let LambdaBody::AxisSplit { cases } = lambda.body() {
            let mut seen = std::collections::BTreeSet::new();
            for case in cases {
                if !seen.insert(&case.key) {
                    return Err(StructuralError::DuplicateAxisKey {
                        owner: owner.to_string(),
                        key: case.key.to_string(),
                    });
                }
            }
        }
        for name in lambda.required() {
            if !self.params.resolves(name) {
                return Err(StructuralError::DanglingParameter {
                    owner: owner.to_string(),
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }

    // === Serialization ===

    pub fn to_json(&self) -> Result<String, ModelFileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reconstruct a model from its serialized document. Runs the full
    /// structural validation; a dangling reference or unknown node tag
    /// rejects the document.
    pub fn from_json(text: &str) -> Result<Self, ModelFileError> {
        let mut model: Self = serde_json::from_str(text)?;
        model.rebind();
        model.validate()?;
        Ok(model)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelFileError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelFileError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    // === Read-only accessors ===

    pub fn params(&self) -> &ParamRegistry {
        &self.params
    }

    /// Parameters keyed by display group, for selection widgets.
    /// Ungrouped parameters land under the empty key.
    pub fn params_by_group(&self) -> BTreeMap<&str, Vec<&crate::params::Param>> {
        let mut groups: BTreeMap<&str, Vec<_>> = BTreeMap::new();
        for param in self.params.iter() {
            groups
                .entry(param.group.as_deref().unwrap_or(""))
                .or_default()
                .push(param);
        }
        groups
    }

    pub fn impacts(&self) -> &BTreeMap<String, Impact> {
        &self.impacts
    }

    pub fn functional_units(&self) -> &BTreeMap<String, FunctionalUnit> {
        &self.functional_units
    }

    pub fn axes(&self) -> impl Iterator<Item = &str> {
        self.expressions.keys().map(String::as_str)
    }

    // === Evaluation ===

    /// Evaluate one impact under one functional unit.
    ///
    /// `axis` `None` selects the `"total"` aggregate; a named axis
    /// yields a per-key breakdown. Missing overrides fall back to the
    /// declared defaults; the same substitution feeds both the impact
    /// expression and the functional-unit divisor, and the division
    /// never changes the axis decomposition.
    pub fn evaluate(
        &self,
        impact: &str,
        functional_unit: &str,
        axis: Option<&str>,
        overrides: &BTreeMap<String, ParamValue>,
    ) -> Result<Evaluation, EvaluateError> {
        let axis_name = axis.unwrap_or(TOTAL_AXIS);
        let table = self
            .expressions
            .get(axis_name)
            .ok_or_else(|| EvaluateError::UnknownAxis(axis_name.to_string()))?;
        let lambda = table.get(impact).ok_or_else(|| EvaluateError::UnknownImpact {
            axis: axis_name.to_string(),
            impact: impact.to_string(),
        })?;
        let impact_meta = self
            .impacts
            .get(impact)
            .ok_or_else(|| EvaluateError::UnknownImpact {
                axis: axis_name.to_string(),
                impact: impact.to_string(),
            })?;
        let fu = self
            .functional_units
            .get(functional_unit)
            .ok_or_else(|| EvaluateError::UnknownFunctionalUnit(functional_unit.to_string()))?;

        let binding = self.params.bind(overrides)?;

        let raw = lambda.evaluate(&binding)?;
        // Validation guarantees a scalar quantity; total() is the
        // identity on scalars.
        let divisor = fu.quantity.evaluate(&binding)?.total();
        if divisor == 0.0 {
            return Err(EvaluateError::DivisionByZero(functional_unit.to_string()));
        }

        let value = match raw {
            LambdaValue::Scalar(v) => LambdaValue::Scalar(v / divisor),
            LambdaValue::PerAxis(map) => LambdaValue::PerAxis(
                map.into_iter().map(|(k, v)| (k, v / divisor)).collect(),
            ),
        };

        Ok(Evaluation {
            value,
            impact_unit: impact_meta.unit.clone(),
            functional_unit_unit: fu.unit.clone(),
        })
    }

    /// Evaluate a functional-unit quantity on its own, under the same
    /// default-then-override rules as `evaluate`.
    pub fn evaluate_functional_unit(
        &self,
        functional_unit: &str,
        overrides: &BTreeMap<String, ParamValue>,
    ) -> Result<f64, EvaluateError> {
        let fu = self
            .functional_units
            .get(functional_unit)
            .ok_or_else(|| EvaluateError::UnknownFunctionalUnit(functional_unit.to_string()))?;
        let binding = self.params.bind(overrides)?;
        Ok(fu.quantity.evaluate(&binding)?.total())
    }
}
