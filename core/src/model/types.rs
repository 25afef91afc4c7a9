//! Records surrounding the expression table: functional units, impact
//! metadata, and the evaluation result.

use super::lambda::{Lambda, LambdaValue};
use serde::{Deserialize, Serialize};

/// A normalization quantity raw impact totals are divided by (for
/// instance lifetime energy production in kWh). The quantity must be a
/// scalar lambda; that is enforced when the model is built or loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalUnit {
    pub quantity: Lambda,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl FunctionalUnit {
    pub fn new(quantity: Lambda, unit: Option<&str>) -> Self {
        Self {
            quantity,
            unit: unit.map(str::to_string),
        }
    }
}

/// Metadata of an environmental indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    /// Full indicator identity, e.g. the method tuple rendered as text.
    pub name: String,
    /// Physical unit of the raw figure; may be empty.
    #[serde(default)]
    pub unit: String,
}

impl Impact {
    pub fn new(name: &str, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
        }
    }
}

/// The outcome of one `evaluate` call: the normalized figure(s) plus
/// the units needed to compose a display string.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: LambdaValue,
    pub impact_unit: String,
    pub functional_unit_unit: Option<String>,
}

impl Evaluation {
    /// Display unit: `<impact>/<functional unit>`, or the bare impact
    /// unit when the functional unit is unitless (quantity 1).
    pub fn unit(&self) -> String {
        match &self.functional_unit_unit {
            Some(fu) => format!("{}/{}", self.impact_unit, fu),
            None => self.impact_unit.clone(),
        }
    }
}
