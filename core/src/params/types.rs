//! Parameter declarations as they appear in the serialized model.

use serde::{Deserialize, Serialize};

/// Kind of a model parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Bool,
    Enum,
    Float,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Enum => write!(f, "enum"),
            Self::Float => write!(f, "float"),
        }
    }
}

/// An untyped parameter value, as supplied by callers or stored as a
/// declared default. The registry checks it against the parameter's
/// declared type when building a substitution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A declared model parameter.
///
/// `name` is the unique key within a model and is immutable after
/// construction. `min`/`max` only apply to float parameters and are
/// advisory: they drive input widgets, not evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ptype: ParamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display grouping only; never consulted during evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Allowed members, enum parameters only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Param {
    /// Create a float parameter with a default and advisory bounds.
    pub fn float(name: &str, default: f64, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            ptype: ParamType::Float,
            default: Some(ParamValue::Number(default)),
            unit: None,
            label: None,
            description: None,
            group: None,
            values: Vec::new(),
            min: Some(min),
            max: Some(max),
        }
    }

    /// Create a boolean parameter.
    pub fn boolean(name: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            ptype: ParamType::Bool,
            default: Some(ParamValue::Bool(default)),
            unit: None,
            label: None,
            description: None,
            group: None,
            values: Vec::new(),
            min: None,
            max: None,
        }
    }

    /// Create an enum parameter from its allowed members.
    pub fn enumerated<I, S>(name: &str, values: I, default: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            ptype: ParamType::Enum,
            default: Some(ParamValue::Text(default.to_string())),
            unit: None,
            label: None,
            description: None,
            group: None,
            values: values.into_iter().map(Into::into).collect(),
            min: None,
            max: None,
        }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    /// The declared default, with the enum caveat applied: an enum
    /// default that is not one of the allowed members counts as unset.
    pub fn effective_default(&self) -> Option<&ParamValue> {
        match (&self.ptype, &self.default) {
            (ParamType::Enum, Some(ParamValue::Text(s))) => {
                if self.values.iter().any(|v| v == s) {
                    self.default.as_ref()
                } else {
                    None
                }
            }
            (ParamType::Enum, Some(_)) => None,
            _ => self.default.as_ref(),
        }
    }

    /// The one-hot indicator symbol for an enum member, as referenced
    /// by the exported expressions.
    pub fn indicator(&self, member: &str) -> String {
        format!("{}_{}", self.name, member)
    }
}
