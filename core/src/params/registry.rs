//! The parameter registry and override binding.

use super::types::{Param, ParamType, ParamValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// An override value was not valid for the declared parameter domain.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("unknown parameter '{0}'")]
    UnknownParam(String),

    #[error("parameter '{0}' is declared more than once")]
    Duplicate(String),

    #[error("parameter '{param}' expects one of {allowed:?}, got '{got}'")]
    NotAMember {
        param: String,
        got: String,
        allowed: Vec<String>,
    },

    #[error("parameter '{param}' expects true/false or 0/1, got '{got}'")]
    InvalidBool { param: String, got: String },

    #[error("parameter '{param}' expects a number, got '{got}'")]
    InvalidNumber { param: String, got: String },

    #[error("no value supplied for parameter '{0}' and no usable default")]
    MissingValue(String),
}

/// A complete numeric substitution: every declared parameter resolved
/// to an f64 (enums as their one-hot indicators). Built per evaluate
/// call and discarded afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    values: BTreeMap<String, f64>,
}

impl Binding {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert(&mut self, name: String, value: f64) {
        self.values.insert(name, value);
    }
}

/// Immutable table of every declared parameter, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamRegistry {
    params: BTreeMap<String, Param>,
}

impl ParamRegistry {
    /// Build a registry from parameter declarations. Names must be
    /// unique.
    pub fn new<I>(params: I) -> Result<Self, ParameterError>
    where
        I: IntoIterator<Item = Param>,
    {
        let mut table = BTreeMap::new();
        for param in params {
            let name = param.name.clone();
            if table.insert(name.clone(), param).is_some() {
                return Err(ParameterError::Duplicate(name));
            }
        }
        Ok(Self { params: table })
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.values()
    }

    /// Whether `name` carries a numeric value under some binding:
    /// either a float/bool parameter, or a `<enum>_<member>` one-hot
    /// indicator. A bare enum name does not resolve; it has no numeric
    /// value of its own.
    pub fn resolves(&self, name: &str) -> bool {
        if let Some(param) = self.params.get(name) {
            return !matches!(param.ptype, ParamType::Enum);
        }
        self.params
            .values()
            .filter(|p| p.ptype == ParamType::Enum)
            .any(|p| p.values.iter().any(|m| p.indicator(m) == name))
    }

    /// Build the complete substitution for one evaluation: overrides
    /// where given, declared defaults everywhere else. Unknown override
    /// names are rejected rather than ignored.
    pub fn bind(
        &self,
        overrides: &BTreeMap<String, ParamValue>,
    ) -> Result<Binding, ParameterError> {
        for name in overrides.keys() {
            if !self.params.contains_key(name) {
                return Err(ParameterError::UnknownParam(name.clone()));
            }
        }

        let mut binding = Binding::default();
        for (name, param) in &self.params {
            let value = match overrides.get(name) {
                Some(v) => v,
                None => param
                    .effective_default()
                    .ok_or_else(|| ParameterError::MissingValue(name.clone()))?,
            };

            match param.ptype {
                ParamType::Float => {
                    binding.insert(name.clone(), as_number(param, value)?);
                }
                ParamType::Bool => {
                    let v = if as_bool(param, value)? { 1.0 } else { 0.0 };
                    binding.insert(name.clone(), v);
                }
                ParamType::Enum => {
                    let chosen = as_member(param, value)?;
                    for member in &param.values {
                        let v = if member == chosen { 1.0 } else { 0.0 };
                        binding.insert(param.indicator(member), v);
                    }
                }
            }
        }
        Ok(binding)
    }
}

/// Float parameters take any numeric value. The declared min/max are
/// advisory input-widget bounds; out-of-range exploratory values pass
/// through unchanged.
fn as_number(param: &Param, value: &ParamValue) -> Result<f64, ParameterError> {
    match value {
        ParamValue::Number(n) => Ok(*n),
        other => Err(ParameterError::InvalidNumber {
            param: param.name.clone(),
            got: other.to_string(),
        }),
    }
}

fn as_bool(param: &Param, value: &ParamValue) -> Result<bool, ParameterError> {
    match value {
        ParamValue::Bool(b) => Ok(*b),
        ParamValue::Number(n) if *n == 0.0 => Ok(false),
        ParamValue::Number(n) if *n == 1.0 => Ok(true),
        other => Err(ParameterError::InvalidBool {
            param: param.name.clone(),
            got: other.to_string(),
        }),
    }
}

fn as_member<'a>(param: &Param, value: &'a ParamValue) -> Result<&'a str, ParameterError> {
    if let ParamValue::Text(s) = value {
        if param.values.iter().any(|m| m == s) {
            return Ok(s);
        }
    }
    Err(ParameterError::NotAMember {
        param: param.name.clone(),
        got: value.to_string(),
        allowed: param.values.clone(),
    })
}
