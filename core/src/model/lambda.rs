//! Compiled formulas: an expression bound to the parameters it uses,
//! optionally split along an attribution axis.

use crate::expr::{EvalError, Expr};
use crate::params::Binding;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One key of an axis decomposition.
///
/// The upstream pipeline tags inventory flows with axis values; flows
/// it could not attribute land under `Unassigned`. The sentinel is a
/// first-class variant (serialized as JSON `null`) so it can never be
/// confused with a legitimately named axis value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum AxisKey {
    Named(String),
    Unassigned,
}

impl AxisKey {
    pub fn named(name: &str) -> Self {
        Self::Named(name.to_string())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Unassigned => None,
        }
    }
}

impl From<Option<String>> for AxisKey {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) => Self::Named(name),
            None => Self::Unassigned,
        }
    }
}

impl From<AxisKey> for Option<String> {
    fn from(key: AxisKey) -> Self {
        match key {
            AxisKey::Named(name) => Some(name),
            AxisKey::Unassigned => None,
        }
    }
}

impl std::fmt::Display for AxisKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{}", name),
            Self::Unassigned => write!(f, "(unassigned)"),
        }
    }
}

/// One keyed sub-expression of an axis split. Serialized as a pair
/// list rather than a JSON map so the unassigned key keeps its `null`
/// marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisCase {
    pub key: AxisKey,
    pub expr: Expr,
}

/// The payload of a lambda: a single expression, or one expression per
/// axis key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LambdaBody {
    Scalar { expr: Expr },
    AxisSplit { cases: Vec<AxisCase> },
}

/// A compiled formula plus the closed set of parameter names it
/// references. The set is derived data: it is skipped on the wire and
/// rebuilt by [`crate::model::Model::rebind`] after deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    #[serde(flatten)]
    body: LambdaBody,
    #[serde(skip)]
    required: BTreeSet<String>,
}

/// What evaluating a lambda yields: one number, or one per axis key.
#[derive(Debug, Clone, PartialEq)]
pub enum LambdaValue {
    Scalar(f64),
    PerAxis(BTreeMap<AxisKey, f64>),
}

impl LambdaValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::PerAxis(_) => None,
        }
    }

    /// Sum over all keys, the unassigned one included. For a scalar
    /// value this is the value itself.
    pub fn total(&self) -> f64 {
        match self {
            Self::Scalar(v) => *v,
            Self::PerAxis(map) => map.values().sum(),
        }
    }
}

impl Lambda {
    pub fn scalar(expr: Expr) -> Self {
        let mut lambda = Self {
            body: LambdaBody::Scalar { expr },
            required: BTreeSet::new(),
        };
        lambda.rebind();
        lambda
    }

    pub fn axis_split<I>(cases: I) -> Self
    where
        I: IntoIterator<Item = (AxisKey, Expr)>,
    {
        let cases = cases
            .into_iter()
            .map(|(key, expr)| AxisCase { key, expr })
            .collect();
        let mut lambda = Self {
            body: LambdaBody::AxisSplit { cases },
            required: BTreeSet::new(),
        };
        lambda.rebind();
        lambda
    }

    pub fn body(&self) -> &LambdaBody {
        &self.body
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.body, LambdaBody::Scalar { .. })
    }

    /// The closed set of parameter names this lambda depends on.
    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// Recompute the derived parameter set (after deserialization).
    pub(crate) fn rebind(&mut self) {
        let mut required = BTreeSet::new();
        match &self.body {
            LambdaBody::Scalar { expr } => {
                required.extend(expr.params());
            }
            LambdaBody::AxisSplit { cases } => {
                for case in cases {
                    required.extend(case.expr.params());
                }
            }
        }
        self.required = required;
    }

    pub(crate) fn round_literals(&mut self, digits: u32) {
        match &mut self.body {
            LambdaBody::Scalar { expr } => expr.round_literals(digits),
            LambdaBody::AxisSplit { cases } => {
                for case in cases {
                    case.expr.round_literals(digits);
                }
            }
        }
    }

    /// Evaluate under a complete binding. Axis-split lambdas evaluate
    /// every case independently with the same binding and keep every
    /// key, the unassigned sentinel included; dropping it is the
    /// caller's decision.
    pub fn evaluate(&self, binding: &Binding) -> Result<LambdaValue, EvalError> {
        match &self.body {
            LambdaBody::Scalar { expr } => Ok(LambdaValue::Scalar(expr.eval(binding)?)),
            LambdaBody::AxisSplit { cases } => {
                let mut values = BTreeMap::new();
                for case in cases {
                    values.insert(case.key.clone(), case.expr.eval(binding)?);
                }
                Ok(LambdaValue::PerAxis(values))
            }
        }
    }
}
