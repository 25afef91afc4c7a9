//! Expression evaluation against a parameter binding.

use super::types::Expr;
use crate::params::Binding;
use thiserror::Error;

/// Evaluation failure. With a registry-built binding this cannot
/// happen; the check guards against hand-built substitutions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("expression references parameter '{0}' with no bound value")]
    MissingParameter(String),
}

impl Expr {
    /// Evaluate the tree under `binding`. Pure and deterministic;
    /// plain IEEE f64 arithmetic throughout.
    pub fn eval(&self, binding: &Binding) -> Result<f64, EvalError> {
        match self {
            Self::Lit { value } => Ok(*value),

            Self::Param { name } => binding
                .get(name)
                .ok_or_else(|| EvalError::MissingParameter(name.clone())),

            Self::Sum { terms } => {
                let mut acc = 0.0;
                for term in terms {
                    acc += term.eval(binding)?;
                }
                Ok(acc)
            }

            Self::Product { factors } => {
                let mut acc = 1.0;
                for factor in factors {
                    acc *= factor.eval(binding)?;
                }
                Ok(acc)
            }

            Self::Pow { base, exponent } => {
                Ok(base.eval(binding)?.powf(exponent.eval(binding)?))
            }

            Self::Cond {
                cond,
                then,
                otherwise,
            } => {
                if cond.eval(binding)? != 0.0 {
                    then.eval(binding)
                } else {
                    otherwise.eval(binding)
                }
            }
        }
    }
}
