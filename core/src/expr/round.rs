//! Significant-digit rounding of expression literals.
//!
//! Applied once when a model is constructed, never at evaluation time.
//! It bounds the serialized file size and strips the spurious
//! precision the upstream numeric solvers leave behind.

use super::types::Expr;

/// Round `value` to `digits` significant digits. Zero and non-finite
/// values pass through. Idempotent: re-rounding an already rounded
/// value is a no-op.
pub fn round_sig(value: f64, digits: u32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits as i32 - 1 - magnitude);
    (value * factor).round() / factor
}

impl Expr {
    /// Round every literal in the tree to `digits` significant digits.
    pub fn round_literals(&mut self, digits: u32) {
        match self {
            Self::Lit { value } => *value = round_sig(*value, digits),
            Self::Param { .. } => {}
            Self::Sum { terms } => {
                for term in terms {
                    term.round_literals(digits);
                }
            }
            Self::Product { factors } => {
                for factor in factors {
                    factor.round_literals(digits);
                }
            }
            Self::Pow { base, exponent } => {
                base.round_literals(digits);
                exponent.round_literals(digits);
            }
            Self::Cond {
                cond,
                then,
                otherwise,
            } => {
                cond.round_literals(digits);
                then.round_literals(digits);
                otherwise.round_literals(digits);
            }
        }
    }
}
