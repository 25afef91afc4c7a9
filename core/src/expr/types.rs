//! The expression IR and its construction helpers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One node of a serialized arithmetic expression.
///
/// The tag vocabulary is closed: an unrecognized `op` fails
/// deserialization, which the model loader surfaces as a structural
/// error. Subtraction and division have no nodes of their own; they
/// are lowered to the sum/product/power normal form at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    /// Numeric literal.
    Lit { value: f64 },
    /// Reference to a parameter (or enum indicator) by name.
    Param { name: String },
    /// N-ary sum.
    Sum { terms: Vec<Expr> },
    /// N-ary product.
    Product { factors: Vec<Expr> },
    /// `base ^ exponent`.
    Pow {
        base: Box<Expr>,
        exponent: Box<Expr>,
    },
    /// Piecewise: `then` when `cond` evaluates non-zero, else
    /// `otherwise`. Boolean parameters bind as 0/1, so they gate
    /// branches directly.
    Cond {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    pub fn lit(value: f64) -> Self {
        Self::Lit { value }
    }

    pub fn param(name: &str) -> Self {
        Self::Param {
            name: name.to_string(),
        }
    }

    pub fn sum(terms: Vec<Expr>) -> Self {
        Self::Sum { terms }
    }

    pub fn product(factors: Vec<Expr>) -> Self {
        Self::Product { factors }
    }

    pub fn pow(base: Expr, exponent: Expr) -> Self {
        Self::Pow {
            base: Box::new(base),
            exponent: Box::new(exponent),
        }
    }

    pub fn cond(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Self::Cond {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// The closed set of parameter names this expression references.
    pub fn params(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_params(&mut out);
        out
    }

    fn collect_params(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Lit { .. } => {}
            Self::Param { name } => {
                out.insert(name.clone());
            }
            Self::Sum { terms } => {
                for term in terms {
                    term.collect_params(out);
                }
            }
            Self::Product { factors } => {
                for factor in factors {
                    factor.collect_params(out);
                }
            }
            Self::Pow { base, exponent } => {
                base.collect_params(out);
                exponent.collect_params(out);
            }
            Self::Cond {
                cond,
                then,
                otherwise,
            } => {
                cond.collect_params(out);
                then.collect_params(out);
                otherwise.collect_params(out);
            }
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Self::lit(value)
    }
}

impl std::ops::Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        match self {
            Expr::Sum { mut terms } => {
                terms.push(rhs);
                Expr::Sum { terms }
            }
            other => Expr::sum(vec![other, rhs]),
        }
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;

    // a - b  =>  a + (-1 * b)
    fn sub(self, rhs: Expr) -> Expr {
        self + Expr::product(vec![Expr::lit(-1.0), rhs])
    }
}

impl std::ops::Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        match self {
            Expr::Product { mut factors } => {
                factors.push(rhs);
                Expr::Product { factors }
            }
            other => Expr::product(vec![other, rhs]),
        }
    }
}

impl std::ops::Div for Expr {
    type Output = Expr;

    // a / b  =>  a * b^-1
    fn div(self, rhs: Expr) -> Expr {
        self * Expr::pow(rhs, Expr::lit(-1.0))
    }
}
