pub mod expr;
pub mod model;
pub mod params;

pub use expr::{EvalError, Expr, ParseError};
pub use model::{
    AxisKey, EvaluateError, Evaluation, FunctionalUnit, Impact, Lambda, LambdaValue, Model,
    ModelFileError, StructuralError, TOTAL_AXIS,
};
pub use params::{Param, ParamRegistry, ParamType, ParamValue, ParameterError};

pub fn version() -> &'static str {
    "0.1.0"
}
