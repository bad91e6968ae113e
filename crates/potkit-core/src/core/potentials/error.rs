use super::bonded::BondedKind;
use crate::core::expression::ExpressionError;
use crate::core::units::{Dimension, UnitError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PotentialError {
    #[error(
        "Expression '{expression}' does not agree with the declared parameters and independent variables (missing: {missing:?}, extraneous: {extraneous:?})"
    )]
    InconsistentExpression {
        expression: String,
        /// Free symbols of the expression that are neither parameters nor independent variables.
        missing: Vec<String>,
        /// Declared names that do not occur in the expression.
        extraneous: Vec<String>,
    },

    #[error("A {kind} requires exactly {expected} member types or none, found {found}")]
    Arity {
        kind: BondedKind,
        expected: usize,
        found: usize,
    },

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Charge given in '{unit}' ({dimension}) cannot be interpreted as a charge")]
    IncompatibleCharge { unit: String, dimension: Dimension },

    #[error("Invalid expression: {0}")]
    Expression(#[from] ExpressionError),

    #[error("Invalid unit: {0}")]
    Unit(#[from] UnitError),
}
