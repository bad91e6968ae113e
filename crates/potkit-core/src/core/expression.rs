mod canonical;

use exmex::{Express, FlatEx};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Expression '{expression}' is empty")]
    Empty { expression: String },

    #[error("Failed to parse expression '{expression}': {message}")]
    Parse { expression: String, message: String },
}

/// A parsed symbolic potential expression such as `0.5 * k * (theta-theta_eq)**2`.
///
/// Both `**` and `^` are accepted for exponentiation. Two expressions are equal
/// when they have the same structure: whitespace, the power spelling, redundant
/// parentheses, and the order of operands in sums and products do not matter,
/// while any other rearrangement does.
#[derive(Debug, Clone)]
pub struct Expression {
    text: String,
    canonical: String,
    /// Arc avoids copying the flattened operator tree on clone.
    flat: Arc<FlatEx<f64>>,
}

impl Expression {
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ExpressionError::Empty {
                expression: text.to_string(),
            });
        }

        let normalized = trimmed.replace("**", "^");
        let flat: FlatEx<f64> =
            FlatEx::parse(&normalized).map_err(|e| ExpressionError::Parse {
                expression: trimmed.to_string(),
                message: e.to_string(),
            })?;
        let canonical = canonical::canonical_form(&normalized)
            .unwrap_or_else(|| normalized.chars().filter(|c| !c.is_whitespace()).collect());

        Ok(Self {
            text: trimmed.to_string(),
            canonical,
            flat: Arc::new(flat),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Names of every variable left unbound in the expression.
    pub fn free_symbols(&self) -> BTreeSet<String> {
        self.flat.var_names().iter().cloned().collect()
    }

    pub fn has_symbol(&self, name: &str) -> bool {
        self.flat.var_names().iter().any(|v| v == name)
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Expression {}

impl FromStr for Expression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Anything that can stand in for an expression: source text or an already
/// parsed [`Expression`].
pub trait IntoExpression {
    fn into_expression(self) -> Result<Expression, ExpressionError>;
}

impl IntoExpression for Expression {
    fn into_expression(self) -> Result<Expression, ExpressionError> {
        Ok(self)
    }
}

impl IntoExpression for &Expression {
    fn into_expression(self) -> Result<Expression, ExpressionError> {
        Ok(self.clone())
    }
}

impl IntoExpression for &str {
    fn into_expression(self) -> Result<Expression, ExpressionError> {
        Expression::parse(self)
    }
}

impl IntoExpression for String {
    fn into_expression(self) -> Result<Expression, ExpressionError> {
        Expression::parse(&self)
    }
}

impl IntoExpression for &String {
    fn into_expression(self) -> Result<Expression, ExpressionError> {
        Expression::parse(self)
    }
}
