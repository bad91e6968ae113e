use super::dimension::Dimension;
use super::table;
use approx::relative_eq;
use physical_constants::ELEMENTARY_CHARGE;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::trace;

const DIMENSIONLESS: &str = "dimensionless";
const ELEMENTARY_CHARGE_SYMBOL: &str = "e";
/// Largest exponent magnitude accepted after `**` or `^`.
pub const MAX_EXPONENT: i32 = 64;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit symbol '{symbol}' in unit expression '{expression}'")]
    UnknownSymbol { symbol: String, expression: String },

    #[error("Malformed unit expression '{expression}': {reason}")]
    Syntax { expression: String, reason: String },

    #[error("Cannot convert '{from}' ({from_dimension}) to '{to}' ({to_dimension})")]
    Incompatible {
        from: String,
        to: String,
        from_dimension: Dimension,
        to_dimension: Dimension,
    },
}

/// A unit of measure parsed from an expression such as `kJ/(mol*nm**2)`.
///
/// A unit is fully described by its factor to the SI base (radians for plane
/// angles) and its [`Dimension`]. The original expression text is retained for
/// display only; two units compare equal when they denote the same scale of the
/// same dimension, regardless of spelling.
#[derive(Debug, Clone)]
pub struct Unit {
    expression: String,
    factor: f64,
    dimension: Dimension,
}

impl Unit {
    pub fn parse(expression: &str) -> Result<Self, UnitError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() || trimmed == DIMENSIONLESS {
            return Ok(Self::dimensionless());
        }

        let tokens = tokenize(trimmed)?;
        let mut parser = Parser {
            expression: trimmed,
            tokens,
            pos: 0,
        };
        let (factor, dimension) = parser.expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.syntax("unexpected trailing input"));
        }
        if !factor.is_finite() || factor == 0.0 {
            return Err(parser.syntax("unit factor out of range"));
        }

        trace!(
            "Parsed unit '{}' as factor {} with dimension {}",
            trimmed, factor, dimension
        );

        Ok(Self {
            expression: trimmed.to_string(),
            factor,
            dimension,
        })
    }

    pub fn dimensionless() -> Self {
        Self {
            expression: DIMENSIONLESS.to_string(),
            factor: 1.0,
            dimension: Dimension::NONE,
        }
    }

    pub fn elementary_charge() -> Self {
        Self {
            expression: ELEMENTARY_CHARGE_SYMBOL.to_string(),
            factor: ELEMENTARY_CHARGE,
            dimension: Dimension::CHARGE,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    #[inline]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    /// Multiplier taking a value expressed in `self` to the same value expressed in `to`.
    pub fn conversion_factor(&self, to: &Unit) -> Result<f64, UnitError> {
        if !self.is_compatible(to) {
            return Err(UnitError::Incompatible {
                from: self.expression.clone(),
                to: to.expression.clone(),
                from_dimension: self.dimension,
                to_dimension: to.dimension,
            });
        }
        Ok(self.factor / to.factor)
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension
            && relative_eq!(self.factor, other.factor, max_relative = 1e-12)
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Symbol(String),
    Number(f64),
    Star,
    Slash,
    Pow,
    Minus,
    Plus,
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, UnitError> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Pow);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '^' => {
                chars.next();
                tokens.push(Token::Pow);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal.parse::<f64>().map_err(|_| UnitError::Syntax {
                    expression: expression.to_string(),
                    reason: format!("invalid number '{}'", literal),
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut symbol = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        symbol.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Symbol(symbol));
            }
            other => {
                return Err(UnitError::Syntax {
                    expression: expression.to_string(),
                    reason: format!("unexpected character '{}'", other),
                });
            }
        }
    }

    Ok(tokens)
}

// expr     := power (('*' | '/') power)*
// power    := atom (('**' | '^') exponent)?
// atom     := SYMBOL | NUMBER | '(' expr ')'
// exponent := ['+' | '-'] NUMBER | '(' ['+' | '-'] NUMBER ')'
struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn syntax(&self, reason: &str) -> UnitError {
        UnitError::Syntax {
            expression: self.expression.to_string(),
            reason: reason.to_string(),
        }
    }

    fn expr(&mut self) -> Result<(f64, Dimension), UnitError> {
        let (mut factor, mut dimension) = self.power()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let (f, d) = self.power()?;
                    factor *= f;
                    dimension = dimension
                        .checked_mul(d)
                        .ok_or_else(|| self.syntax("dimension exponent out of range"))?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let (f, d) = self.power()?;
                    factor /= f;
                    dimension = dimension
                        .checked_div(d)
                        .ok_or_else(|| self.syntax("dimension exponent out of range"))?;
                }
                _ => break,
            }
        }
        Ok((factor, dimension))
    }

    fn power(&mut self) -> Result<(f64, Dimension), UnitError> {
        let (factor, dimension) = self.atom()?;
        if let Some(Token::Pow) = self.peek() {
            self.pos += 1;
            let exponent = self.exponent()?;
            let dimension = dimension
                .checked_powi(exponent)
                .ok_or_else(|| self.syntax("dimension exponent out of range"))?;
            return Ok((factor.powi(exponent), dimension));
        }
        Ok((factor, dimension))
    }

    fn atom(&mut self) -> Result<(f64, Dimension), UnitError> {
        match self.advance() {
            Some(Token::Symbol(symbol)) => match table::lookup(&symbol) {
                Some(base) => Ok((base.factor, base.dimension)),
                None => Err(UnitError::UnknownSymbol {
                    symbol,
                    expression: self.expression.to_string(),
                }),
            },
            Some(Token::Number(value)) if value != 0.0 => Ok((value, Dimension::NONE)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.syntax("unbalanced parentheses")),
                }
            }
            Some(_) => Err(self.syntax("expected a unit symbol, number, or '('")),
            None => Err(self.syntax("unexpected end of expression")),
        }
    }

    fn exponent(&mut self) -> Result<i32, UnitError> {
        let parenthesized = matches!(self.peek(), Some(Token::LParen));
        if parenthesized {
            self.pos += 1;
        }

        let sign = match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                -1
            }
            Some(Token::Plus) => {
                self.pos += 1;
                1
            }
            _ => 1,
        };

        let magnitude = match self.advance() {
            Some(Token::Number(value)) if value.fract() == 0.0 => value,
            _ => return Err(self.syntax("exponents must be integers")),
        };
        if magnitude > f64::from(MAX_EXPONENT) {
            return Err(self.syntax(&format!(
                "exponents must not exceed {} in magnitude",
                MAX_EXPONENT
            )));
        }

        if parenthesized && self.advance() != Some(Token::RParen) {
            return Err(self.syntax("unbalanced parentheses in exponent"));
        }

        Ok(sign * magnitude as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parse_simple_symbol_uses_table_definition() {
        let nm = Unit::parse("nm").unwrap();
        assert_eq!(nm.dimension(), Dimension::LENGTH);
        assert_relative_eq!(nm.factor(), 1e-9);
        assert_eq!(nm.expression(), "nm");
    }

    #[test]
    fn parse_compound_expression_with_parentheses_and_powers() {
        let unit = Unit::parse("kJ/(mol*nm**2)").unwrap();
        assert_eq!(
            unit.dimension(),
            Dimension::ENERGY / Dimension::AMOUNT / Dimension::LENGTH.powi(2)
        );
        assert_relative_eq!(unit.factor(), 1e21, max_relative = 1e-12);
    }

    #[test]
    fn parse_accepts_caret_and_negative_exponents() {
        let caret = Unit::parse("kJ * nm^-2").unwrap();
        let starstar = Unit::parse("kJ*nm**(-2)").unwrap();
        let division = Unit::parse("kJ / nm**2").unwrap();
        assert_eq!(caret, starstar);
        assert_eq!(caret, division);
    }

    #[test]
    fn parse_empty_or_dimensionless_gives_dimensionless_unit() {
        assert!(Unit::parse("").unwrap().dimension().is_dimensionless());
        assert!(
            Unit::parse("dimensionless")
                .unwrap()
                .dimension()
                .is_dimensionless()
        );
    }

    #[test]
    fn parse_numeric_prefactor_for_reciprocal_units() {
        let per_ps = Unit::parse("1/ps").unwrap();
        assert_eq!(per_ps.dimension(), Dimension::TIME.powi(-1));
        assert_relative_eq!(per_ps.factor(), 1e12, max_relative = 1e-12);
    }

    #[test]
    fn parse_fails_for_unknown_symbol() {
        let result = Unit::parse("kJ/furlong");
        assert!(matches!(
            result,
            Err(UnitError::UnknownSymbol { ref symbol, .. }) if symbol == "furlong"
        ));
    }

    #[test]
    fn parse_fails_for_unbalanced_parentheses() {
        assert!(matches!(
            Unit::parse("kJ/(mol*nm"),
            Err(UnitError::Syntax { .. })
        ));
    }

    #[test]
    fn parse_fails_for_fractional_exponent() {
        assert!(matches!(
            Unit::parse("nm**0.5"),
            Err(UnitError::Syntax { .. })
        ));
    }

    #[test]
    fn parse_fails_for_oversized_exponent() {
        for expression in ["nm**99999999999", "nm^-3000000000", "(nm**2)**2147483647"] {
            assert!(
                matches!(Unit::parse(expression), Err(UnitError::Syntax { .. })),
                "{expression} should be rejected"
            );
        }
        assert!(Unit::parse(&format!("m**{}", MAX_EXPONENT)).is_ok());
    }

    #[test]
    fn parse_fails_when_nested_exponents_leave_the_factor_range() {
        assert!(matches!(
            Unit::parse("((nm**64)**64)**64"),
            Err(UnitError::Syntax { ref reason, .. }) if reason == "unit factor out of range"
        ));
    }

    #[test]
    fn parse_fails_for_trailing_tokens() {
        assert!(matches!(Unit::parse("nm )"), Err(UnitError::Syntax { .. })));
    }

    #[test]
    fn equality_ignores_spelling() {
        assert_eq!(Unit::parse("angstrom").unwrap(), Unit::parse("Å").unwrap());
        assert_eq!(Unit::parse("nm").unwrap(), Unit::parse("10*Å").unwrap());
        assert_ne!(Unit::parse("nm").unwrap(), Unit::parse("Å").unwrap());
    }

    #[test]
    fn conversion_factor_between_compatible_units() {
        let nm = Unit::parse("nm").unwrap();
        let angstrom = Unit::parse("Å").unwrap();
        assert_relative_eq!(
            nm.conversion_factor(&angstrom).unwrap(),
            10.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn conversion_factor_fails_between_incompatible_units() {
        let nm = Unit::parse("nm").unwrap();
        let result = nm.conversion_factor(&Unit::elementary_charge());
        assert!(matches!(result, Err(UnitError::Incompatible { .. })));
    }

    #[test]
    fn elementary_charge_matches_parsed_symbol() {
        assert_eq!(Unit::elementary_charge(), Unit::parse("e").unwrap());
        assert_eq!(Unit::elementary_charge().to_string(), "e");
    }
}
