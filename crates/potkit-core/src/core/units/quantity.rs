use super::dimension::Dimension;
use super::unit::{Unit, UnitError};
use approx::relative_eq;
use std::fmt;

/// Absolute and relative tolerance for numeric closeness: `|a - b| <= absolute`,
/// or within `relative` of the larger magnitude. Defaults match numpy's `isclose`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub absolute: f64,
    pub relative: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            absolute: 1e-8,
            relative: 1e-5,
        }
    }
}

/// A scalar value tagged with a [`Unit`].
#[derive(Debug, Clone)]
pub struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Builds a quantity from a value and a unit expression such as `"kJ/mol"`.
    pub fn parse(value: f64, unit: &str) -> Result<Self, UnitError> {
        Ok(Self::new(value, Unit::parse(unit)?))
    }

    pub fn dimensionless(value: f64) -> Self {
        Self::new(value, Unit::dimensionless())
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.unit.dimension()
    }

    /// The value expressed in SI base units (radians for angles).
    pub fn si_value(&self) -> f64 {
        self.value * self.unit.factor()
    }

    pub fn to(&self, unit: &Unit) -> Result<Quantity, UnitError> {
        let factor = self.unit.conversion_factor(unit)?;
        Ok(Self::new(self.value * factor, unit.clone()))
    }

    pub fn convert(&self, unit: &str) -> Result<Quantity, UnitError> {
        self.to(&Unit::parse(unit)?)
    }

    /// Numeric closeness after converting `other` into this quantity's unit.
    ///
    /// Quantities of different dimensions are never close.
    pub fn is_close(&self, other: &Quantity, tolerance: Tolerance) -> bool {
        match other.to(&self.unit) {
            Ok(other) => relative_eq!(
                self.value,
                other.value,
                epsilon = tolerance.absolute,
                max_relative = tolerance.relative
            ),
            Err(_) => false,
        }
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.dimension() == other.dimension()
            && relative_eq!(self.si_value(), other.si_value(), max_relative = 1e-12)
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Self::dimensionless(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dimension().is_dimensionless() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}

/// A value as supplied by a caller: either already unit-tagged or a bare number
/// whose unit has to be assumed by the receiving field.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityInput {
    Bare(f64),
    Tagged(Quantity),
}

impl From<f64> for QuantityInput {
    fn from(value: f64) -> Self {
        Self::Bare(value)
    }
}

impl From<Quantity> for QuantityInput {
    fn from(quantity: Quantity) -> Self {
        Self::Tagged(quantity)
    }
}
