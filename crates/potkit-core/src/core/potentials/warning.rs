use super::bonded::BondedKind;
use crate::core::units::Dimension;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum CoercionReason {
    /// The value carried no unit at all.
    MissingUnit,
    /// The value carried a unit of some other dimension, which was discarded.
    IncompatibleDimension { unit: String, dimension: Dimension },
}

/// A non-fatal advisory produced by a successful validation or mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    DimensionalCoercion { value: f64, reason: CoercionReason },
    MembershipChange {
        kind: BondedKind,
        from: Vec<String>,
        to: Vec<String>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DimensionalCoercion {
                value,
                reason: CoercionReason::MissingUnit,
            } => write!(
                f,
                "Charge {} has no unit; assuming elementary charge",
                value
            ),
            Warning::DimensionalCoercion {
                value,
                reason: CoercionReason::IncompatibleDimension { unit, dimension },
            } => write!(
                f,
                "Charge {} {} has dimension {}; discarding the unit and assuming elementary charge",
                value, unit, dimension
            ),
            Warning::MembershipChange { kind, from, to } => write!(
                f,
                "Changing a {}'s constituent member types: {:?} to {:?}",
                kind, from, to
            ),
        }
    }
}

/// Advisories collected while validating one construction or mutation.
///
/// Every warning is logged through `tracing` as it is recorded, so callers that
/// ignore the returned collection still see it in the log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.0.push(warning);
    }

    pub fn append(&mut self, other: Warnings) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.0.iter()
    }

    pub fn has_dimensional_coercion(&self) -> bool {
        self.0
            .iter()
            .any(|w| matches!(w, Warning::DimensionalCoercion { .. }))
    }

    pub fn has_membership_change(&self) -> bool {
        self.0
            .iter()
            .any(|w| matches!(w, Warning::MembershipChange { .. }))
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.0
    }
}

impl IntoIterator for Warnings {
    type Item = Warning;
    type IntoIter = std::vec::IntoIter<Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
