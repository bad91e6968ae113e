use std::fmt;
use std::ops::{Div, Mul};

/// Physical dimension expressed as integer exponents over the base dimensions.
///
/// Plane angle is tracked as its own base dimension so that an angle stiffness
/// in `kJ/deg**2` is distinguishable from a plain energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension {
    pub length: i32,
    pub mass: i32,
    pub time: i32,
    pub current: i32,
    pub temperature: i32,
    pub amount: i32,
    pub angle: i32,
}

impl Dimension {
    pub const NONE: Self = Self::new(0, 0, 0, 0, 0, 0, 0);
    pub const LENGTH: Self = Self::new(1, 0, 0, 0, 0, 0, 0);
    pub const MASS: Self = Self::new(0, 1, 0, 0, 0, 0, 0);
    pub const TIME: Self = Self::new(0, 0, 1, 0, 0, 0, 0);
    pub const CURRENT: Self = Self::new(0, 0, 0, 1, 0, 0, 0);
    pub const TEMPERATURE: Self = Self::new(0, 0, 0, 0, 1, 0, 0);
    pub const AMOUNT: Self = Self::new(0, 0, 0, 0, 0, 1, 0);
    pub const ANGLE: Self = Self::new(0, 0, 0, 0, 0, 0, 1);
    pub const CHARGE: Self = Self::new(0, 0, 1, 1, 0, 0, 0);
    pub const ENERGY: Self = Self::new(2, 1, -2, 0, 0, 0, 0);
    pub const FORCE: Self = Self::new(1, 1, -2, 0, 0, 0, 0);

    pub const fn new(
        length: i32,
        mass: i32,
        time: i32,
        current: i32,
        temperature: i32,
        amount: i32,
        angle: i32,
    ) -> Self {
        Self {
            length,
            mass,
            time,
            current,
            temperature,
            amount,
            angle,
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::NONE
    }

    /// Raises every exponent to the `n`th power.
    ///
    /// # Panics
    ///
    /// Panics on exponent overflow; see [`Dimension::checked_powi`].
    pub fn powi(self, n: i32) -> Self {
        match self.checked_powi(n) {
            Some(dimension) => dimension,
            None => panic!("dimension exponent overflow in {}**{}", self, n),
        }
    }

    /// Like [`Dimension::powi`], but `None` on exponent overflow.
    pub fn checked_powi(self, n: i32) -> Option<Self> {
        self.zip_with(Self::NONE, |exp, _| exp.checked_mul(n))
    }

    /// Product of two dimensions, or `None` on exponent overflow.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        self.zip_with(rhs, i32::checked_add)
    }

    /// Quotient of two dimensions, or `None` on exponent overflow.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        self.zip_with(rhs, i32::checked_sub)
    }

    fn zip_with(self, rhs: Self, op: impl Fn(i32, i32) -> Option<i32>) -> Option<Self> {
        Some(Self {
            length: op(self.length, rhs.length)?,
            mass: op(self.mass, rhs.mass)?,
            time: op(self.time, rhs.time)?,
            current: op(self.current, rhs.current)?,
            temperature: op(self.temperature, rhs.temperature)?,
            amount: op(self.amount, rhs.amount)?,
            angle: op(self.angle, rhs.angle)?,
        })
    }

    fn exponents(&self) -> [(&'static str, i32); 7] {
        [
            ("length", self.length),
            ("mass", self.mass),
            ("time", self.time),
            ("current", self.current),
            ("temperature", self.temperature),
            ("amount", self.amount),
            ("angle", self.angle),
        ]
    }
}

impl Mul for Dimension {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        match self.checked_mul(rhs) {
            Some(dimension) => dimension,
            None => panic!("dimension exponent overflow in ({}) * ({})", self, rhs),
        }
    }
}

impl Div for Dimension {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        match self.checked_div(rhs) {
            Some(dimension) => dimension,
            None => panic!("dimension exponent overflow in ({}) / ({})", self, rhs),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        let parts: Vec<String> = self
            .exponents()
            .iter()
            .filter(|(_, exp)| *exp != 0)
            .map(|(name, exp)| match exp {
                1 => name.to_string(),
                _ => format!("{}**{}", name, exp),
            })
            .collect();
        write!(f, "{}", parts.join("*"))
    }
}
