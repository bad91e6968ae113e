use super::dimension::Dimension;
use phf::{Map, phf_map};
use physical_constants::{ATOMIC_MASS_CONSTANT, ELEMENTARY_CHARGE};
use std::f64::consts::PI;

/// A named unit symbol: its factor to the SI (radian for angles) base and its dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseUnit {
    pub factor: f64,
    pub dimension: Dimension,
}

impl BaseUnit {
    const fn new(factor: f64, dimension: Dimension) -> Self {
        Self { factor, dimension }
    }
}

const ENERGY: Dimension = Dimension::new(2, 1, -2, 0, 0, 0, 0);
const CHARGE: Dimension = Dimension::new(0, 0, 1, 1, 0, 0, 0);

static UNIT_SYMBOLS: Map<&'static str, BaseUnit> = phf_map! {
    "dimensionless" => BaseUnit::new(1.0, Dimension::NONE),

    "m" => BaseUnit::new(1.0, Dimension::LENGTH),
    "cm" => BaseUnit::new(1e-2, Dimension::LENGTH),
    "mm" => BaseUnit::new(1e-3, Dimension::LENGTH),
    "um" => BaseUnit::new(1e-6, Dimension::LENGTH),
    "nm" => BaseUnit::new(1e-9, Dimension::LENGTH),
    "pm" => BaseUnit::new(1e-12, Dimension::LENGTH),
    "Å" => BaseUnit::new(1e-10, Dimension::LENGTH),
    "angstrom" => BaseUnit::new(1e-10, Dimension::LENGTH),

    "kg" => BaseUnit::new(1.0, Dimension::MASS),
    "g" => BaseUnit::new(1e-3, Dimension::MASS),
    "amu" => BaseUnit::new(ATOMIC_MASS_CONSTANT, Dimension::MASS),
    "Da" => BaseUnit::new(ATOMIC_MASS_CONSTANT, Dimension::MASS),

    "s" => BaseUnit::new(1.0, Dimension::TIME),
    "ms" => BaseUnit::new(1e-3, Dimension::TIME),
    "us" => BaseUnit::new(1e-6, Dimension::TIME),
    "ns" => BaseUnit::new(1e-9, Dimension::TIME),
    "ps" => BaseUnit::new(1e-12, Dimension::TIME),
    "fs" => BaseUnit::new(1e-15, Dimension::TIME),

    "A" => BaseUnit::new(1.0, Dimension::CURRENT),
    "K" => BaseUnit::new(1.0, Dimension::TEMPERATURE),
    "mol" => BaseUnit::new(1.0, Dimension::AMOUNT),

    "rad" => BaseUnit::new(1.0, Dimension::ANGLE),
    "radian" => BaseUnit::new(1.0, Dimension::ANGLE),
    "deg" => BaseUnit::new(PI / 180.0, Dimension::ANGLE),
    "degree" => BaseUnit::new(PI / 180.0, Dimension::ANGLE),

    "J" => BaseUnit::new(1.0, ENERGY),
    "kJ" => BaseUnit::new(1e3, ENERGY),
    "cal" => BaseUnit::new(4.184, ENERGY),
    "kcal" => BaseUnit::new(4184.0, ENERGY),
    "eV" => BaseUnit::new(ELEMENTARY_CHARGE, ENERGY),
    "N" => BaseUnit::new(1.0, Dimension::FORCE),

    "C" => BaseUnit::new(1.0, CHARGE),
    "e" => BaseUnit::new(ELEMENTARY_CHARGE, CHARGE),
    "qe" => BaseUnit::new(ELEMENTARY_CHARGE, CHARGE),
    "elementary_charge" => BaseUnit::new(ELEMENTARY_CHARGE, CHARGE),
};

pub fn lookup(symbol: &str) -> Option<&'static BaseUnit> {
    UNIT_SYMBOLS.get(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_common_force_field_units() {
        for symbol in ["nm", "kJ", "mol", "deg", "rad", "e", "Å", "kcal"] {
            assert!(lookup(symbol).is_some(), "missing unit symbol {symbol}");
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(lookup("K").unwrap().dimension, Dimension::TEMPERATURE);
        assert!(lookup("k").is_none());
    }

    #[test]
    fn elementary_charge_aliases_share_one_definition() {
        assert_eq!(lookup("e"), lookup("elementary_charge"));
        assert_eq!(lookup("e"), lookup("qe"));
        assert_eq!(lookup("e").unwrap().dimension, Dimension::CHARGE);
    }

    #[test]
    fn degree_factor_converts_to_radians() {
        let deg = lookup("deg").unwrap();
        assert!((deg.factor * 180.0 - PI).abs() < 1e-15);
    }
}
