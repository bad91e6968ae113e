//! # Core Module
//!
//! The building blocks for describing force-field potentials: runtime-dimensioned
//! quantities, symbolic expressions, validated potential records, and the
//! settings that tune validation.
//!
//! ## Architecture
//!
//! - **Quantities** ([`units`]) - Units, dimensions, and unit-tagged values
//! - **Expressions** ([`expression`]) - Parsed energy expressions and their free symbols
//! - **Potential Records** ([`potentials`]) - Atom, bond, angle, and dihedral types
//! - **Settings** ([`config`]) - Charge policy and member-resolution strictness

pub mod config;
pub mod expression;
pub mod potentials;
pub mod units;
