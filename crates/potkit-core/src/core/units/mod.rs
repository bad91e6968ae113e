//! # Units Module
//!
//! Unit-tagged scalar values with runtime dimensional analysis.
//!
//! Force-field parameter mappings mix quantities of many dimensions in one
//! collection (a bond stiffness in `kJ/(mol*nm**2)` next to an equilibrium
//! length in `nm`), so dimensions are tracked at runtime rather than in the type
//! system. Unit expressions are parsed against a static symbol table and reduced
//! to an SI factor plus a [`Dimension`].
//!
//! ## Key Components
//!
//! - [`Dimension`] - Exponents over the base dimensions (plane angle included)
//! - [`Unit`] - A parsed unit expression
//! - [`Quantity`] - A value tagged with a unit, with conversion and closeness checks
//! - [`QuantityInput`] - Caller-supplied values that may lack a unit

mod dimension;
mod quantity;
mod table;
mod unit;

pub use dimension::Dimension;
pub use quantity::{Quantity, QuantityInput, Tolerance};
pub use unit::{MAX_EXPONENT, Unit, UnitError};
