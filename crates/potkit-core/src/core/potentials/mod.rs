//! # Potentials Module
//!
//! Typed force-field potential records and the validation rules that keep them
//! internally consistent.
//!
//! ## Overview
//!
//! A potential couples a symbolic energy expression with named parameter values
//! and the independent variables it is evaluated over. Every record enforces, at
//! construction and after every mutation, that the parameter names together with
//! the independent variables are exactly the free symbols of the expression.
//! A mutation that would break this leaves the record untouched and returns an
//! error.
//!
//! ## Key Components
//!
//! - [`Potential`] - The base record shared by every bonded type
//! - [`AtomType`] - Nonbonded particle type with charge normalization
//! - [`BondedType`] - Bond, angle, and dihedral types tagged by [`BondedKind`]
//! - [`Warnings`] - Non-fatal advisories returned alongside successful results
//! - [`TopologyLink`] - Non-owning back-reference into a parent registry

mod atom_type;
mod bonded;
mod error;
mod link;
mod potential;
mod warning;

pub use atom_type::{
    ATOM_TYPE_SET, AtomType, AtomTypeBuilder, DEFAULT_NB_FUNCTION, validate_charge,
};
pub use bonded::{BondedKind, BondedType, BondedTypeBuilder, MemberRef, validate_member_types};
pub use error::PotentialError;
pub use link::{
    AngleTypeKey, AtomTypeKey, BondTypeKey, BondedKey, DihedralTypeKey, PotentialKey, TopologyLink,
};
pub use potential::{Parameters, Potential, check_consistency, parameter_map};
pub use warning::{CoercionReason, Warning, Warnings};
