//! # potkit Core Library
//!
//! Definition-time validation for force-field potential parameters.
//!
//! A force field is described by typed potentials (atom types, bonds, angles,
//! dihedrals), each an energy expression plus the parameter values bound to its
//! symbols. This library checks such records as they are written, so that
//! inconsistent expressions, mistyped units, and malformed member lists are
//! caught before any energy is ever evaluated.
//!
//! ## Layers
//!
//! - **[`core`]** - Stateless records and their validation rules.
//! - **[`topology`]** - The registry that owns records and hands out stable keys
//!   to them, plus cross-record checks such as member-type resolution.

pub mod core;
pub mod topology;
