//! # Topology Module
//!
//! Ownership of a force field's typed potentials.
//!
//! [`PotentialRegistry`] keeps atom types and every bonded kind in separate
//! bookkeeping sets addressed by stable [`PotentialKey`](crate::core::potentials::PotentialKey)s.
//! Bonded types refer to atom types by name only, so resolving those names is a
//! registry-level check rather than part of validating a single record.

mod registry;

pub use registry::{
    AtomTypeMut, PotentialRegistry, RegistryError, UnresolvedMember, WILDCARD_MEMBER,
};
