use crate::core::config::ValidationConfig;
use crate::core::expression::{Expression, IntoExpression};
use crate::core::potentials::{
    AngleTypeKey, AtomType, AtomTypeKey, BondTypeKey, BondedKey, BondedKind, BondedType,
    DihedralTypeKey, Parameters, PotentialError, PotentialKey, Warnings,
};
use crate::core::units::QuantityInput;
use slotmap::SlotMap;
use std::fmt;
use std::ops::Deref;
use thiserror::Error;
use tracing::{debug, warn};

/// Member name that matches any atom type.
pub const WILDCARD_MEMBER: &str = "*";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("An atom type named '{0}' is already registered")]
    DuplicateAtomType(String),

    #[error("No registered entry has key {0:?}")]
    UnknownKey(PotentialKey),

    #[error("{} bonded member type(s) name no registered atom type: {}", .0.len(), format_unresolved(.0))]
    UnresolvedMembers(Vec<UnresolvedMember>),
}

fn format_unresolved(unresolved: &[UnresolvedMember]) -> String {
    unresolved
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A bonded member-type name that matches no registered atom type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedMember {
    pub kind: BondedKind,
    pub key: BondedKey,
    pub type_name: String,
    pub member: String,
}

impl fmt::Display for UnresolvedMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' in {} '{}'",
            self.member, self.kind, self.type_name
        )
    }
}

/// Owns every typed potential of a force field.
///
/// Atom types and each bonded kind live in their own bookkeeping set. Records
/// added here are attached to the set they land in, and detached again when
/// removed, so each one always knows where it is kept.
#[derive(Debug, Clone, Default)]
pub struct PotentialRegistry {
    atom_types: SlotMap<AtomTypeKey, AtomType>,
    bond_types: SlotMap<BondTypeKey, BondedType>,
    angle_types: SlotMap<AngleTypeKey, BondedType>,
    dihedral_types: SlotMap<DihedralTypeKey, BondedType>,
}

/// Mutable access to a registered atom type.
///
/// Everything but the name can be changed through it; renaming goes through
/// [`PotentialRegistry::rename_atom_type`], which keeps names unique.
#[derive(Debug)]
pub struct AtomTypeMut<'a> {
    atom_type: &'a mut AtomType,
}

impl Deref for AtomTypeMut<'_> {
    type Target = AtomType;

    fn deref(&self) -> &AtomType {
        self.atom_type
    }
}

impl AtomTypeMut<'_> {
    pub fn set_charge(&mut self, charge: impl Into<QuantityInput>) -> Result<Warnings, PotentialError> {
        self.atom_type.set_charge(charge)
    }

    pub fn set_nb_function(
        &mut self,
        nb_function: Option<Expression>,
        parameters: Option<Parameters>,
    ) -> Result<(), PotentialError> {
        self.atom_type.set_nb_function(nb_function, parameters)
    }

    pub fn set_nb_expression(&mut self, expression: impl IntoExpression) -> Result<(), PotentialError> {
        self.atom_type.set_nb_expression(expression)
    }

    pub fn clear_nb_function(&mut self) {
        self.atom_type.clear_nb_function();
    }

    pub fn update_parameters(&mut self, parameters: Parameters) -> Result<(), PotentialError> {
        self.atom_type.update_parameters(parameters)
    }

    pub fn set_independent_variables<S, I>(&mut self, names: I) -> Result<(), PotentialError>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.atom_type.set_independent_variables(names)
    }
}

impl PotentialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an atom type under a fresh key.
    ///
    /// # Arguments
    ///
    /// * `atom_type` - The atom type to take ownership of.
    ///
    /// # Return
    ///
    /// The key of the new entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateAtomType`] if an atom type of the same
    /// name is already registered, since bonded member types refer to atom
    /// types by name.
    pub fn add_atom_type(&mut self, mut atom_type: AtomType) -> Result<AtomTypeKey, RegistryError> {
        if self.find_atom_type(atom_type.name()).is_some() {
            return Err(RegistryError::DuplicateAtomType(atom_type.name().to_string()));
        }
        let key = self.atom_types.insert_with_key(|key| {
            atom_type.attach(key);
            atom_type
        });
        debug!("Registered atom type with key {:?}", key);
        Ok(key)
    }

    /// Registers a bonded type in the set for its kind.
    ///
    /// # Return
    ///
    /// A key tagged with that set, so it can never address another one.
    pub fn add_bonded_type(&mut self, bonded_type: BondedType) -> BondedKey {
        fn insert<K: slotmap::Key>(
            set: &mut SlotMap<K, BondedType>,
            mut bonded_type: BondedType,
            tag: fn(K) -> BondedKey,
        ) -> BondedKey {
            tag(set.insert_with_key(|key| {
                bonded_type.attach(tag(key));
                bonded_type
            }))
        }

        let key = match bonded_type.kind() {
            BondedKind::Bond => insert(&mut self.bond_types, bonded_type, BondedKey::Bond),
            BondedKind::Angle => insert(&mut self.angle_types, bonded_type, BondedKey::Angle),
            BondedKind::Dihedral => {
                insert(&mut self.dihedral_types, bonded_type, BondedKey::Dihedral)
            }
        };
        debug!("Registered {} with key {:?}", key.kind(), key);
        key
    }

    pub fn remove_atom_type(&mut self, key: AtomTypeKey) -> Option<AtomType> {
        let mut atom_type = self.atom_types.remove(key)?;
        atom_type.detach();
        Some(atom_type)
    }

    pub fn remove_bonded_type(&mut self, key: BondedKey) -> Option<BondedType> {
        let mut bonded_type = match key {
            BondedKey::Bond(key) => self.bond_types.remove(key),
            BondedKey::Angle(key) => self.angle_types.remove(key),
            BondedKey::Dihedral(key) => self.dihedral_types.remove(key),
        }?;
        bonded_type.detach();
        Some(bonded_type)
    }

    pub fn atom_type(&self, key: AtomTypeKey) -> Option<&AtomType> {
        self.atom_types.get(key)
    }

    pub fn atom_type_mut(&mut self, key: AtomTypeKey) -> Option<AtomTypeMut<'_>> {
        self.atom_types
            .get_mut(key)
            .map(|atom_type| AtomTypeMut { atom_type })
    }

    /// Renames a registered atom type.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownKey`] if `key` is not registered, and
    /// [`RegistryError::DuplicateAtomType`] if another atom type already has
    /// `name`. The entry is left unchanged on error.
    pub fn rename_atom_type(
        &mut self,
        key: AtomTypeKey,
        name: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if !self.atom_types.contains_key(key) {
            return Err(RegistryError::UnknownKey(key.into()));
        }
        if let Some((existing, _)) = self.find_atom_type(&name) {
            if existing != key {
                return Err(RegistryError::DuplicateAtomType(name));
            }
        }
        if let Some(atom_type) = self.atom_types.get_mut(key) {
            debug!("Renaming atom type '{}' to '{}'", atom_type.name(), name);
            atom_type.set_name(name);
        }
        Ok(())
    }

    pub fn bonded_type(&self, key: BondedKey) -> Option<&BondedType> {
        match key {
            BondedKey::Bond(key) => self.bond_types.get(key),
            BondedKey::Angle(key) => self.angle_types.get(key),
            BondedKey::Dihedral(key) => self.dihedral_types.get(key),
        }
    }

    pub fn bonded_type_mut(&mut self, key: BondedKey) -> Option<&mut BondedType> {
        match key {
            BondedKey::Bond(key) => self.bond_types.get_mut(key),
            BondedKey::Angle(key) => self.angle_types.get_mut(key),
            BondedKey::Dihedral(key) => self.dihedral_types.get_mut(key),
        }
    }

    /// Looks up an atom type by name.
    pub fn find_atom_type(&self, name: &str) -> Option<(AtomTypeKey, &AtomType)> {
        self.atom_types
            .iter()
            .find(|(_, atom_type)| atom_type.name() == name)
    }

    pub fn atom_types_iter(&self) -> impl Iterator<Item = (AtomTypeKey, &AtomType)> {
        self.atom_types.iter()
    }

    pub fn bonded_types_iter(
        &self,
        kind: BondedKind,
    ) -> Box<dyn Iterator<Item = (BondedKey, &BondedType)> + '_> {
        match kind {
            BondedKind::Bond => Box::new(
                self.bond_types
                    .iter()
                    .map(|(key, bonded)| (BondedKey::Bond(key), bonded)),
            ),
            BondedKind::Angle => Box::new(
                self.angle_types
                    .iter()
                    .map(|(key, bonded)| (BondedKey::Angle(key), bonded)),
            ),
            BondedKind::Dihedral => Box::new(
                self.dihedral_types
                    .iter()
                    .map(|(key, bonded)| (BondedKey::Dihedral(key), bonded)),
            ),
        }
    }

    pub fn atom_type_count(&self) -> usize {
        self.atom_types.len()
    }

    pub fn bonded_type_count(&self, kind: BondedKind) -> usize {
        match kind {
            BondedKind::Bond => self.bond_types.len(),
            BondedKind::Angle => self.angle_types.len(),
            BondedKind::Dihedral => self.dihedral_types.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.atom_types.is_empty()
            && BondedKind::ALL
                .iter()
                .all(|&kind| self.bonded_type_count(kind) == 0)
    }

    /// Collects every bonded member-type name that matches no registered atom
    /// type. The wildcard [`WILDCARD_MEMBER`] always matches.
    pub fn unresolved_members(&self) -> Vec<UnresolvedMember> {
        let mut unresolved = Vec::new();
        for kind in BondedKind::ALL {
            for (key, bonded_type) in self.bonded_types_iter(kind) {
                for member in bonded_type.member_types() {
                    if member == WILDCARD_MEMBER || self.find_atom_type(member).is_some() {
                        continue;
                    }
                    unresolved.push(UnresolvedMember {
                        kind,
                        key,
                        type_name: bonded_type.name().to_string(),
                        member: member.clone(),
                    });
                }
            }
        }
        debug!("Found {} unresolved member type(s)", unresolved.len());
        unresolved
    }

    /// Checks member-type resolution according to `config`.
    ///
    /// Unresolved members are logged and returned when `strict_members` is off,
    /// and turned into [`RegistryError::UnresolvedMembers`] when it is on.
    pub fn check_members(&self, config: &ValidationConfig) -> Result<Vec<UnresolvedMember>, RegistryError> {
        let unresolved = self.unresolved_members();
        if config.strict_members && !unresolved.is_empty() {
            return Err(RegistryError::UnresolvedMembers(unresolved));
        }
        for member in &unresolved {
            warn!("Unresolved member type {}", member);
        }
        Ok(unresolved)
    }
}
