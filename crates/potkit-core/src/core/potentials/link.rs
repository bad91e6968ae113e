use super::bonded::BondedKind;
use slotmap::new_key_type;

new_key_type! {
    /// Slot of an atom type in its registry's atom type set.
    pub struct AtomTypeKey;
    /// Slot of a bond type in its registry's bond type set.
    pub struct BondTypeKey;
    /// Slot of an angle type in its registry's angle type set.
    pub struct AngleTypeKey;
    /// Slot of a dihedral type in its registry's dihedral type set.
    pub struct DihedralTypeKey;
}

/// Key of a bonded type; the variant names the set the slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondedKey {
    Bond(BondTypeKey),
    Angle(AngleTypeKey),
    Dihedral(DihedralTypeKey),
}

impl BondedKey {
    pub fn kind(&self) -> BondedKind {
        match self {
            BondedKey::Bond(_) => BondedKind::Bond,
            BondedKey::Angle(_) => BondedKind::Angle,
            BondedKey::Dihedral(_) => BondedKind::Dihedral,
        }
    }
}

impl From<BondTypeKey> for BondedKey {
    fn from(key: BondTypeKey) -> Self {
        Self::Bond(key)
    }
}

impl From<AngleTypeKey> for BondedKey {
    fn from(key: AngleTypeKey) -> Self {
        Self::Angle(key)
    }
}

impl From<DihedralTypeKey> for BondedKey {
    fn from(key: DihedralTypeKey) -> Self {
        Self::Dihedral(key)
    }
}

/// Any key handed out by a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PotentialKey {
    AtomType(AtomTypeKey),
    Bonded(BondedKey),
}

impl From<AtomTypeKey> for PotentialKey {
    fn from(key: AtomTypeKey) -> Self {
        Self::AtomType(key)
    }
}

impl From<BondedKey> for PotentialKey {
    fn from(key: BondedKey) -> Self {
        Self::Bonded(key)
    }
}

/// Non-owning association between a typed potential and the parent collection
/// that keeps it.
///
/// The parent stores the potential; the potential only remembers the name of
/// the bookkeeping set it belongs to and, once registered, its key in that set.
/// Nothing here ever dereferences the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyLink {
    set_ref: String,
    key: Option<PotentialKey>,
}

impl TopologyLink {
    pub fn new(set_ref: impl Into<String>) -> Self {
        Self {
            set_ref: set_ref.into(),
            key: None,
        }
    }

    pub fn set_ref(&self) -> &str {
        &self.set_ref
    }

    pub fn key(&self) -> Option<PotentialKey> {
        self.key
    }

    pub fn is_attached(&self) -> bool {
        self.key.is_some()
    }

    pub(crate) fn attach(&mut self, set_ref: &str, key: PotentialKey) {
        self.set_ref = set_ref.to_string();
        self.key = Some(key);
    }

    pub(crate) fn detach(&mut self) {
        self.key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn new_link_is_detached() {
        let link = TopologyLink::new("angle_type_set");
        assert_eq!(link.set_ref(), "angle_type_set");
        assert!(!link.is_attached());
        assert_eq!(link.key(), None);
    }

    #[test]
    fn attach_records_key_and_resets_set_ref() {
        let mut slots: SlotMap<AngleTypeKey, ()> = SlotMap::with_key();
        let key = BondedKey::from(slots.insert(()));

        let mut link = TopologyLink::new("custom_set");
        link.attach("angle_type_set", key.into());
        assert_eq!(link.key(), Some(PotentialKey::Bonded(key)));
        assert_eq!(link.set_ref(), "angle_type_set");

        link.detach();
        assert!(!link.is_attached());
        assert_eq!(link.set_ref(), "angle_type_set");
    }

    #[test]
    fn first_slots_of_different_sets_stay_distinct() {
        let mut bonds: SlotMap<BondTypeKey, ()> = SlotMap::with_key();
        let mut angles: SlotMap<AngleTypeKey, ()> = SlotMap::with_key();
        let bond = BondedKey::from(bonds.insert(()));
        let angle = BondedKey::from(angles.insert(()));

        assert_ne!(bond, angle);
        assert_eq!(bond.kind(), BondedKind::Bond);
        assert_eq!(angle.kind(), BondedKind::Angle);
    }
}
