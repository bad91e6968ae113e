use super::error::PotentialError;
use super::link::{AtomTypeKey, BondedKey, PotentialKey, TopologyLink};
use super::potential::{Parameters, Potential, variable_set};
use super::warning::{Warning, Warnings};
use crate::core::expression::{Expression, ExpressionError, IntoExpression};
use crate::core::units::Quantity;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// The bonded interaction variants, distinguished by how many atom types take part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondedKind {
    /// Two bonded partners.
    Bond,
    /// Three bonded partners.
    Angle,
    /// Four bonded partners.
    Dihedral,
}

/// Default functional form of a bonded kind: expression, parameter values
/// (`name`, value, unit), and independent variables.
struct DefaultForm {
    expression: &'static str,
    parameters: &'static [(&'static str, f64, &'static str)],
    independent_variables: &'static [&'static str],
}

const BOND_FORM: DefaultForm = DefaultForm {
    expression: "0.5 * k * (r-r_eq)**2",
    parameters: &[("k", 1000.0, "kJ/(mol*nm**2)"), ("r_eq", 0.14, "nm")],
    independent_variables: &["r"],
};

const ANGLE_FORM: DefaultForm = DefaultForm {
    expression: "0.5 * k * (theta-theta_eq)**2",
    parameters: &[("k", 1000.0, "kJ/(deg**2)"), ("theta_eq", 180.0, "deg")],
    independent_variables: &["theta"],
};

const DIHEDRAL_FORM: DefaultForm = DefaultForm {
    expression: "k * (1 + cos(n * theta - theta_0))",
    parameters: &[
        ("k", 1000.0, "kJ/mol"),
        ("n", 1.0, "dimensionless"),
        ("theta_0", 180.0, "deg"),
    ],
    independent_variables: &["theta"],
};

impl BondedKind {
    pub const ALL: [BondedKind; 3] = [BondedKind::Bond, BondedKind::Angle, BondedKind::Dihedral];

    pub const fn arity(self) -> usize {
        match self {
            BondedKind::Bond => 2,
            BondedKind::Angle => 3,
            BondedKind::Dihedral => 4,
        }
    }

    pub const fn type_name(self) -> &'static str {
        match self {
            BondedKind::Bond => "BondType",
            BondedKind::Angle => "AngleType",
            BondedKind::Dihedral => "DihedralType",
        }
    }

    /// Name of the bookkeeping set a parent collection keeps this kind in.
    pub const fn set_ref(self) -> &'static str {
        match self {
            BondedKind::Bond => "bond_type_set",
            BondedKind::Angle => "angle_type_set",
            BondedKind::Dihedral => "dihedral_type_set",
        }
    }

    fn default_form(self) -> &'static DefaultForm {
        match self {
            BondedKind::Bond => &BOND_FORM,
            BondedKind::Angle => &ANGLE_FORM,
            BondedKind::Dihedral => &DIHEDRAL_FORM,
        }
    }

    pub fn default_expression(self) -> Result<Expression, ExpressionError> {
        Expression::parse(self.default_form().expression)
    }

    pub fn default_parameters(self) -> Result<Parameters, PotentialError> {
        self.default_form()
            .parameters
            .iter()
            .map(|(name, value, unit)| {
                Quantity::parse(*value, unit)
                    .map(|quantity| (name.to_string(), quantity))
                    .map_err(PotentialError::from)
            })
            .collect()
    }

    pub fn default_independent_variables(self) -> BTreeSet<String> {
        variable_set(self.default_form().independent_variables.iter().copied())
    }
}

impl fmt::Display for BondedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// One entry of a member-type list as supplied by a caller.
///
/// Member types link a bonded type to atom types by name only. A resolved
/// registry key is representable so that passing one can be rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberRef {
    Name(String),
    Handle(PotentialKey),
}

impl From<&str> for MemberRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for MemberRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for MemberRef {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<PotentialKey> for MemberRef {
    fn from(key: PotentialKey) -> Self {
        Self::Handle(key)
    }
}

impl From<AtomTypeKey> for MemberRef {
    fn from(key: AtomTypeKey) -> Self {
        Self::Handle(key.into())
    }
}

/// Checks a member-type list for `kind` and returns the names unchanged.
///
/// The list must hold exactly `kind.arity()` entries, or none at all for a type
/// not yet bound to specific atom types, and every entry must be a name.
pub fn validate_member_types<M, I>(kind: BondedKind, members: I) -> Result<Vec<String>, PotentialError>
where
    M: Into<MemberRef>,
    I: IntoIterator<Item = M>,
{
    let members: Vec<MemberRef> = members.into_iter().map(Into::into).collect();

    if !members.is_empty() && members.len() != kind.arity() {
        return Err(PotentialError::Arity {
            kind,
            expected: kind.arity(),
            found: members.len(),
        });
    }

    members
        .into_iter()
        .enumerate()
        .map(|(index, member)| match member {
            MemberRef::Name(name) => Ok(name),
            MemberRef::Handle(key) => Err(PotentialError::InvalidType(format!(
                "member {} of a {} is a resolved reference ({:?}); member types must be atom type names",
                index, kind, key
            ))),
        })
        .collect()
}

/// A bonded interaction type between `kind.arity()` atom types.
///
/// Bonds, angles, and dihedrals share this one representation; the
/// [`BondedKind`] tag selects the arity, the default functional form, and the
/// bookkeeping set name.
#[derive(Debug, Clone)]
pub struct BondedType {
    kind: BondedKind,
    potential: Potential,
    member_types: Vec<String>,
}

impl BondedType {
    pub fn builder(kind: BondedKind) -> BondedTypeBuilder {
        BondedTypeBuilder::new(kind)
    }

    pub fn bond() -> BondedTypeBuilder {
        Self::builder(BondedKind::Bond)
    }

    pub fn angle() -> BondedTypeBuilder {
        Self::builder(BondedKind::Angle)
    }

    pub fn dihedral() -> BondedTypeBuilder {
        Self::builder(BondedKind::Dihedral)
    }

    #[inline]
    pub fn kind(&self) -> BondedKind {
        self.kind
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.kind.arity()
    }

    pub fn name(&self) -> &str {
        self.potential.name()
    }

    pub fn potential(&self) -> &Potential {
        &self.potential
    }

    pub fn expression(&self) -> &Expression {
        self.potential.expression()
    }

    pub fn parameters(&self) -> &Parameters {
        self.potential.parameters()
    }

    pub fn independent_variables(&self) -> &BTreeSet<String> {
        self.potential.independent_variables()
    }

    pub fn member_types(&self) -> &[String] {
        &self.member_types
    }

    pub fn link(&self) -> &TopologyLink {
        self.potential.link()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.potential.set_name(name);
    }

    pub fn set_expression(&mut self, expression: impl IntoExpression) -> Result<(), PotentialError> {
        self.potential.set_expression(expression)
    }

    pub fn set_parameters(&mut self, parameters: Parameters) -> Result<(), PotentialError> {
        self.potential.set_parameters(parameters)
    }

    pub fn update_parameters(&mut self, parameters: Parameters) -> Result<(), PotentialError> {
        self.potential.update_parameters(parameters)
    }

    pub fn set_independent_variables<S, I>(&mut self, names: I) -> Result<(), PotentialError>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.potential.set_independent_variables(names)
    }

    pub fn redefine<E, S, I>(
        &mut self,
        expression: E,
        parameters: Parameters,
        independent_variables: I,
    ) -> Result<(), PotentialError>
    where
        E: IntoExpression,
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.potential
            .redefine(expression, parameters, independent_variables)
    }

    /// Replaces the member types.
    ///
    /// Rebinding an already bound type to different atom types changes which
    /// interaction it describes while its parameters stay the same; that case
    /// succeeds with a [`Warning::MembershipChange`].
    pub fn set_member_types<M, I>(&mut self, members: I) -> Result<Warnings, PotentialError>
    where
        M: Into<MemberRef>,
        I: IntoIterator<Item = M>,
    {
        let members = validate_member_types(self.kind, members)?;

        let mut warnings = Warnings::new();
        if !self.member_types.is_empty() && self.member_types != members {
            warnings.push(Warning::MembershipChange {
                kind: self.kind,
                from: self.member_types.clone(),
                to: members.clone(),
            });
        }

        self.member_types = members;
        Ok(warnings)
    }

    /// Records the key this type was given in its parent's bookkeeping set.
    pub(crate) fn attach(&mut self, key: BondedKey) {
        self.potential.attach(key.kind().set_ref(), key.into());
    }

    pub(crate) fn detach(&mut self) {
        self.potential.detach();
    }
}

impl PartialEq for BondedType {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.potential.name() == other.potential.name()
            && self.member_types == other.member_types
            && self.potential == other.potential
    }
}

impl fmt::Display for BondedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.kind, self.potential.name())
    }
}

/// Builds a [`BondedType`]; every field left unset takes the kind's default.
#[derive(Debug, Clone)]
pub struct BondedTypeBuilder {
    kind: BondedKind,
    name: Option<String>,
    expression: Option<Result<Expression, ExpressionError>>,
    parameters: Option<Parameters>,
    independent_variables: Option<BTreeSet<String>>,
    member_types: Vec<MemberRef>,
    set_ref: Option<String>,
}

impl BondedTypeBuilder {
    pub fn new(kind: BondedKind) -> Self {
        Self {
            kind,
            name: None,
            expression: None,
            parameters: None,
            independent_variables: None,
            member_types: Vec::new(),
            set_ref: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn expression(mut self, expression: impl IntoExpression) -> Self {
        self.expression = Some(expression.into_expression());
        self
    }

    pub fn parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn independent_variables<S, I>(mut self, names: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.independent_variables = Some(variable_set(names));
        self
    }

    pub fn member_types<M, I>(mut self, members: I) -> Self
    where
        M: Into<MemberRef>,
        I: IntoIterator<Item = M>,
    {
        self.member_types = members.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_ref(mut self, set_ref: impl Into<String>) -> Self {
        self.set_ref = Some(set_ref.into());
        self
    }

    pub fn build(self) -> Result<BondedType, PotentialError> {
        let kind = self.kind;
        let expression = match self.expression {
            Some(expression) => expression?,
            None => kind.default_expression()?,
        };
        let parameters = match self.parameters {
            Some(parameters) => parameters,
            None => kind.default_parameters()?,
        };
        let independent_variables = self
            .independent_variables
            .unwrap_or_else(|| kind.default_independent_variables());
        let name = self.name.unwrap_or_else(|| kind.type_name().to_string());

        let mut potential = Potential::new(name, expression, parameters, independent_variables)?;
        let member_types = validate_member_types(kind, self.member_types)?;
        potential.set_link(TopologyLink::new(
            self.set_ref.unwrap_or_else(|| kind.set_ref().to_string()),
        ));

        debug!(
            "Built {} '{}' with members {:?}",
            kind,
            potential.name(),
            member_types
        );

        Ok(BondedType {
            kind,
            potential,
            member_types,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::potentials::potential::parameter_map;
    use crate::core::potentials::link::AngleTypeKey;
    use slotmap::SlotMap;

    #[test]
    fn arity_matches_number_of_bonded_partners() {
        assert_eq!(BondedKind::Bond.arity(), 2);
        assert_eq!(BondedKind::Angle.arity(), 3);
        assert_eq!(BondedKind::Dihedral.arity(), 4);
    }

    #[test]
    fn every_kind_builds_from_its_defaults() {
        for kind in BondedKind::ALL {
            let bonded = BondedType::builder(kind).build().unwrap();
            assert_eq!(bonded.kind(), kind);
            assert_eq!(bonded.name(), kind.type_name());
            assert!(bonded.member_types().is_empty());
            assert_eq!(bonded.link().set_ref(), kind.set_ref());
            assert!(!bonded.link().is_attached());
        }
    }

    #[test]
    fn angle_defaults_use_harmonic_form() {
        let angle = BondedType::angle().build().unwrap();
        assert_eq!(
            angle.expression(),
            &Expression::parse("0.5 * k * (theta-theta_eq)**2").unwrap()
        );
        assert_eq!(
            angle.parameters().get("k"),
            Some(&Quantity::parse(1000.0, "kJ/deg**2").unwrap())
        );
        assert_eq!(
            angle.parameters().get("theta_eq"),
            Some(&Quantity::parse(180.0, "deg").unwrap())
        );
        assert!(angle.independent_variables().contains("theta"));
    }

    #[test]
    fn dihedral_defaults_use_periodic_form() {
        let dihedral = BondedType::dihedral().build().unwrap();
        let n = dihedral.parameters().get("n").unwrap();
        assert!(n.dimension().is_dimensionless());
        assert_eq!(n.value(), 1.0);
        assert!(dihedral.independent_variables().contains("theta"));
        assert_eq!(
            dihedral.parameters().get("theta_0"),
            Some(&Quantity::parse(180.0, "deg").unwrap())
        );
    }

    #[test]
    fn angle_with_two_members_fails_with_arity_error() {
        let result = BondedType::angle().member_types(["A", "B"]).build();
        assert!(matches!(
            result,
            Err(PotentialError::Arity {
                kind: BondedKind::Angle,
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn angle_with_three_members_succeeds() {
        let angle = BondedType::angle()
            .member_types(["A", "B", "C"])
            .build()
            .unwrap();
        assert_eq!(angle.member_types(), ["A", "B", "C"]);
    }

    #[test]
    fn angle_with_empty_members_succeeds() {
        let angle = BondedType::angle()
            .member_types(Vec::<String>::new())
            .build()
            .unwrap();
        assert!(angle.member_types().is_empty());
    }

    #[test]
    fn bond_and_dihedral_enforce_their_own_arity() {
        assert!(BondedType::bond().member_types(["A", "B"]).build().is_ok());
        assert!(BondedType::bond().member_types(["A", "B", "C"]).build().is_err());
        assert!(
            BondedType::dihedral()
                .member_types(["*", "C", "C", "*"])
                .build()
                .is_ok()
        );
        assert!(
            BondedType::dihedral()
                .member_types(["C", "C", "C"])
                .build()
                .is_err()
        );
    }

    #[test]
    fn validate_member_types_rejects_resolved_handles() {
        let mut slots: SlotMap<AtomTypeKey, ()> = SlotMap::with_key();
        let key = slots.insert(());
        let members = vec![
            MemberRef::from("A"),
            MemberRef::from(key),
            MemberRef::from("C"),
        ];
        let result = validate_member_types(BondedKind::Angle, members);
        assert!(matches!(result, Err(PotentialError::InvalidType(_))));
    }

    #[test]
    fn validate_member_types_checks_arity_before_entry_types() {
        let mut slots: SlotMap<AtomTypeKey, ()> = SlotMap::with_key();
        let key = slots.insert(());
        let result = validate_member_types(BondedKind::Bond, [MemberRef::from(key)]);
        assert!(matches!(result, Err(PotentialError::Arity { .. })));
    }

    #[test]
    fn validate_member_types_returns_names_unchanged() {
        let names = validate_member_types(BondedKind::Bond, ["opls_111", "opls_112"]).unwrap();
        assert_eq!(names, vec!["opls_111".to_string(), "opls_112".to_string()]);
    }

    #[test]
    fn set_member_types_warns_when_rebinding_a_bound_type() {
        let mut angle = BondedType::angle()
            .member_types(["A", "B", "C"])
            .build()
            .unwrap();
        let warnings = angle.set_member_types(["A", "B", "D"]).unwrap();
        assert!(warnings.has_membership_change());
        assert_eq!(angle.member_types(), ["A", "B", "D"]);
    }

    #[test]
    fn set_member_types_does_not_warn_when_binding_an_unbound_type() {
        let mut angle = BondedType::angle().build().unwrap();
        let warnings = angle.set_member_types(["A", "B", "C"]).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn set_member_types_is_idempotent() {
        let mut angle = BondedType::angle()
            .member_types(["A", "B", "C"])
            .build()
            .unwrap();
        let first = angle.set_member_types(["C", "B", "A"]).unwrap();
        let after_first = angle.clone();
        let second = angle.set_member_types(["C", "B", "A"]).unwrap();

        assert!(first.has_membership_change());
        assert!(second.is_empty());
        assert_eq!(angle, after_first);
    }

    #[test]
    fn set_member_types_keeps_state_on_arity_error() {
        let mut angle = BondedType::angle()
            .member_types(["A", "B", "C"])
            .build()
            .unwrap();
        let result = angle.set_member_types(["A", "B"]);
        assert!(matches!(result, Err(PotentialError::Arity { .. })));
        assert_eq!(angle.member_types(), ["A", "B", "C"]);
    }

    #[test]
    fn builder_validates_custom_expression_against_default_parameters() {
        let result = BondedType::bond()
            .expression("0.5 * k * (r-r_eq)**2 + c")
            .build();
        assert!(matches!(
            result,
            Err(PotentialError::InconsistentExpression { .. })
        ));
    }

    #[test]
    fn builder_accepts_fully_custom_form() {
        let morse = BondedType::bond()
            .name("morse")
            .expression("D * (1 - exp(a * (r_eq - r)))**2")
            .parameters(parameter_map([
                ("D", Quantity::parse(400.0, "kJ/mol").unwrap()),
                ("a", Quantity::parse(20.0, "1/nm").unwrap()),
                ("r_eq", Quantity::parse(0.1, "nm").unwrap()),
            ]))
            .member_types(["C", "H"])
            .build()
            .unwrap();
        assert_eq!(morse.name(), "morse");
        assert_eq!(morse.parameters().len(), 3);
    }

    #[test]
    fn builder_reports_expression_parse_errors() {
        let result = BondedType::bond().expression("0.5 * k * (r-r_eq").build();
        assert!(matches!(result, Err(PotentialError::Expression(_))));
    }

    #[test]
    fn mutators_delegate_validation_to_the_potential() {
        let mut bond = BondedType::bond().build().unwrap();
        let before = bond.clone();
        assert!(
            bond.set_parameters(parameter_map([("k", Quantity::dimensionless(1.0))]))
                .is_err()
        );
        assert_eq!(bond, before);

        bond.update_parameters(parameter_map([(
            "r_eq",
            Quantity::parse(0.15, "nm").unwrap(),
        )]))
        .unwrap();
        assert_eq!(bond.parameters().get("r_eq").unwrap().value(), 0.15);
    }

    #[test]
    fn attach_resets_set_ref_to_kind_default() {
        let mut slots: SlotMap<AngleTypeKey, ()> = SlotMap::with_key();
        let key = BondedKey::from(slots.insert(()));
        let mut angle = BondedType::angle().set_ref("scratch").build().unwrap();
        assert_eq!(angle.link().set_ref(), "scratch");

        angle.attach(key);
        assert_eq!(angle.link().set_ref(), "angle_type_set");
        assert_eq!(angle.link().key(), Some(PotentialKey::Bonded(key)));

        angle.detach();
        assert!(!angle.link().is_attached());
    }

    #[test]
    fn display_names_kind_and_type() {
        let angle = BondedType::angle().name("C~C~C").build().unwrap();
        assert_eq!(angle.to_string(), "<AngleType C~C~C>");
    }

    #[test]
    fn equality_includes_kind_and_members() {
        let a = BondedType::angle().member_types(["A", "B", "C"]).build().unwrap();
        let b = BondedType::angle().member_types(["A", "B", "C"]).build().unwrap();
        let c = BondedType::angle().member_types(["A", "B", "D"]).build().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
