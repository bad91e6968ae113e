use super::error::PotentialError;
use super::link::{AtomTypeKey, TopologyLink};
use super::potential::{Parameters, check_consistency, parameter_map, variable_set};
use super::warning::{CoercionReason, Warning, Warnings};
use crate::core::config::{ChargePolicy, ValidationConfig};
use crate::core::expression::{Expression, ExpressionError, IntoExpression};
use crate::core::units::{Dimension, Quantity, QuantityInput, Tolerance, Unit};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Lennard-Jones 12-6 form used when no nonbonded function is given.
pub const DEFAULT_NB_FUNCTION: &str = "4*epsilon*((sigma/r)**12 - (sigma/r)**6)";

pub const ATOM_TYPE_SET: &str = "atom_type_set";

fn default_nb_parameters() -> Result<Parameters, PotentialError> {
    Ok(parameter_map([
        ("sigma", Quantity::parse(1.0, "nm")?),
        ("epsilon", Quantity::parse(100.0, "kJ/mol")?),
    ]))
}

/// Normalizes a charge to a charge-dimensioned quantity.
///
/// A bare number is taken to be in elementary charges. A quantity whose unit is
/// not a charge is handled by `policy`: under [`ChargePolicy::Coerce`] its
/// numeric value is kept and reinterpreted in elementary charges, under
/// [`ChargePolicy::Strict`] it is rejected. Both coercions report a warning.
pub fn validate_charge(
    value: impl Into<QuantityInput>,
    policy: ChargePolicy,
) -> Result<(Quantity, Option<Warning>), PotentialError> {
    match value.into() {
        QuantityInput::Bare(value) => Ok((
            Quantity::new(value, Unit::elementary_charge()),
            Some(Warning::DimensionalCoercion {
                value,
                reason: CoercionReason::MissingUnit,
            }),
        )),
        QuantityInput::Tagged(quantity) if quantity.dimension() == Dimension::CHARGE => {
            Ok((quantity, None))
        }
        QuantityInput::Tagged(quantity) => match policy {
            ChargePolicy::Strict => Err(PotentialError::IncompatibleCharge {
                unit: quantity.unit().to_string(),
                dimension: quantity.dimension(),
            }),
            ChargePolicy::Coerce => Ok((
                Quantity::new(quantity.value(), Unit::elementary_charge()),
                Some(Warning::DimensionalCoercion {
                    value: quantity.value(),
                    reason: CoercionReason::IncompatibleDimension {
                        unit: quantity.unit().to_string(),
                        dimension: quantity.dimension(),
                    },
                }),
            )),
        },
    }
}

/// A nonbonded particle type: a charge plus an optional nonbonded pair function.
///
/// While a nonbonded function is present its free symbols must be covered
/// exactly by the parameter names and the independent variables. Without one,
/// parameters are stored unchecked.
#[derive(Debug, Clone)]
pub struct AtomType {
    name: String,
    charge: Quantity,
    nb_function: Option<Expression>,
    parameters: Parameters,
    independent_variables: BTreeSet<String>,
    charge_policy: ChargePolicy,
    link: TopologyLink,
}

impl AtomType {
    pub fn builder() -> AtomTypeBuilder {
        AtomTypeBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Always dimensioned as a charge.
    pub fn charge(&self) -> &Quantity {
        &self.charge
    }

    pub fn nb_function(&self) -> Option<&Expression> {
        self.nb_function.as_ref()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Quantity> {
        self.parameters.get(name)
    }

    pub fn independent_variables(&self) -> &BTreeSet<String> {
        &self.independent_variables
    }

    pub fn charge_policy(&self) -> ChargePolicy {
        self.charge_policy
    }

    pub fn link(&self) -> &TopologyLink {
        &self.link
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_charge(&mut self, charge: impl Into<QuantityInput>) -> Result<Warnings, PotentialError> {
        let (charge, warning) = validate_charge(charge, self.charge_policy)?;
        let mut warnings = Warnings::new();
        if let Some(warning) = warning {
            warnings.push(warning);
        }
        self.charge = charge;
        Ok(warnings)
    }

    /// Partially updates the nonbonded definition in a single step.
    ///
    /// A `None` argument leaves that field as it is; given parameters are merged
    /// into the current ones. The consistency check runs whenever a nonbonded
    /// function is present after the update.
    pub fn set_nb_function(
        &mut self,
        nb_function: Option<Expression>,
        parameters: Option<Parameters>,
    ) -> Result<(), PotentialError> {
        let nb_function = nb_function.or_else(|| self.nb_function.clone());
        let mut merged = self.parameters.clone();
        if let Some(parameters) = parameters {
            merged.extend(parameters);
        }
        if let Some(expression) = &nb_function {
            check_consistency(expression, &merged, &self.independent_variables)?;
        }
        self.nb_function = nb_function;
        self.parameters = merged;
        Ok(())
    }

    /// Removes the nonbonded function; parameters are kept as they are.
    pub fn clear_nb_function(&mut self) {
        self.nb_function = None;
    }

    pub fn set_nb_expression(&mut self, expression: impl IntoExpression) -> Result<(), PotentialError> {
        let expression = expression.into_expression()?;
        self.set_nb_function(Some(expression), None)
    }

    /// Merges `parameters` into the current ones, overwriting existing names.
    pub fn update_parameters(&mut self, parameters: Parameters) -> Result<(), PotentialError> {
        self.set_nb_function(None, Some(parameters))
    }

    pub fn set_independent_variables<S, I>(&mut self, names: I) -> Result<(), PotentialError>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let independent_variables = variable_set(names);
        if let Some(expression) = &self.nb_function {
            check_consistency(expression, &self.parameters, &independent_variables)?;
        }
        self.independent_variables = independent_variables;
        Ok(())
    }

    pub fn charge_is_close(&self, other: &AtomType, tolerance: Tolerance) -> bool {
        self.charge.is_close(&other.charge, tolerance)
    }

    pub(crate) fn attach(&mut self, key: AtomTypeKey) {
        self.link.attach(ATOM_TYPE_SET, key.into());
    }

    pub(crate) fn detach(&mut self) {
        self.link.detach();
    }
}

impl PartialEq for AtomType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.charge_is_close(other, Tolerance::default())
            && self.parameters == other.parameters
            && self.nb_function == other.nb_function
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<AtomType {}>", self.name)
    }
}

#[derive(Debug, Clone)]
enum NbSource {
    Default,
    Absent,
    Given(Result<Expression, ExpressionError>),
}

/// Builds an [`AtomType`].
///
/// Without an explicit nonbonded function the Lennard-Jones form of
/// [`DEFAULT_NB_FUNCTION`] is used, with default `sigma` and `epsilon` unless
/// parameters are supplied.
#[derive(Debug, Clone)]
pub struct AtomTypeBuilder {
    name: Option<String>,
    charge: QuantityInput,
    nb_function: NbSource,
    parameters: Option<Parameters>,
    independent_variables: Option<BTreeSet<String>>,
    charge_policy: ChargePolicy,
    set_ref: Option<String>,
}

impl Default for AtomTypeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomTypeBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            charge: QuantityInput::Bare(0.0),
            nb_function: NbSource::Default,
            parameters: None,
            independent_variables: None,
            charge_policy: ChargePolicy::default(),
            set_ref: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn charge(mut self, charge: impl Into<QuantityInput>) -> Self {
        self.charge = charge.into();
        self
    }

    pub fn nb_function(mut self, expression: impl IntoExpression) -> Self {
        self.nb_function = NbSource::Given(expression.into_expression());
        self
    }

    pub fn without_nb_function(mut self) -> Self {
        self.nb_function = NbSource::Absent;
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

    pub fn charge_policy(mut self, policy: ChargePolicy) -> Self {
        self.charge_policy = policy;
        self
    }

    pub fn config(self, config: &ValidationConfig) -> Self {
        self.charge_policy(config.charge_policy)
    }

    pub fn set_ref(mut self, set_ref: impl Into<String>) -> Self {
        self.set_ref = Some(set_ref.into());
        self
    }

    pub fn build(self) -> Result<AtomType, PotentialError> {
        self.build_with_warnings().map(|(atom_type, _)| atom_type)
    }

    /// Like [`build`](Self::build), also returning the advisories raised while
    /// normalizing the charge.
    pub fn build_with_warnings(self) -> Result<(AtomType, Warnings), PotentialError> {
        let (nb_function, parameters) = match self.nb_function {
            NbSource::Default => (
                Some(Expression::parse(DEFAULT_NB_FUNCTION)?),
                match self.parameters {
                    Some(parameters) => parameters,
                    None => default_nb_parameters()?,
                },
            ),
            NbSource::Absent => (None, self.parameters.unwrap_or_default()),
            NbSource::Given(expression) => (Some(expression?), self.parameters.unwrap_or_default()),
        };
        let independent_variables = self
            .independent_variables
            .unwrap_or_else(|| variable_set(["r"]));

        if let Some(expression) = &nb_function {
            check_consistency(expression, &parameters, &independent_variables)?;
        }

        let (charge, warning) = validate_charge(self.charge, self.charge_policy)?;
        let mut warnings = Warnings::new();
        if let Some(warning) = warning {
            warnings.push(warning);
        }

        let name = self.name.unwrap_or_else(|| "AtomType".to_string());
        debug!("Built atom type '{}' with charge {}", name, charge);

        let atom_type = AtomType {
            name,
            charge,
            nb_function,
            parameters,
            independent_variables,
            charge_policy: self.charge_policy,
            link: TopologyLink::new(self.set_ref.unwrap_or_else(|| ATOM_TYPE_SET.to_string())),
        };
        Ok((atom_type, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn carbon() -> AtomType {
        AtomType::builder()
            .name("CT")
            .charge(Quantity::parse(-0.18, "e").unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn default_atom_type_uses_lennard_jones() {
        let (atom_type, warnings) = AtomType::builder().build_with_warnings().unwrap();
        assert_eq!(atom_type.name(), "AtomType");
        assert_eq!(
            atom_type.nb_function(),
            Some(&Expression::parse(DEFAULT_NB_FUNCTION).unwrap())
        );
        assert_eq!(
            atom_type.parameter("sigma"),
            Some(&Quantity::parse(1.0, "nm").unwrap())
        );
        assert_eq!(
            atom_type.parameter("epsilon"),
            Some(&Quantity::parse(100.0, "kJ/mol").unwrap())
        );
        assert_eq!(atom_type.charge().dimension(), Dimension::CHARGE);
        assert!(warnings.has_dimensional_coercion());
        assert_eq!(atom_type.link().set_ref(), ATOM_TYPE_SET);
    }

    #[test]
    fn bare_charge_is_coerced_to_elementary_charge() {
        let (charge, warning) = validate_charge(1.0, ChargePolicy::Coerce).unwrap();
        assert_eq!(charge.dimension(), Dimension::CHARGE);
        assert_eq!(charge.value(), 1.0);
        assert!(matches!(
            warning,
            Some(Warning::DimensionalCoercion {
                reason: CoercionReason::MissingUnit,
                ..
            })
        ));
    }

    #[test]
    fn bare_charge_is_coerced_even_under_strict_policy() {
        let (charge, warning) = validate_charge(-1.0, ChargePolicy::Strict).unwrap();
        assert_eq!(charge.dimension(), Dimension::CHARGE);
        assert!(warning.is_some());
    }

    #[test]
    fn wrong_dimension_charge_keeps_value_and_warns() {
        let wrong = Quantity::parse(1.0, "nm").unwrap();
        let (charge, warning) = validate_charge(wrong, ChargePolicy::Coerce).unwrap();
        assert_eq!(charge, Quantity::parse(1.0, "e").unwrap());
        assert!(matches!(
            warning,
            Some(Warning::DimensionalCoercion {
                reason: CoercionReason::IncompatibleDimension { .. },
                ..
            })
        ));
    }

    #[test]
    fn wrong_dimension_charge_fails_under_strict_policy() {
        let wrong = Quantity::parse(1.0, "nm").unwrap();
        let result = validate_charge(wrong, ChargePolicy::Strict);
        assert!(matches!(
            result,
            Err(PotentialError::IncompatibleCharge { .. })
        ));
    }

    #[test]
    fn charge_in_coulomb_passes_through_unchanged() {
        let coulomb = Quantity::parse(1.602176634e-19, "C").unwrap();
        let (charge, warning) = validate_charge(coulomb.clone(), ChargePolicy::Strict).unwrap();
        assert!(warning.is_none());
        assert_eq!(charge.unit(), coulomb.unit());
        assert_relative_eq!(
            charge.convert("e").unwrap().value(),
            1.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn set_charge_reports_coercion_as_warning() {
        let mut atom_type = carbon();
        let warnings = atom_type.set_charge(Quantity::parse(1.0, "nm").unwrap()).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(atom_type.charge(), &Quantity::parse(1.0, "e").unwrap());

        let warnings = atom_type.set_charge(Quantity::parse(0.5, "e").unwrap()).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn set_charge_under_strict_policy_leaves_charge_unchanged() {
        let mut atom_type = AtomType::builder()
            .charge(Quantity::parse(0.1, "e").unwrap())
            .charge_policy(ChargePolicy::Strict)
            .build()
            .unwrap();
        assert!(atom_type.set_charge(Quantity::parse(1.0, "kJ/mol").unwrap()).is_err());
        assert_eq!(atom_type.charge(), &Quantity::parse(0.1, "e").unwrap());
    }

    #[test]
    fn config_selects_charge_policy() {
        let config = ValidationConfig {
            charge_policy: ChargePolicy::Strict,
            strict_members: false,
        };
        let result = AtomType::builder()
            .charge(Quantity::parse(1.0, "nm").unwrap())
            .config(&config)
            .build();
        assert!(matches!(
            result,
            Err(PotentialError::IncompatibleCharge { .. })
        ));
    }

    #[test]
    fn partial_set_nb_function_merges_parameters_and_keeps_expression() {
        let mut atom_type = carbon();
        atom_type
            .set_nb_function(
                None,
                Some(parameter_map([("sigma", Quantity::parse(0.35, "nm").unwrap())])),
            )
            .unwrap();
        assert_eq!(
            atom_type.nb_function(),
            Some(&Expression::parse(DEFAULT_NB_FUNCTION).unwrap())
        );
        assert_eq!(
            atom_type.parameter("sigma"),
            Some(&Quantity::parse(0.35, "nm").unwrap())
        );
        assert_eq!(
            atom_type.parameter("epsilon"),
            Some(&Quantity::parse(100.0, "kJ/mol").unwrap())
        );
    }

    #[test]
    fn set_nb_function_rejects_extraneous_parameters_atomically() {
        let mut atom_type = carbon();
        let before = atom_type.clone();
        let result = atom_type.set_nb_function(
            None,
            Some(parameter_map([
                ("sigma", Quantity::parse(0.35, "nm").unwrap()),
                ("extra", Quantity::dimensionless(1.0)),
            ])),
        );
        assert!(matches!(
            result,
            Err(PotentialError::InconsistentExpression { ref extraneous, .. }) if extraneous == &vec!["extra".to_string()]
        ));
        assert_eq!(atom_type, before);
    }

    #[test]
    fn cleared_nb_function_skips_consistency_checks() {
        let mut atom_type = carbon();
        atom_type.clear_nb_function();
        assert!(atom_type.nb_function().is_none());
        atom_type
            .update_parameters(parameter_map([("lambda", Quantity::dimensionless(0.5))]))
            .unwrap();
        assert_eq!(atom_type.parameters().len(), 3);
        assert!(atom_type.set_nb_expression(DEFAULT_NB_FUNCTION).is_err());
    }

    #[test]
    fn update_parameters_revalidates_against_nb_function() {
        let mut atom_type = carbon();
        let before = atom_type.clone();
        let result =
            atom_type.update_parameters(parameter_map([("lambda", Quantity::dimensionless(0.5))]));
        assert!(matches!(
            result,
            Err(PotentialError::InconsistentExpression { .. })
        ));
        assert_eq!(atom_type, before);
    }

    #[test]
    fn set_nb_function_commits_expression_and_parameters_together() {
        let mut atom_type = carbon();
        atom_type
            .set_nb_function(
                Some(Expression::parse("4*epsilon*((sigma/r)**12 - (sigma/r)**6) + c").unwrap()),
                Some(parameter_map([("c", Quantity::parse(1.0, "kJ/mol").unwrap())])),
            )
            .unwrap();
        assert!(atom_type.nb_function().unwrap().has_symbol("c"));
        assert_eq!(atom_type.parameters().len(), 3);
    }

    #[test]
    fn set_nb_expression_rejects_unbound_symbols() {
        let mut atom_type = carbon();
        let result = atom_type.set_nb_expression("A/r**12 - B/r**6");
        assert!(matches!(
            result,
            Err(PotentialError::InconsistentExpression { .. })
        ));
        assert_eq!(
            atom_type.nb_function(),
            Some(&Expression::parse(DEFAULT_NB_FUNCTION).unwrap())
        );
    }

    #[test]
    fn without_nb_function_stores_parameters_unchecked() {
        let atom_type = AtomType::builder()
            .without_nb_function()
            .parameters(parameter_map([("anything", Quantity::dimensionless(1.0))]))
            .build()
            .unwrap();
        assert!(atom_type.nb_function().is_none());
        assert_eq!(atom_type.parameters().len(), 1);
    }

    #[test]
    fn custom_nb_function_requires_matching_parameters() {
        let result = AtomType::builder().nb_function("A/r**12 - B/r**6").build();
        assert!(result.is_err());

        let atom_type = AtomType::builder()
            .nb_function("A/r**12 - B/r**6")
            .parameters(parameter_map([
                ("A", Quantity::parse(1e-6, "kJ*nm**12/mol").unwrap()),
                ("B", Quantity::parse(1e-3, "kJ*nm**6/mol").unwrap()),
            ]))
            .build()
            .unwrap();
        assert_eq!(atom_type.parameters().len(), 2);
    }

    #[test]
    fn equality_uses_charge_closeness() {
        let a = carbon();
        let mut b = carbon();
        b.set_charge(Quantity::parse(-0.18 + 1e-10, "e").unwrap())
            .unwrap();
        assert_eq!(a, b);

        b.set_charge(Quantity::parse(-0.2, "e").unwrap()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn equality_includes_name_and_parameters() {
        let a = carbon();
        let mut b = carbon();
        b.set_name("CA");
        assert_ne!(a, b);

        let mut c = carbon();
        c.update_parameters(parameter_map([("sigma", Quantity::parse(0.2, "nm").unwrap())]))
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn equality_breaks_when_only_nb_function_changes() {
        let a = carbon();
        let mut b = carbon();
        b.set_nb_expression("4*epsilon*((sigma/r)**12 - 2*(sigma/r)**6)")
            .unwrap();
        assert_eq!(a.parameters(), b.parameters());
        assert_ne!(a, b);

        let mut c = carbon();
        c.clear_nb_function();
        assert_ne!(a, c);
    }

    #[test]
    fn equality_treats_regrouped_nb_function_as_same() {
        let a = carbon();
        let mut b = carbon();
        b.set_nb_expression("epsilon*4*(((sigma/r)^12) - (sigma/r)^6)")
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn display_names_the_type() {
        assert_eq!(carbon().to_string(), "<AtomType CT>");
    }
}
