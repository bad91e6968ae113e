use super::error::PotentialError;
use super::link::{PotentialKey, TopologyLink};
use crate::core::expression::{Expression, IntoExpression};
use crate::core::units::Quantity;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Named parameter values of a potential, keyed by the symbol they bind.
pub type Parameters = BTreeMap<String, Quantity>;

/// Collects `(name, quantity)` pairs into a [`Parameters`] map.
pub fn parameter_map<K, I>(entries: I) -> Parameters
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Quantity)>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

pub(crate) fn variable_set<S, I>(names: I) -> BTreeSet<String>
where
    S: Into<String>,
    I: IntoIterator<Item = S>,
{
    names.into_iter().map(Into::into).collect()
}

/// Checks that the parameter names together with the independent variables are
/// exactly the free symbols of `expression`.
pub fn check_consistency(
    expression: &Expression,
    parameters: &Parameters,
    independent_variables: &BTreeSet<String>,
) -> Result<(), PotentialError> {
    let free = expression.free_symbols();
    let declared: BTreeSet<String> = parameters
        .keys()
        .chain(independent_variables.iter())
        .cloned()
        .collect();

    if free == declared {
        return Ok(());
    }

    Err(PotentialError::InconsistentExpression {
        expression: expression.to_string(),
        missing: free.difference(&declared).cloned().collect(),
        extraneous: declared.difference(&free).cloned().collect(),
    })
}

/// A named, parameterized interaction energy: an expression, the parameter
/// values bound to some of its symbols, and the independent variables supplying
/// the rest.
///
/// Every mutator validates the complete candidate state before committing it, so
/// a failed call leaves the potential exactly as it was.
#[derive(Debug, Clone)]
pub struct Potential {
    name: String,
    expression: Expression,
    parameters: Parameters,
    independent_variables: BTreeSet<String>,
    link: TopologyLink,
}

impl Potential {
    pub fn new<E, S, I>(
        name: impl Into<String>,
        expression: E,
        parameters: Parameters,
        independent_variables: I,
    ) -> Result<Self, PotentialError>
    where
        E: IntoExpression,
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let expression = expression.into_expression()?;
        let independent_variables = variable_set(independent_variables);
        check_consistency(&expression, &parameters, &independent_variables)?;

        let name = name.into();
        debug!(
            "Validated potential '{}' with expression '{}'",
            name, expression
        );

        Ok(Self {
            name,
            expression,
            parameters,
            independent_variables,
            link: TopologyLink::new(String::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
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

    pub fn link(&self) -> &TopologyLink {
        &self.link
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_expression(&mut self, expression: impl IntoExpression) -> Result<(), PotentialError> {
        let expression = expression.into_expression()?;
        check_consistency(&expression, &self.parameters, &self.independent_variables)?;
        self.expression = expression;
        Ok(())
    }

    /// Replaces the whole parameter mapping.
    pub fn set_parameters(&mut self, parameters: Parameters) -> Result<(), PotentialError> {
        check_consistency(&self.expression, &parameters, &self.independent_variables)?;
        self.parameters = parameters;
        Ok(())
    }

    /// Merges `parameters` into the existing mapping, overwriting values of
    /// names already present.
    pub fn update_parameters(&mut self, parameters: Parameters) -> Result<(), PotentialError> {
        let mut merged = self.parameters.clone();
        merged.extend(parameters);
        self.set_parameters(merged)
    }

    pub fn set_independent_variables<S, I>(&mut self, names: I) -> Result<(), PotentialError>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let independent_variables = variable_set(names);
        check_consistency(&self.expression, &self.parameters, &independent_variables)?;
        self.independent_variables = independent_variables;
        Ok(())
    }

    /// Replaces expression, parameters, and independent variables together.
    ///
    /// Use this when the new expression introduces symbols that no single-field
    /// mutator could make consistent on its own.
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
        let expression = expression.into_expression()?;
        let independent_variables = variable_set(independent_variables);
        check_consistency(&expression, &parameters, &independent_variables)?;
        self.expression = expression;
        self.parameters = parameters;
        self.independent_variables = independent_variables;
        Ok(())
    }

    pub(crate) fn set_link(&mut self, link: TopologyLink) {
        self.link = link;
    }

    pub(crate) fn attach(&mut self, set_ref: &str, key: PotentialKey) {
        self.link.attach(set_ref, key);
    }

    pub(crate) fn detach(&mut self) {
        self.link.detach();
    }
}

impl PartialEq for Potential {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
            && self.parameters == other.parameters
            && self.independent_variables == other.independent_variables
    }
}

impl fmt::Display for Potential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Potential {}: {}>", self.name, self.expression)
    }
}
