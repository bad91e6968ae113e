use crate::error::{CliError, Result};
use potkit::core::config::ValidationConfig;
use potkit::core::potentials::{
    AtomType, BondedKind, BondedType, Parameters, PotentialError, Warnings,
};
use potkit::core::units::{Quantity, QuantityInput};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// A quantity as written in a definitions file: a bare number or a
/// `{ value = ..., unit = "..." }` table.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FileQuantity {
    Bare(f64),
    Tagged { value: f64, unit: String },
}

impl FileQuantity {
    /// Bare numbers become dimensionless quantities.
    pub fn to_quantity(&self) -> std::result::Result<Quantity, PotentialError> {
        match self {
            FileQuantity::Bare(value) => Ok(Quantity::dimensionless(*value)),
            FileQuantity::Tagged { value, unit } => Ok(Quantity::parse(*value, unit)?),
        }
    }

    /// Bare numbers stay bare, so the receiving field decides their unit.
    pub fn to_input(&self) -> std::result::Result<QuantityInput, PotentialError> {
        match self {
            FileQuantity::Bare(value) => Ok(QuantityInput::Bare(*value)),
            FileQuantity::Tagged { .. } => self.to_quantity().map(QuantityInput::Tagged),
        }
    }
}

fn to_parameters(
    entries: &BTreeMap<String, FileQuantity>,
) -> std::result::Result<Parameters, PotentialError> {
    entries
        .iter()
        .map(|(name, quantity)| quantity.to_quantity().map(|q| (name.clone(), q)))
        .collect()
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AtomTypeRecord {
    pub name: String,
    pub charge: Option<FileQuantity>,
    pub nb_function: Option<String>,
    #[serde(default)]
    pub no_nb_function: bool,
    pub parameters: Option<BTreeMap<String, FileQuantity>>,
    pub independent_variables: Option<Vec<String>>,
}

impl AtomTypeRecord {
    pub fn build(
        &self,
        config: &ValidationConfig,
    ) -> std::result::Result<(AtomType, Warnings), PotentialError> {
        let mut builder = AtomType::builder().name(&self.name).config(config);
        if let Some(charge) = &self.charge {
            builder = builder.charge(charge.to_input()?);
        }
        if self.no_nb_function {
            builder = builder.without_nb_function();
        } else if let Some(expression) = &self.nb_function {
            builder = builder.nb_function(expression);
        }
        if let Some(parameters) = &self.parameters {
            builder = builder.parameters(to_parameters(parameters)?);
        }
        if let Some(variables) = &self.independent_variables {
            builder = builder.independent_variables(variables);
        }
        builder.build_with_warnings()
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BondedTypeRecord {
    pub name: Option<String>,
    pub expression: Option<String>,
    pub parameters: Option<BTreeMap<String, FileQuantity>>,
    pub independent_variables: Option<Vec<String>>,
    #[serde(default)]
    pub member_types: Vec<String>,
}

impl BondedTypeRecord {
    pub fn display_name(&self, kind: BondedKind) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None if self.member_types.is_empty() => kind.type_name().to_string(),
            None => self.member_types.join("~"),
        }
    }

    pub fn build(&self, kind: BondedKind) -> std::result::Result<BondedType, PotentialError> {
        let mut builder = BondedType::builder(kind)
            .name(self.display_name(kind))
            .member_types(&self.member_types);
        if let Some(expression) = &self.expression {
            builder = builder.expression(expression);
        }
        if let Some(parameters) = &self.parameters {
            builder = builder.parameters(to_parameters(parameters)?);
        }
        if let Some(variables) = &self.independent_variables {
            builder = builder.independent_variables(variables);
        }
        builder.build()
    }
}

/// A potential definitions document.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DefinitionsFile {
    #[serde(default)]
    pub atom_types: Vec<AtomTypeRecord>,
    #[serde(default)]
    pub bond_types: Vec<BondedTypeRecord>,
    #[serde(default)]
    pub angle_types: Vec<BondedTypeRecord>,
    #[serde(default)]
    pub dihedral_types: Vec<BondedTypeRecord>,
}

impl DefinitionsFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let definitions = Self::from_toml_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        debug!(
            "Loaded {} atom type and {} bonded type record(s) from {:?}",
            definitions.atom_types.len(),
            definitions.bonded_records().count(),
            path
        );
        Ok(definitions)
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Every bonded record tagged with its kind, bonds first.
    pub fn bonded_records(&self) -> impl Iterator<Item = (BondedKind, &BondedTypeRecord)> {
        BondedKind::ALL.into_iter().flat_map(move |kind| {
            self.records_of(kind).iter().map(move |record| (kind, record))
        })
    }

    fn records_of(&self, kind: BondedKind) -> &[BondedTypeRecord] {
        match kind {
            BondedKind::Bond => &self.bond_types,
            BondedKind::Angle => &self.angle_types,
            BondedKind::Dihedral => &self.dihedral_types,
        }
    }
}
