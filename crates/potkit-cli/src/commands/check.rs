use crate::cli::CheckArgs;
use crate::definitions::DefinitionsFile;
use crate::error::{CliError, Result};
use potkit::core::config::{ChargePolicy, ValidationConfig, ValidationConfigBuilder};
use potkit::core::potentials::{BondedKind, Warnings};
use potkit::topology::{PotentialRegistry, UnresolvedMember};
use tracing::{debug, info};

/// Outcome of validating a definitions document.
#[derive(Debug)]
pub struct CheckReport {
    pub registry: PotentialRegistry,
    pub warnings: Warnings,
    pub unresolved: Vec<UnresolvedMember>,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    debug!("Effective validation settings: {:?}", config);

    let definitions = DefinitionsFile::load(&args.definitions)?;
    let report = check_definitions(&definitions, &config)?;

    print_summary(&report);
    Ok(())
}

fn resolve_config(args: &CheckArgs) -> Result<ValidationConfig> {
    let mut builder = match &args.config {
        Some(path) => {
            info!("Loading validation settings from {:?}", path);
            ValidationConfigBuilder::from_config(ValidationConfig::load(path)?)
        }
        None => ValidationConfigBuilder::new(),
    };
    if args.strict_charges {
        builder = builder.charge_policy(ChargePolicy::Strict);
    }
    if args.strict_members {
        builder = builder.strict_members(true);
    }
    Ok(builder.build())
}

/// Builds every record through the core types and registers it.
///
/// Stops at the first record that fails validation.
pub fn check_definitions(
    definitions: &DefinitionsFile,
    config: &ValidationConfig,
) -> Result<CheckReport> {
    let mut registry = PotentialRegistry::new();
    let mut warnings = Warnings::new();

    for record in &definitions.atom_types {
        let (atom_type, record_warnings) =
            record.build(config).map_err(|source| CliError::Definition {
                kind: "AtomType".to_string(),
                name: record.name.clone(),
                source,
            })?;
        warnings.append(record_warnings);
        registry.add_atom_type(atom_type)?;
    }

    for (kind, record) in definitions.bonded_records() {
        let bonded_type = record.build(kind).map_err(|source| CliError::Definition {
            kind: kind.type_name().to_string(),
            name: record.display_name(kind),
            source,
        })?;
        registry.add_bonded_type(bonded_type);
    }

    let unresolved = registry.check_members(config)?;
    info!(
        "Validated {} atom type(s) and {} bonded type(s)",
        registry.atom_type_count(),
        BondedKind::ALL
            .iter()
            .map(|&kind| registry.bonded_type_count(kind))
            .sum::<usize>()
    );

    Ok(CheckReport {
        registry,
        warnings,
        unresolved,
    })
}

fn print_summary(report: &CheckReport) {
    println!("Atom types:     {}", report.registry.atom_type_count());
    for kind in BondedKind::ALL {
        println!(
            "{:<15} {}",
            format!("{}s:", kind.type_name()),
            report.registry.bonded_type_count(kind)
        );
    }
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    for member in &report.unresolved {
        println!("unresolved: {}", member);
    }
    println!(
        "✅ Definitions are valid ({} warning(s), {} unresolved member type(s)).",
        report.warnings.len(),
        report.unresolved.len()
    );
}
