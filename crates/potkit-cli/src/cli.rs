use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "potkit CLI - Validate force-field potential definitions before they reach a simulation.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a TOML file of atom, bond, angle, and dihedral type definitions.
    Check(CheckArgs),
    /// Show the dimension and SI factor of a unit expression, optionally converting a value.
    Units(UnitsArgs),
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the potential definitions file in TOML format.
    #[arg(required = true, value_name = "PATH")]
    pub definitions: PathBuf,

    /// Path to a validation settings file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Reject atom-type charges whose unit is not a charge instead of coercing them.
    #[arg(long)]
    pub strict_charges: bool,

    /// Fail when a bonded member type names no defined atom type.
    #[arg(long)]
    pub strict_members: bool,
}

/// Arguments for the `units` subcommand.
#[derive(Args, Debug)]
pub struct UnitsArgs {
    /// Unit expression, e.g. "kJ/(mol*nm**2)".
    #[arg(required = true, value_name = "EXPR")]
    pub expression: String,

    /// Target unit to convert into.
    #[arg(long, value_name = "EXPR")]
    pub to: Option<String>,

    /// Value to convert, expressed in EXPR.
    #[arg(long, value_name = "FLOAT", default_value_t = 1.0, requires = "to")]
    pub value: f64,
}
