//! `cvrisk`: evaluate patient attribute sets and manage rule catalogs.

mod render;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use cvrisk_core::{AttributeSet, Catalog, CatalogError, CatalogSource};

use crate::render::{AssessmentReport, CatalogListing};

#[derive(Parser, Debug)]
#[command(
    name = "cvrisk",
    about = "Rule-based cardiovascular risk stratification",
    version
)]
struct Cli {
    /// Rule catalog (YAML or JSON); the built-in catalog is used otherwise
    #[arg(long, global = true, env = "CVRISK_CATALOG")]
    catalog: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a JSON attribute set
    Evaluate(EvaluateArgs),
    /// Inspect and validate rule catalogs
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Attribute set file, or `-` for stdin
    patient: String,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Validate a catalog file without installing it
    Check { file: PathBuf },
    /// List the active catalog's rules, risk factors and recommendations
    Show,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Text,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Evaluate(args) => {
            install_catalog(cli.catalog.as_deref())?;
            evaluate(&args)
        }
        Command::Catalog {
            command: CatalogCommand::Check { file },
        } => check_catalog(&file),
        Command::Catalog {
            command: CatalogCommand::Show,
        } => {
            install_catalog(cli.catalog.as_deref())?;
            print!("{}", CatalogListing(&cvrisk_core::active_catalog()));
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn install_catalog(path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        tracing::debug!(path = %path.display(), "Loading catalog");
        cvrisk_core::load_catalog(&CatalogSource::File(path.to_path_buf()))
            .with_context(|| format!("Failed to load catalog {}", path.display()))?;
    }
    Ok(())
}

fn evaluate(args: &EvaluateArgs) -> Result<()> {
    let input = read_patient(&args.patient)?;
    let attributes: AttributeSet = serde_json::from_str(&input)
        .with_context(|| format!("Invalid attribute set in {}", args.patient))?;

    let assessment = cvrisk_core::evaluate(&attributes);

    match args.format {
        Format::Json if args.pretty => println!("{}", serde_json::to_string_pretty(&assessment)?),
        Format::Json => println!("{}", serde_json::to_string(&assessment)?),
        Format::Text => print!("{}", AssessmentReport(&assessment)),
    }
    Ok(())
}

fn read_patient(patient: &str) -> Result<String> {
    if patient == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read attribute set from stdin")?;
        Ok(input)
    } else {
        fs::read_to_string(patient).with_context(|| format!("Failed to read {patient}"))
    }
}

fn check_catalog(file: &Path) -> Result<()> {
    match Catalog::from_file(file) {
        Ok(catalog) => {
            println!(
                "{}: ok ({} {}, {} rules, {} risk factors)",
                file.display(),
                catalog.name(),
                catalog.version(),
                catalog.rules().len(),
                catalog.risk_factors().len()
            );
            Ok(())
        }
        Err(CatalogError::SchemaError(violations)) => {
            eprintln!("{}: schema validation failed", file.display());
            for violation in &violations {
                eprintln!("  - {violation}");
            }
            bail!("{} violation(s) in {}", violations.len(), file.display())
        }
        Err(error) => Err(error).with_context(|| format!("Invalid catalog {}", file.display())),
    }
}
