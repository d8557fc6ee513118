mod case;
mod error;

use case::{Case, Summary, run_case, to_csv};
use clap::{Parser, Subcommand};
use error::CliResult;
use rayon::prelude::*;
use sf_stall::ModelRegistry;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(about = "StallFlow CLI - dynamic stall model harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered dynamic stall models
    Models,
    /// Load and validate a case file
    Validate {
        /// Path to the case YAML file
        case_path: PathBuf,
    },
    /// Run a case and write the coefficient history as CSV
    Run {
        /// Path to the case YAML file
        case_path: PathBuf,
        /// Model to run instead of the one named in the case
        #[arg(short, long)]
        model: Option<String>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a case with every registered model and print a JSON summary
    Compare {
        /// Path to the case YAML file
        case_path: PathBuf,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = ModelRegistry::with_defaults();

    match cli.command {
        Commands::Models => cmd_models(&registry),
        Commands::Validate { case_path } => cmd_validate(&case_path, &registry),
        Commands::Run {
            case_path,
            model,
            output,
        } => cmd_run(&case_path, model.as_deref(), output.as_deref(), &registry),
        Commands::Compare { case_path } => cmd_compare(&case_path, &registry),
    }
}

fn cmd_models(registry: &ModelRegistry) -> CliResult<()> {
    for name in registry.names() {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_validate(case_path: &Path, registry: &ModelRegistry) -> CliResult<()> {
    println!("Validating case: {}", case_path.display());
    let case = Case::load(case_path)?;
    case.validate(registry)?;
    println!("✓ Case is valid ({})", case.model);
    Ok(())
}

fn cmd_run(
    case_path: &Path,
    model: Option<&str>,
    output: Option<&Path>,
    registry: &ModelRegistry,
) -> CliResult<()> {
    let mut case = Case::load(case_path)?;
    if let Some(name) = model {
        case.model = name.to_string();
    }
    case.validate(registry)?;
    info!(model = %case.model, t_end = case.t_end, dt = case.dt, "Running case");

    let samples = run_case(&case, &case.model, registry)?;
    let csv = to_csv(&samples);

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!("✓ Wrote {} samples to {}", samples.len(), path.display());
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn cmd_compare(case_path: &Path, registry: &ModelRegistry) -> CliResult<()> {
    let case = Case::load(case_path)?;
    case.validate(registry)?;

    let names = registry.names();
    info!(models = names.len(), "Comparing models");
    let summaries = names
        .par_iter()
        .map(|name| run_case(&case, name, registry).map(|s| Summary::from_samples(name, &s)))
        .collect::<CliResult<Vec<_>>>()?;

    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}
