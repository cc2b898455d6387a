use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use rams_core::catalog::CATALOG;
use rams_core::{ClassifierConfig, HazardClassifier, ProcedureInput, CATALOG_VERSION};
use rams_runtime::{EngineConfig, ProviderRegistry, RiskEngine};

/// rams - hazard registers for maintenance procedures
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the risk assessment report for a procedure
    Assess {
        /// Procedure file (.yaml or .json)
        procedure: PathBuf,

        /// Engine configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip the LLM path
        #[arg(short, long)]
        deterministic: bool,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Run the deterministic classifier only
    Classify {
        /// Procedure file (.yaml or .json)
        procedure: PathBuf,

        /// Probability points removed by preventive measures
        #[arg(short, long)]
        reduction: Option<u8>,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List the hazard category vocabulary
    Categories {
        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries the JSON document only
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_procedure(path: &Path) -> Result<ProcedureInput> {
    let input = ProcedureInput::from_file(path)
        .with_context(|| format!("Failed to load procedure {}", path.display()))?;
    tracing::debug!(
        title = %input.procedure.title,
        steps = input.steps.len(),
        "Procedure loaded"
    );
    Ok(input)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

#[derive(Serialize)]
struct CategoryView {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    gravity: u8,
    probability: u8,
    preventive_measures: &'static [&'static str],
    required_ppe: &'static [&'static str],
    responsible_role: &'static str,
}

#[derive(Serialize)]
struct CatalogView {
    version: &'static str,
    categories: Vec<CategoryView>,
}

async fn assess(
    procedure: &Path,
    config: Option<&Path>,
    deterministic: bool,
    pretty: bool,
) -> Result<()> {
    let input = load_procedure(procedure)?;

    let config = match config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let engine = if deterministic {
        RiskEngine::deterministic(config.classifier.clone())
    } else {
        RiskEngine::from_config(&config, &ProviderRegistry::with_defaults())
            .context("Failed to configure LLM providers")?
    };
    if !engine.is_ai_enabled() {
        tracing::info!("No LLM provider configured, using deterministic classifier");
    }

    let report = engine
        .compute_risk_assessment(&input.procedure, &input.steps)
        .await;
    print_json(&report, pretty)
}

fn classify(procedure: &Path, reduction: Option<u8>, pretty: bool) -> Result<()> {
    let input = load_procedure(procedure)?;
    let mut config = ClassifierConfig::default();
    if let Some(reduction) = reduction {
        config.probability_reduction = reduction;
    }

    let assessment = HazardClassifier::new(config).classify(&input.procedure, &input.steps);
    print_json(&assessment, pretty)
}

fn categories(pretty: bool) -> Result<()> {
    let view = CatalogView {
        version: CATALOG_VERSION,
        categories: CATALOG
            .iter()
            .map(|c| CategoryView {
                key: c.key,
                name: c.name,
                description: c.description,
                gravity: c.gravity,
                probability: c.probability,
                preventive_measures: c.preventive_measures,
                required_ppe: c.required_ppe,
                responsible_role: c.responsible_role,
            })
            .collect(),
    };
    print_json(&view, pretty)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Assess {
            procedure,
            config,
            deterministic,
            pretty,
        } => assess(&procedure, config.as_deref(), deterministic, pretty).await,
        Commands::Classify {
            procedure,
            reduction,
            pretty,
        } => classify(&procedure, reduction, pretty),
        Commands::Categories { pretty } => categories(pretty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assess() {
        let cli = Cli::parse_from([
            "rams",
            "-v",
            "assess",
            "proc.yaml",
            "--config",
            "rams.yaml",
            "--pretty",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Assess {
                procedure,
                config,
                deterministic,
                pretty,
            } => {
                assert_eq!(procedure, PathBuf::from("proc.yaml"));
                assert_eq!(config, Some(PathBuf::from("rams.yaml")));
                assert!(!deterministic);
                assert!(pretty);
            }
            _ => panic!("Expected assess"),
        }
    }

    #[test]
    fn test_parse_classify_with_reduction() {
        let cli = Cli::parse_from(["rams", "classify", "proc.json", "--reduction", "1"]);
        match cli.command {
            Commands::Classify { reduction, .. } => assert_eq!(reduction, Some(1)),
            _ => panic!("Expected classify"),
        }
    }
}
