//! Command-line interface for fpml-rules

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::sync::Arc;

#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use fpml_rules::{standard, Document, ReleaseRegistry, ValidationError, Validator};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "fpml-rules")]
#[command(author, version, about = "Semantic rule checks for FpML documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate one or more documents against the standard rule set
    Validate {
        /// Release registry configuration (JSON)
        #[arg(short, long, value_name = "RELEASES")]
        releases: PathBuf,

        /// Run rules in parallel
        #[arg(long)]
        parallel: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,

        /// Documents to validate
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// List the rules in the standard rule set
    Rules,
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            releases,
            parallel,
            json,
            files,
        } => cmd_validate(releases, parallel, json, files),
        Commands::Rules => cmd_rules(),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "cli")]
fn cmd_validate(
    releases: PathBuf,
    parallel: bool,
    json: bool,
    files: Vec<PathBuf>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let registry = Arc::new(ReleaseRegistry::from_file(&releases)?);
    let rules = standard::rule_set(&registry)?;
    let validator = Validator::new(Arc::clone(&registry), rules).with_parallel(parallel);

    let mut all_valid = true;
    let mut reports = Vec::new();

    for file in &files {
        let content = fs::read_to_string(file)?;
        let document = Document::from_string(&content)?;
        let errors = validator.check(&document);
        all_valid &= errors.is_empty();

        if json {
            reports.push(serde_json::json!({
                "file": file.display().to_string(),
                "valid": errors.is_empty(),
                "errors": errors.iter().map(error_to_json).collect::<Vec<_>>(),
            }));
        } else if errors.is_empty() {
            println!("✓ {} is valid", file.display());
        } else {
            println!("✗ {} has {} error(s)", file.display(), errors.len());
            for error in &errors {
                println!();
                println!("{}", error);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    Ok(all_valid)
}

#[cfg(feature = "cli")]
fn error_to_json(error: &ValidationError) -> serde_json::Value {
    serde_json::json!({
        "code": error.code,
        "rule": error.rule_name,
        "description": error.description,
        "path": error.path,
        "data": error.additional_data,
    })
}

#[cfg(feature = "cli")]
fn cmd_rules() -> Result<bool, Box<dyn std::error::Error>> {
    let registry = Arc::new(ReleaseRegistry::new());
    let rules = standard::rule_set(&registry)?;
    for name in rules.names() {
        println!("{}", name);
    }
    Ok(true)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
