//! Ecomload CLI - clean, transform and load e-commerce order exports
//!
//! # Commands
//!
//! ```bash
//! ecomload run                          # All three stages, in order
//! ecomload clean                        # data/kz.csv -> data/cleaned_kz.csv
//! ecomload transform                    # -> data/transformed_kz.csv
//! ecomload load                         # -> products, categories, orders
//! ecomload rules                        # Show the cleaning rule sets
//! ```
//!
//! Global flags override `ECOMLOAD_*` environment variables. Any stage
//! failure exits with status 1.

use clap::{Parser, Subcommand};
use ecomload::config::ENV_DATA_DIR;
use ecomload::logs::{log_error, log_success};
use ecomload::rules::{cleaner_fill_rules, transformer_category_ops};
use ecomload::{operations_description, Pipeline, PipelineConfig, PipelineError, RunReport, StageName};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "ecomload")]
#[command(about = "Clean, transform and load e-commerce order exports", long_about = None)]
struct Cli {
    /// Directory holding the default input and output files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Raw export read by the clean stage
    #[arg(long, global = true)]
    raw: Option<PathBuf>,

    /// Output of the clean stage
    #[arg(long, global = true)]
    cleaned: Option<PathBuf>,

    /// Output of the transform stage
    #[arg(long, global = true)]
    transformed: Option<PathBuf>,

    /// Database URL (sqlite://<path>, sqlite::memory: or a file path)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Rows per INSERT statement
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Write a JSON run report to this file
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deduplicate and repair the raw export
    Clean,

    /// Normalize the cleaned data for loading
    Transform {
        /// Read this file instead of the cleaned output
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Replace the database tables with the transformed data
    Load,

    /// Run clean, transform and load
    Run {
        /// Only run these stages
        #[arg(short, long, value_enum, value_delimiter = ',')]
        stages: Vec<StageName>,
    },

    /// Show available operations and the rule sets in use
    Rules,
}

fn main() {
    fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = build_config(&cli)?;

    let stages = match cli.command {
        Commands::Clean => vec![StageName::Clean],
        Commands::Transform { input } => {
            if let Some(input) = input {
                config = config.with_transform_input(input);
            }
            vec![StageName::Transform]
        }
        Commands::Load => vec![StageName::Load],
        Commands::Run { stages } if stages.is_empty() => StageName::ALL.to_vec(),
        Commands::Run { stages } => stages,
        Commands::Rules => return cmd_rules(),
    };

    let run = Pipeline::new(config).run(&stages);
    if let Some(path) = &cli.report {
        run.write_json(path)?;
    }
    finish(&run)
}

fn build_config(cli: &Cli) -> Result<PipelineConfig, PipelineError> {
    let data_dir = cli.data_dir.as_ref().map(|dir| dir.display().to_string());
    let mut config = PipelineConfig::from_env_with(|key| match (key, &data_dir) {
        (ENV_DATA_DIR, Some(dir)) => Some(dir.clone()),
        _ => None,
    })?;

    if let Some(raw) = &cli.raw {
        config.raw_path = raw.clone();
    }
    if let Some(cleaned) = &cli.cleaned {
        config.cleaned_path = cleaned.clone();
    }
    if let Some(transformed) = &cli.transformed {
        config.transformed_path = transformed.clone();
    }
    if let Some(url) = &cli.database_url {
        config = config.with_database_url(url.clone());
    }
    if let Some(chunk_size) = cli.chunk_size {
        config = config.with_chunk_size(chunk_size)?;
    }

    Ok(config)
}

fn finish(run: &RunReport) -> Result<(), Box<dyn std::error::Error>> {
    match &run.failure {
        Some(failure) => Err(format!("stage '{}' failed", failure.stage).into()),
        None => {
            log_success(format!("Completed {} stage(s)", run.stages.len()));
            Ok(())
        }
    }
}

fn cmd_rules() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", operations_description());

    println!("\nClean stage:");
    for rule in cleaner_fill_rules() {
        println!("  {}: {}", rule.column, serde_json::to_string(&rule.operations)?);
    }

    println!("\nTransform stage:");
    println!("  category_code -> category: {}", serde_json::to_string(&transformer_category_ops())?);
    Ok(())
}
