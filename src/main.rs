//! CLI entry point for the HH weekly dataset pipeline.
//!
//! `run` executes the whole pipeline from the configured sources; `validate`
//! checks an already persisted dataset against the column contract.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use hh_dataset::config::{CONFIG_ENV, DEFAULT_CONFIG_FILE, PipelineConfig};
use hh_dataset::output::print_json;
use hh_dataset::pipeline::{self, RunOptions};
use hh_dataset::validate::default_required_columns;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "hh_dataset")]
#[command(about = "Builds the weekly maintenance labor-hours dataset", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run ingestion, aggregation, join, validation and save the dataset
    Run {
        /// Path to the JSON config (defaults to $HH_DATASET_CONFIG or config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Reuse utilization checkpoints from the processed directory
        #[arg(long, default_value_t = false)]
        skip_utilization: bool,

        /// Override the aircraft type filter
        #[arg(long)]
        ac_type: Option<String>,

        /// Override the minimum output date (exclusive), YYYY-MM-DD
        #[arg(long)]
        min_date: Option<NaiveDate>,
    },
    /// Validate a persisted weekly dataset CSV
    Validate {
        /// Dataset CSV to check
        #[arg(value_name = "DATASET")]
        dataset: PathBuf,

        /// Config supplying a required-column override
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn config_path(arg: Option<PathBuf>) -> PathBuf {
    arg.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/hh_dataset.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("hh_dataset.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            skip_utilization,
            ac_type,
            min_date,
        } => {
            let path = config_path(config);
            let mut config = PipelineConfig::load(&path)?;
            if let Some(ac_type) = ac_type {
                config.pipeline.ac_type_filter = ac_type;
            }
            if let Some(min_date) = min_date {
                config.pipeline.min_date = min_date;
            }
            info!(config = %path.display(), "Configuration loaded");

            let summary = pipeline::run(&config, &RunOptions { skip_utilization })?;
            print_json(&summary)?;
        }
        Commands::Validate { dataset, config } => {
            let required = match config {
                Some(path) => PipelineConfig::load(&path)?.required_columns(),
                None => default_required_columns(),
            };
            let violations = pipeline::validate_file(&dataset, &required)?;
            if !violations.is_empty() {
                for violation in &violations {
                    error!(%violation, "Dataset validation failed");
                }
                bail!(
                    "{} failed validation with {} violation(s)",
                    dataset.display(),
                    violations.len()
                );
            }
            info!(path = %dataset.display(), "Dataset is valid");
        }
    }

    Ok(())
}
