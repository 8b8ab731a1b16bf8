//! End-to-end driver: ingest, aggregate, build, validate, persist.
//!
//! Each stage fully materializes its output and writes a checkpoint before
//! the next one starts. The final dataset is only written once validation
//! passes.

use crate::aggregate::hh::aggregate_hh;
use crate::aggregate::utilization::aggregate_utilization;
use crate::config::PipelineConfig;
use crate::dataset;
use crate::error::{PipelineError, Result, Stage};
use crate::output::{
    self, AGE_CHECKPOINT, CYCLES_CHECKPOINT, HH_CHECKPOINT, UNIFIED_CHECKPOINT,
};
use crate::types::{CanonicalItemRecord, UtilizationViews};
use crate::unifier;
use crate::validate::{DatasetFrame, validate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Reload the utilization checkpoints instead of reading the raw feed.
    pub skip_utilization: bool,
}

/// Row counts of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub maintenance_records: usize,
    pub hh_rows: usize,
    pub utilization_days: usize,
    pub weeks: usize,
    pub output: PathBuf,
}

fn load_maintenance(config: &PipelineConfig) -> Result<Vec<CanonicalItemRecord>> {
    match config.consolidated_csv() {
        Some(path) if path.is_file() => {
            info!(path = %path.display(), "Stage 1: loading consolidated maintenance CSV");
            unifier::load_consolidated(&path, config.pipeline.encoding)
        }
        _ => {
            info!("Stage 1: unifying maintenance spreadsheets");
            unifier::unify(
                &config.legacy_dir(),
                &config.current_dir(),
                config.pipeline.encoding,
            )
        }
    }
}

fn load_utilization(
    config: &PipelineConfig,
    processed: &Path,
    options: &RunOptions,
) -> Result<UtilizationViews> {
    let cycles_path = processed.join(CYCLES_CHECKPOINT);
    let age_path = processed.join(AGE_CHECKPOINT);

    if options.skip_utilization {
        info!("Stage 3: reloading utilization checkpoints");
        return Ok(UtilizationViews {
            cycles: output::read_records(Stage::Utilization, &cycles_path)?,
            age: output::read_records(Stage::Utilization, &age_path)?,
        });
    }

    info!("Stage 3: processing utilization feed");
    let views = aggregate_utilization(&config.utilization_dir())?;
    output::write_records(&cycles_path, &views.cycles)?;
    output::write_records(&age_path, &views.age)?;
    Ok(views)
}

/// Runs every stage and writes the weekly dataset.
///
/// # Errors
///
/// Any stage error aborts the run. `ValidationFailure` is returned after
/// every violation has been logged; the dataset file is left untouched.
#[tracing::instrument(skip_all, fields(ac_type = %config.pipeline.ac_type_filter))]
pub fn run(config: &PipelineConfig, options: &RunOptions) -> Result<RunSummary> {
    let processed = config.processed_dir();

    let items = load_maintenance(config)?;
    output::write_records(&processed.join(UNIFIED_CHECKPOINT), &items)?;
    info!(records = items.len(), "Stage 1 complete");

    info!("Stage 2: cleaning and aggregating labor hours");
    let hh = aggregate_hh(&items, &config.pipeline.ac_type_filter)?;
    output::write_records(&processed.join(HH_CHECKPOINT), &hh)?;
    info!(rows = hh.len(), "Stage 2 complete");

    let views = load_utilization(config, &processed, options)?;
    info!(days = views.cycles.len(), "Stage 3 complete");

    info!("Stage 4: building weekly dataset");
    let weekly = dataset::build(&hh, &views.cycles, &views.age, config.pipeline.min_date);
    info!(weeks = weekly.len(), "Stage 4 complete");

    info!("Stage 5: validating");
    let violations = validate(&DatasetFrame::from_rows(&weekly), &config.required_columns());
    if !violations.is_empty() {
        for violation in &violations {
            error!(%violation, "Dataset validation failed");
        }
        return Err(PipelineError::ValidationFailure { violations });
    }

    let output_path = config.dataset_path();
    output::write_records(&output_path, &weekly)?;
    info!(path = %output_path.display(), "Dataset saved");

    Ok(RunSummary {
        maintenance_records: items.len(),
        hh_rows: hh.len(),
        utilization_days: views.cycles.len(),
        weeks: weekly.len(),
        output: output_path,
    })
}

/// Validates an already persisted dataset file.
pub fn validate_file(path: &Path, required: &[String]) -> Result<Vec<String>> {
    let frame = DatasetFrame::read_csv(path)?;
    Ok(validate(&frame, required))
}
