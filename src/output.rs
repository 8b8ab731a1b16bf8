//! Persistence of stage checkpoints and the final dataset.
//!
//! Files are written to a sibling temp file and renamed into place, so a
//! failed run never leaves a partially-written CSV behind.

use crate::error::{PipelineError, Result, Stage};
use csv::WriterBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const UNIFIED_CHECKPOINT: &str = "bd_unscheduled_itens.csv";
pub const HH_CHECKPOINT: &str = "bd_hh_agrupado.csv";
pub const CYCLES_CHECKPOINT: &str = "bd_utilizacao_agrupado.csv";
pub const AGE_CHECKPOINT: &str = "bd_utl_tah.csv";

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> serde_json::Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes all records with a header row, replacing `path` atomically.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::write(path, e))?;
    }

    let tmp = temp_path(path);
    let written = write_to(&tmp, records).and_then(|_| {
        fs::rename(&tmp, path).map_err(|e| PipelineError::write(path, e))
    });
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written?;

    debug!(path = %path.display(), rows = records.len(), "Wrote CSV");
    Ok(())
}

fn write_to<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let file = File::create(path).map_err(|e| PipelineError::write(path, e))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| PipelineError::write(path, e))?;
    }
    writer.flush().map_err(|e| PipelineError::write(path, e))?;
    Ok(())
}

/// Reads a checkpoint written by [`write_records`].
pub fn read_records<T: DeserializeOwned>(stage: Stage, path: &Path) -> Result<Vec<T>> {
    if !path.is_file() {
        return Err(PipelineError::MissingSourceData {
            stage,
            searched: vec![path.to_path_buf()],
        });
    }
    let file = File::open(path).map_err(|e| PipelineError::read(stage, path, e))?;
    let mut rdr = csv::Reader::from_reader(file);
    rdr.deserialize::<T>()
        .map(|row| row.map_err(|e| PipelineError::read(stage, path, e)))
        .collect()
}
