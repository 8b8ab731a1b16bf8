//! Error taxonomy for the dataset pipeline.
//!
//! Every fatal condition carries the stage it happened in and, where a file
//! is involved, the path, so a failed run can be diagnosed from the message.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Hh,
    Utilization,
    Dataset,
    Validate,
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingest => "ingest",
            Stage::Hh => "hh",
            Stage::Utilization => "utilization",
            Stage::Dataset => "dataset",
            Stage::Validate => "validate",
            Stage::Output => "output",
        };
        f.write_str(name)
    }
}

/// Low-level failure while reading or writing a single file.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Sheet(#[from] calamine::Error),

    #[error("{0}")]
    Value(String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{stage}: no readable source files found in {}", display_paths(.searched))]
    MissingSourceData { stage: Stage, searched: Vec<PathBuf> },

    #[error("{stage}: failed to read {}: {source}", .path.display())]
    SourceRead {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: SourceError,
    },

    #[error("{stage}: column `{column}` not found in {context}")]
    Schema {
        stage: Stage,
        column: String,
        context: String,
    },

    #[error("{stage}: cannot impute zero {field} values, no non-zero value to average")]
    ImputationUndefined { stage: Stage, field: &'static str },

    #[error("dataset failed validation with {} violation(s): {}", .violations.len(), .violations.join("; "))]
    ValidationFailure { violations: Vec<String> },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{stage}: failed to write {}: {source}", .path.display())]
    Write {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: SourceError,
    },
}

impl PipelineError {
    pub fn read(stage: Stage, path: &Path, source: impl Into<SourceError>) -> Self {
        PipelineError::SourceRead {
            stage,
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub fn write(path: &Path, source: impl Into<SourceError>) -> Self {
        PipelineError::Write {
            stage: Stage::Output,
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, PipelineError>;
