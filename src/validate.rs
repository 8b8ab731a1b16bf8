//! Contract checks on the weekly dataset.
//!
//! Checks never short-circuit: every violation is collected so the driver
//! can log all of them before deciding to abort.

use crate::error::{PipelineError, Result, Stage};
use crate::source::{self, TextEncoding, parse_date};
use crate::timecode::parse_number;
use crate::types::{DATASET_COLUMNS, WeeklyDatasetRow};
use chrono::NaiveDate;
use std::path::Path;

pub const EMPTY_DATASET: &str = "dataset is empty";

/// The parts of a row the checks look at; `None` marks a null cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRow {
    pub date: Option<NaiveDate>,
    pub acft: Option<f64>,
    pub hh: Option<f64>,
}

/// Column names plus the checked projections of each row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetFrame {
    pub columns: Vec<String>,
    pub rows: Vec<FrameRow>,
}

impl DatasetFrame {
    pub fn from_rows(rows: &[WeeklyDatasetRow]) -> Self {
        DatasetFrame {
            columns: DATASET_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| FrameRow {
                    date: Some(r.date),
                    acft: Some(r.acft as f64),
                    hh: Some(r.hh),
                })
                .collect(),
        }
    }

    /// Loads a persisted dataset. Unparsable cells are treated as null.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let table = source::read_delimited(path, TextEncoding::Utf8)
            .map_err(|e| PipelineError::read(Stage::Validate, path, e))?;
        let position = |name: &str| table.headers.iter().position(|h| h == name);
        let (date_idx, acft_idx, hh_idx) = (position("date"), position("acft"), position("HH"));

        let rows = table
            .rows
            .iter()
            .map(|row| {
                let text = |idx: Option<usize>| idx.map(|i| source::cell_at(row, i).to_text());
                FrameRow {
                    date: text(date_idx).and_then(|t| parse_date(&t)),
                    acft: text(acft_idx).and_then(|t| parse_number(&t)),
                    hh: text(hh_idx).and_then(|t| parse_number(&t)),
                }
            })
            .collect();

        Ok(DatasetFrame {
            columns: table.headers,
            rows,
        })
    }

    fn has(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

pub fn default_required_columns() -> Vec<String> {
    DATASET_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Returns every violation found; an empty list means the dataset is valid.
pub fn validate(frame: &DatasetFrame, required: &[String]) -> Vec<String> {
    let mut violations: Vec<String> = required
        .iter()
        .filter(|c| !frame.has(c))
        .map(|c| format!("missing required column: {}", c))
        .collect();

    if frame.has("date") && frame.rows.iter().any(|r| r.date.is_none()) {
        violations.push("column 'date' contains nulls".to_string());
    }
    if frame.has("HH") {
        if frame.rows.iter().any(|r| r.hh.is_none()) {
            violations.push("column 'HH' contains nulls".to_string());
        }
        if frame.rows.iter().any(|r| r.hh.is_some_and(|v| v < 0.0)) {
            violations.push("column 'HH' contains negative values".to_string());
        }
    }
    if frame.has("acft") && frame.rows.iter().any(|r| r.acft.is_some_and(|v| v < 0.0)) {
        violations.push("column 'acft' contains negative values".to_string());
    }
    if frame.rows.is_empty() {
        violations.push(EMPTY_DATASET.to_string());
    }

    violations
}
