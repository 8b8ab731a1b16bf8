//! File discovery and tabular readers shared by the ingestion stages.

mod cell;
pub mod columns;
mod delimited;
mod encoding;
mod sheet;

pub use cell::{Cell, parse_date, python_float};
pub use columns::Column;
pub use delimited::read_delimited;
pub use encoding::TextEncoding;
pub use sheet::read_workbook;

use crate::error::{PipelineError, Result, SourceError, Stage};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Spreadsheet extensions read through `calamine`.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

/// One file's worth of rows, cells still untyped.
#[derive(Debug, Clone)]
pub struct Table {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

static EMPTY: Cell = Cell::Empty;

/// Cell at `index`, or an empty cell past the end of the row.
pub fn cell_at(row: &[Cell], index: usize) -> &Cell {
    row.get(index).unwrap_or(&EMPTY)
}

impl Table {
    pub fn context(&self) -> String {
        self.path.display().to_string()
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Lists files in `dir` with one of `extensions`, sorted by name.
///
/// A directory that does not exist contributes no files.
pub fn list_files(stage: Stage, dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "Source directory absent");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::read(stage, dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::read(stage, dir, e))?.path();
        if !path.is_file() {
            continue;
        }
        if extension_of(&path).is_some_and(|ext| extensions.contains(&ext.as_str())) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads a spreadsheet or delimited export depending on its extension.
pub fn read_any(path: &Path, encoding: TextEncoding) -> std::result::Result<Table, SourceError> {
    match extension_of(path).as_deref() {
        Some("csv") => read_delimited(path, encoding),
        _ => read_workbook(path),
    }
}

/// Reads every file independently in parallel, keeping the input order.
///
/// The first unreadable file aborts the whole read.
pub fn read_tables<F>(stage: Stage, files: &[PathBuf], reader: F) -> Result<Vec<Table>>
where
    F: Fn(&Path) -> std::result::Result<Table, SourceError> + Sync,
{
    files
        .par_iter()
        .map(|path| {
            let table = reader(path.as_path()).map_err(|e| PipelineError::read(stage, path, e))?;
            debug!(path = %path.display(), rows = table.rows.len(), "Read source file");
            Ok(table)
        })
        .collect()
}
