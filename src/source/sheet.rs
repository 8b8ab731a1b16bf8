use super::{Cell, Table};
use crate::error::SourceError;
use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;

/// Reads the first worksheet of a workbook. The first row is the header.
pub fn read_workbook(path: &Path) -> Result<Table, SourceError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| SourceError::Value("workbook has no worksheets".to_string()))?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(|d| to_cell(d).to_text()).collect())
        .unwrap_or_default();

    let rows = rows
        .map(|r| r.iter().map(to_cell).collect::<Vec<_>>())
        .filter(|r| !r.iter().all(Cell::is_empty))
        .collect();

    Ok(Table {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Text(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_cell_maps_variants() {
        assert_eq!(to_cell(&Data::Empty), Cell::Empty);
        assert_eq!(to_cell(&Data::String(" ".into())), Cell::Empty);
        assert_eq!(to_cell(&Data::Int(3)), Cell::Int(3));
        assert_eq!(to_cell(&Data::Float(1.5)), Cell::Float(1.5));
        assert_eq!(to_cell(&Data::String("2:30".into())), Cell::Text("2:30".into()));
    }

    #[test]
    fn test_unreadable_workbook_is_error() {
        let path = std::env::temp_dir().join("hh_dataset_test_not_a_workbook.xlsx");
        std::fs::write(&path, b"plain text, not a zip archive").unwrap();
        assert!(read_workbook(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
