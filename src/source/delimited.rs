use super::{Cell, Table, TextEncoding};
use crate::error::SourceError;
use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

/// Reads a comma-delimited file into a [`Table`].
///
/// Rows with more fields than the header are skipped; short rows are padded
/// with empty cells.
pub fn read_delimited(path: &Path, encoding: TextEncoding) -> Result<Table, SourceError> {
    let bytes = std::fs::read(path)?;
    let text = encoding.decode(&bytes)?;

    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let width = headers.len();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result?;
        if record.len() > width {
            skipped += 1;
            continue;
        }
        let mut row: Vec<Cell> = record.iter().map(Cell::from_field).collect();
        row.resize(width, Cell::Empty);
        rows.push(row);
    }

    if skipped > 0 {
        debug!(path = %path.display(), skipped, "Skipped malformed lines");
    }

    Ok(Table {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_read_delimited_skips_long_rows_and_pads_short() {
        let path = env::temp_dir().join("hh_dataset_test_delimited.csv");
        fs::write(&path, "A,B,C\n1,2,3\n1,2,3,4\n5,6\n").unwrap();

        let table = read_delimited(&path, TextEncoding::Utf8).unwrap();
        assert_eq!(table.headers, vec!["A", "B", "C"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][2], Cell::Empty);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_delimited_missing_file_is_io_error() {
        let path = env::temp_dir().join("hh_dataset_test_does_not_exist.csv");
        let err = read_delimited(&path, TextEncoding::Utf8).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
