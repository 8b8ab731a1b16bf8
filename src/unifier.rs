//! Unification of the two maintenance spreadsheet layouts into one
//! canonical record collection.
//!
//! The legacy layout ("all" exports) and the current layout (2021 onwards)
//! carry the same fields under different headers. Both are mapped onto
//! [`CanonicalItemRecord`] here so later stages never look up columns.

use crate::error::{PipelineError, Result, SourceError, Stage};
use crate::source::{self, Cell, Column, Table, TextEncoding, columns};
use crate::types::{CanonicalItemRecord, MaintenanceItemRecord};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Roles whose sign-offs are not maintenance labor.
pub const EXCLUDED_ROLES: &[&str] = &["PILOT", "CABIN"];

const SHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods", "csv"];

/// Header allow-list of one spreadsheet layout, in record field order.
pub struct Layout {
    pub name: &'static str,
    pub columns: [Column; 9],
    /// Labor hours may carry a decimal comma.
    pub comma_decimals: bool,
}

pub const LEGACY_LAYOUT: Layout = Layout {
    name: "legacy",
    columns: [
        Column::new("SIGN", &[]),
        Column::new("AC", &[]),
        Column::new("AC Type", &[]),
        Column::new("ISSUE STATION", &[]),
        Column::new("CLOSING DATE", &[]),
        Column::new("ATA", &[]),
        Column::new("ATA DESC", &[]),
        Column::new("HH Planejado WO", &[]),
        Column::new("HH Executado WO", &[]),
    ],
    comma_decimals: false,
};

pub const CURRENT_LAYOUT: Layout = Layout {
    name: "current",
    columns: [
        Column::new("SIGN", &[]),
        Column::new("AC", &[]),
        Column::new("AC_Type", &[]),
        Column::new("ISSUE_STATION", &[]),
        Column::new("CLOSING_DATE", &[]),
        Column::new("ATA", &[]),
        Column::new("DESCRIPTION", &[]),
        Column::new("hh_plan", &[]),
        Column::new("hh_exec", &[]),
    ],
    comma_decimals: true,
};

/// Canonical vocabulary, also accepting either raw spelling. Role is optional.
const CANONICAL_COLUMNS: [Column; 8] = [
    Column::new("AC", &[]),
    Column::new("AC_Type", &[]),
    Column::new("ISSUE_Station", &[]),
    Column::new("CLOSING_DATE", &[]),
    Column::new("ATA", &[]),
    Column::new("ATA_DESC", &["DESCRIPTION"]),
    Column::new("HH_Planejado_WO", &["hh_plan"]),
    Column::new("HH_Executado_WO", &["hh_exec"]),
];

const ROLE_COLUMN: Column = Column::new("SIGN", &[]);

/// Reads both spreadsheet directories and produces the canonical collection.
///
/// # Errors
///
/// `MissingSourceData` when neither directory holds a readable file,
/// `SourceRead` when a present file cannot be parsed, `Schema` when a file
/// lacks a column of its layout.
#[tracing::instrument(skip_all, fields(legacy = %legacy_dir.display(), current = %current_dir.display()))]
pub fn unify(
    legacy_dir: &Path,
    current_dir: &Path,
    encoding: TextEncoding,
) -> Result<Vec<CanonicalItemRecord>> {
    let mut raw = Vec::new();
    let mut files_read = 0usize;

    for (dir, layout) in [(legacy_dir, &LEGACY_LAYOUT), (current_dir, &CURRENT_LAYOUT)] {
        let files = source::list_files(Stage::Ingest, dir, SHEET_EXTENSIONS)?;
        let tables = source::read_tables(Stage::Ingest, &files, |p| source::read_any(p, encoding))?;
        files_read += tables.len();

        let before = raw.len();
        for table in &tables {
            raw.extend(records_from_table(table, layout)?);
        }
        info!(
            layout = layout.name,
            files = tables.len(),
            rows = raw.len() - before,
            "Read maintenance spreadsheets"
        );
    }

    if files_read == 0 {
        return Err(PipelineError::MissingSourceData {
            stage: Stage::Ingest,
            searched: vec![legacy_dir.to_path_buf(), current_dir.to_path_buf()],
        });
    }

    Ok(canonicalize(raw))
}

/// De-duplicates, drops non-maintenance roles and strips the role field.
pub fn canonicalize(raw: Vec<MaintenanceItemRecord>) -> Vec<CanonicalItemRecord> {
    let total = raw.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<MaintenanceItemRecord> =
        raw.into_iter().filter(|r| seen.insert(r.clone())).collect();
    let duplicates = total - unique.len();

    let records: Vec<CanonicalItemRecord> = unique
        .into_iter()
        .filter(|r| !EXCLUDED_ROLES.contains(&r.role.as_str()))
        .map(MaintenanceItemRecord::into_canonical)
        .collect();

    debug!(
        total,
        duplicates,
        kept = records.len(),
        "Canonicalized maintenance records"
    );
    records
}

/// Maps one table onto raw records using the layout's allow-list.
pub fn records_from_table(table: &Table, layout: &Layout) -> Result<Vec<MaintenanceItemRecord>> {
    let idx = columns::resolve(Stage::Ingest, &table.context(), &table.headers, &layout.columns)?;

    table
        .rows
        .iter()
        .map(|row| -> Result<MaintenanceItemRecord> {
            let cell = |i: usize| source::cell_at(row, idx[i]);
            let labor = |i: usize| {
                let text = cell(i).to_duration_text();
                if layout.comma_decimals {
                    text.replace(',', ".")
                } else {
                    text
                }
            };
            Ok(MaintenanceItemRecord {
                role: cell(0).to_text(),
                tail: cell(1).to_text(),
                ac_type: cell(2).to_text(),
                issue_station: cell(3).to_text(),
                closing_date: closing_date(table, cell(4))?,
                ata: cell(5).to_text(),
                ata_desc: cell(6).to_text(),
                hh_planned: labor(7),
                hh_executed: labor(8),
            })
        })
        .collect()
}

fn closing_date(table: &Table, cell: &Cell) -> Result<Option<chrono::NaiveDate>> {
    cell.to_date()
        .map_err(|e| PipelineError::read(Stage::Ingest, &table.path, SourceError::Value(e)))
}

/// Loads a pre-consolidated CSV, bypassing [`unify`].
///
/// Rows are taken as-is: no de-duplication and no role filtering.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_consolidated(path: &Path, encoding: TextEncoding) -> Result<Vec<CanonicalItemRecord>> {
    let table = source::read_delimited(path, encoding)
        .map_err(|e| PipelineError::read(Stage::Ingest, path, e))?;
    let idx = columns::resolve(
        Stage::Ingest,
        &table.context(),
        &table.headers,
        &CANONICAL_COLUMNS,
    )?;
    let role_idx = columns::find(&table.headers, &ROLE_COLUMN);

    let records = table
        .rows
        .iter()
        .map(|row| -> Result<CanonicalItemRecord> {
            let cell = |i: usize| source::cell_at(row, i);
            let record = MaintenanceItemRecord {
                role: role_idx.map(|i| cell(i).to_text()).unwrap_or_default(),
                tail: cell(idx[0]).to_text(),
                ac_type: cell(idx[1]).to_text(),
                issue_station: cell(idx[2]).to_text(),
                closing_date: closing_date(&table, cell(idx[3]))?,
                ata: cell(idx[4]).to_text(),
                ata_desc: cell(idx[5]).to_text(),
                hh_planned: cell(idx[6]).to_duration_text(),
                hh_executed: cell(idx[7]).to_duration_text(),
            };
            Ok(record.into_canonical())
        })
        .collect::<Result<Vec<_>>>()?;

    info!(records = records.len(), "Loaded consolidated maintenance records");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    const LEGACY_HEADER: &str = "SIGN,AC,AC Type,ISSUE STATION,CLOSING DATE,ATA,ATA DESC,HH Planejado WO,HH Executado WO";
    const CURRENT_HEADER: &str =
        "SIGN,AC,AC_Type,ISSUE_STATION,CLOSING_DATE,ATA,DESCRIPTION,hh_plan,hh_exec";

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn table(headers: &str, rows: &[&str]) -> Table {
        Table {
            path: PathBuf::from("memory.csv"),
            headers: headers.split(',').map(str::to_string).collect(),
            rows: rows
                .iter()
                .map(|r| r.split(',').map(Cell::from_field).collect())
                .collect(),
        }
    }

    #[test]
    fn test_current_layout_normalizes_decimal_comma() {
        let mut t = table(CURRENT_HEADER, &[]);
        t.rows = vec![vec![
            Cell::from_field("MECH"),
            Cell::from_field("PR-ABC"),
            Cell::from_field("B737NG"),
            Cell::from_field("GRU"),
            Cell::from_field("2022-01-03"),
            Cell::Float(21.0),
            Cell::from_field("AIR CONDITIONING"),
            Cell::from_field("1,5"),
            Cell::Float(2.25),
        ]];

        let records = records_from_table(&t, &CURRENT_LAYOUT).unwrap();
        assert_eq!(records[0].hh_planned, "1.5");
        assert_eq!(records[0].hh_executed, "2.25");
        assert_eq!(records[0].ata, "21");
        assert_eq!(records[0].closing_date, NaiveDate::from_ymd_opt(2022, 1, 3));
    }

    #[test]
    fn test_legacy_layout_missing_column_is_schema_error() {
        let t = table("SIGN,AC,AC Type", &[]);
        let err = records_from_table(&t, &LEGACY_LAYOUT).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref column, .. } if column == "ISSUE STATION"));
    }

    #[test]
    fn test_bad_closing_date_is_source_error() {
        let t = table(
            LEGACY_HEADER,
            &["MECH,PR-ABC,B737NG,GRU,someday,21,AIR,1:00,2:00"],
        );
        let err = records_from_table(&t, &LEGACY_LAYOUT).unwrap_err();
        assert!(matches!(err, PipelineError::SourceRead { .. }));
    }

    #[test]
    fn test_canonicalize_dedups_and_drops_crew_roles() {
        let t = table(
            LEGACY_HEADER,
            &[
                "MECH,PR-ABC,B737NG,GRU,2022-01-03,21,AIR,1:00,2:00",
                "MECH,PR-ABC,B737NG,GRU,2022-01-03,21,AIR,1:00,2:00",
                "PILOT,PR-ABC,B737NG,GRU,2022-01-03,21,AIR,1:00,2:00",
                "CABIN,PR-ABC,B737NG,GRU,2022-01-03,25,CABIN,0:30,0:30",
                "INSP,PR-XYZ,B737NG,GRU,,32,LANDING GEAR,,3:00",
            ],
        );
        let records = canonicalize(records_from_table(&t, &LEGACY_LAYOUT).unwrap());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tail, "PR-ABC");
        assert_eq!(records[1].closing_date, None);
        assert_eq!(records[1].hh_planned, "nan");
    }

    #[test]
    fn test_unify_reads_both_directories() {
        let root = scratch_dir("hh_dataset_test_unify");
        let legacy = root.join("all");
        let current = root.join("2021");
        fs::create_dir_all(&legacy).unwrap();
        fs::create_dir_all(&current).unwrap();
        fs::write(
            legacy.join("2019.csv"),
            format!("{LEGACY_HEADER}\nMECH,PR-ABC,B737NG,GRU,2019-05-01,21,AIR,1:00,2:00\n"),
        )
        .unwrap();
        fs::write(
            current.join("2021.csv"),
            format!("{CURRENT_HEADER}\nMECH,PR-XYZ,B737NG,CGH,2021-02-01,32,GEAR,0:30,1:30\n"),
        )
        .unwrap();

        let records = unify(&legacy, &current, TextEncoding::Utf8).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].issue_station, "GRU");
        assert_eq!(records[1].ata_desc, "GEAR");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_unify_without_files_is_missing_source() {
        let root = scratch_dir("hh_dataset_test_unify_empty");
        let err = unify(&root.join("all"), &root.join("2021"), TextEncoding::Utf8).unwrap_err();
        assert!(matches!(err, PipelineError::MissingSourceData { .. }));
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_unify_corrupt_workbook_is_fatal() {
        let root = scratch_dir("hh_dataset_test_unify_corrupt");
        fs::write(root.join("broken.xlsx"), b"not a workbook").unwrap();
        let err = unify(&root, &root.join("2021"), TextEncoding::Utf8).unwrap_err();
        assert!(matches!(err, PipelineError::SourceRead { .. }));
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_load_consolidated_accepts_canonical_headers() {
        let root = scratch_dir("hh_dataset_test_consolidated");
        let path = root.join("items.csv");
        fs::write(
            &path,
            "AC,AC_Type,ISSUE_Station,CLOSING_DATE,ATA,ATA_DESC,HH_Planejado_WO,HH_Executado_WO\n\
             PR-ABC,B737NG,GRU,2022-01-03,21,AIR,1:00,2:30\n",
        )
        .unwrap();

        let records = load_consolidated(&path, TextEncoding::Latin1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hh_executed, "2:30");

        fs::remove_dir_all(&root).unwrap();
    }
}
