//! Daily utilization feed: cleaning and the two (date, tail) views.

use crate::aggregate::utility::{max_present, sum_present};
use crate::error::{PipelineError, Result, SourceError, Stage};
use crate::source::{self, Column, Table, TextEncoding, columns, parse_date};
use crate::timecode::{decode_column, parse_number};
use crate::types::{DailyAge, DailyCycles, DayKey, UtilizationRecord, UtilizationViews};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// Date literal marking a known-bad feed line.
const BAD_DATE_SENTINEL: &str = "0 ";

/// Cycle count assumed when the feed leaves it blank.
const DEFAULT_CYCLES: f64 = 1.0;

const FEED_COLUMNS: [Column; 8] = [
    Column::new("Dep. Date", &[]),
    Column::new("A/C", &[]),
    Column::new("AC-Type", &[]),
    Column::new("# per Day", &[]),
    Column::new("Hours", &[]),
    Column::new("Cycles", &[]),
    Column::new("TAH", &[]),
    Column::new("TAC", &[]),
];

/// Reads every CSV in `dir` and builds both daily views.
///
/// # Errors
///
/// `MissingSourceData` when the directory holds no CSV, `SourceRead` for an
/// unreadable file or an unparsable departure date, `Schema` for a file
/// lacking a feed column.
#[tracing::instrument(fields(dir = %dir.display()))]
pub fn aggregate_utilization(dir: &Path) -> Result<UtilizationViews> {
    let files = source::list_files(Stage::Utilization, dir, &["csv"])?;
    let tables = source::read_tables(Stage::Utilization, &files, |p| {
        source::read_delimited(p, TextEncoding::Utf8)
    })?;
    if tables.is_empty() {
        return Err(PipelineError::MissingSourceData {
            stage: Stage::Utilization,
            searched: vec![dir.to_path_buf()],
        });
    }

    let mut records = Vec::new();
    for table in &tables {
        records.extend(records_from_table(table)?);
    }
    info!(files = tables.len(), rows = records.len(), "Read utilization feed");

    aggregate_records(dedup(records))
}

fn records_from_table(table: &Table) -> Result<Vec<UtilizationRecord>> {
    let idx = columns::resolve(
        Stage::Utilization,
        &table.context(),
        &table.headers,
        &FEED_COLUMNS,
    )?;

    Ok(table
        .rows
        .iter()
        .map(|row| {
            let text = |i: usize| source::cell_at(row, idx[i]).to_text();
            UtilizationRecord {
                dep_date: text(0),
                tail: text(1),
                ac_type: text(2),
                per_day: text(3),
                hours: text(4),
                cycles: text(5),
                tah: text(6),
                tac: text(7),
                origin: table.path.clone(),
            }
        })
        .collect())
}

/// Drops exact duplicate lines, keeping the first occurrence.
pub fn dedup(records: Vec<UtilizationRecord>) -> Vec<UtilizationRecord> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(records.len());
        records.iter().map(|r| seen.insert(r.fields())).collect()
    };
    records
        .into_iter()
        .zip(keep)
        .filter_map(|(r, k)| k.then_some(r))
        .collect()
}

/// A feed line that survived cleaning, before hour decoding.
struct FlightDay<'a> {
    date: NaiveDate,
    record: &'a UtilizationRecord,
}

fn clean_date(record: &UtilizationRecord) -> Result<Option<NaiveDate>> {
    let text = record.dep_date.replace('.', "-");
    if text == BAD_DATE_SENTINEL || text.trim().is_empty() {
        return Ok(None);
    }
    parse_date(&text).map(Some).ok_or_else(|| {
        PipelineError::read(
            Stage::Utilization,
            &record.origin,
            SourceError::Value(format!("unrecognized departure date `{}`", record.dep_date)),
        )
    })
}

/// Cycles may arrive as `1'234`; blanks and garbage count as one cycle.
fn clean_cycles(text: &str) -> f64 {
    parse_number(&text.replace('\'', "")).unwrap_or(DEFAULT_CYCLES)
}

/// Cleans de-duplicated feed lines and groups them by (date, tail).
pub fn aggregate_records(records: Vec<UtilizationRecord>) -> Result<UtilizationViews> {
    let mut days = Vec::with_capacity(records.len());
    for record in &records {
        let Some(date) = clean_date(record)? else {
            continue;
        };
        if record.hours.trim().is_empty() {
            continue;
        }
        days.push(FlightDay { date, record });
    }
    debug!(
        kept = days.len(),
        dropped = records.len() - days.len(),
        "Cleaned utilization lines"
    );

    let hours: Vec<&str> = days.iter().map(|d| d.record.hours.as_str()).collect();
    let tah: Vec<String> = days
        .iter()
        .map(|d| match d.record.tah.trim() {
            "" => "nan".to_string(),
            t => t.to_string(),
        })
        .collect();
    let hours = decode_column(&hours);
    let tah = decode_column(&tah);

    let mut cycles_acc: BTreeMap<DayKey, (f64, f64)> = BTreeMap::new();
    let mut age_acc: BTreeMap<DayKey, (f64, Option<f64>)> = BTreeMap::new();

    for ((day, hours), tah) in days.iter().zip(hours).zip(tah) {
        let key = DayKey::new(day.date, &day.record.tail);
        let hours = sum_present([hours]);
        let cycles = clean_cycles(&day.record.cycles);

        let entry = cycles_acc.entry(key.clone()).or_default();
        entry.0 += hours;
        entry.1 += cycles;

        let entry = age_acc.entry(key).or_default();
        entry.0 += hours;
        entry.1 = max_present(entry.1, tah);
    }

    let views = UtilizationViews {
        cycles: cycles_acc
            .into_iter()
            .map(|(key, (hours, cycles))| DailyCycles {
                date: key.date,
                tail: key.tail,
                hours,
                cycles,
            })
            .collect(),
        age: age_acc
            .into_iter()
            .map(|(key, (hours, tah))| DailyAge {
                date: key.date,
                tail: key.tail,
                hours,
                tah,
            })
            .collect(),
    };

    info!(
        days = views.cycles.len(),
        "Aggregated utilization by day and aircraft"
    );
    Ok(views)
}
