//! Labor hours (HH) per aircraft and closing date.

use crate::aggregate::utility::mean;
use crate::error::{PipelineError, Result, Stage};
use crate::timecode::decode_column;
use crate::types::{CanonicalItemRecord, DayKey, HhAggregate};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Chapter description of administrative entries, which are not maintenance labor.
pub const ADMINISTRATIVE_CHAPTER: &str = "ADMINISTRATIVE - GENERAL";

/// Longer labor text is a timestamp that leaked in place of a duration.
const MAX_DURATION_TEXT: usize = 8;

/// Default aircraft type filter.
pub const DEFAULT_AC_TYPE: &str = "B737NG";

/// Cleans, imputes and aggregates maintenance items for one aircraft type.
///
/// Zero HH after the planned-hours fallback is read as "not recorded" and
/// replaced by the mean of the non-zero values. The mean is taken over every
/// aircraft type before the type filter applies.
///
/// # Errors
///
/// `ImputationUndefined` when there are zero HH values but no non-zero one
/// to average.
#[tracing::instrument(skip(records), fields(records = records.len()))]
pub fn aggregate_hh(records: &[CanonicalItemRecord], ac_type: &str) -> Result<Vec<HhAggregate>> {
    let kept: Vec<&CanonicalItemRecord> = records
        .iter()
        .filter(|r| {
            r.hh_planned.chars().count() <= MAX_DURATION_TEXT
                && r.hh_executed.chars().count() <= MAX_DURATION_TEXT
        })
        .collect();
    debug!(
        dropped = records.len() - kept.len(),
        "Dropped items with malformed labor text"
    );

    let planned: Vec<&str> = kept.iter().map(|r| r.hh_planned.as_str()).collect();
    let executed: Vec<&str> = kept.iter().map(|r| r.hh_executed.as_str()).collect();
    let planned = decode_column(&planned);
    let executed = decode_column(&executed);

    let mut hh: Vec<Option<f64>> = executed
        .iter()
        .zip(&planned)
        .map(|(exec, plan)| match exec {
            Some(v) if *v == 0.0 => *plan,
            other => *other,
        })
        .collect();

    impute_zeros(&mut hh)?;

    let mut grouped: BTreeMap<DayKey, f64> = BTreeMap::new();
    for (record, value) in kept.iter().zip(hh) {
        if record.ac_type != ac_type || record.ata_desc == ADMINISTRATIVE_CHAPTER {
            continue;
        }
        let Some(date) = record.closing_date else {
            continue;
        };
        *grouped.entry(DayKey::new(date, &record.tail)).or_default() += value.unwrap_or(0.0);
    }

    let rows: Vec<HhAggregate> = grouped
        .into_iter()
        .map(|(key, hh)| HhAggregate {
            closing_date: key.date,
            tail: key.tail,
            hh,
        })
        .collect();

    info!(ac_type, rows = rows.len(), "Aggregated labor hours");
    Ok(rows)
}

/// Replaces every zero with the mean of the non-zero, present values.
fn impute_zeros(values: &mut [Option<f64>]) -> Result<()> {
    let nonzero: Vec<f64> = values.iter().flatten().copied().filter(|v| *v != 0.0).collect();
    let has_zero = values.iter().any(|v| *v == Some(0.0));
    if !has_zero {
        return Ok(());
    }

    let fill = mean(&nonzero).ok_or(PipelineError::ImputationUndefined {
        stage: Stage::Hh,
        field: "HH",
    })?;
    debug!(fill, "Imputing zero labor hours");

    for value in values.iter_mut() {
        if *value == Some(0.0) {
            *value = Some(fill);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn item(tail: &str, day: u32, planned: &str, executed: &str) -> CanonicalItemRecord {
        CanonicalItemRecord {
            tail: tail.to_string(),
            ac_type: DEFAULT_AC_TYPE.to_string(),
            issue_station: "GRU".to_string(),
            closing_date: NaiveDate::from_ymd_opt(2022, 1, day),
            ata: "21".to_string(),
            ata_desc: "AIR CONDITIONING".to_string(),
            hh_planned: planned.to_string(),
            hh_executed: executed.to_string(),
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, day).unwrap()
    }

    #[test]
    fn test_planned_fallback_sums_per_day() {
        let records = vec![
            item("PR-ABC", 3, "1:00", "2:30"),
            item("PR-ABC", 3, "1:00", "0:00"),
        ];
        let rows = aggregate_hh(&records, DEFAULT_AC_TYPE).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].closing_date, date(3));
        assert_eq!(rows[0].tail, "PR-ABC");
        assert!((rows[0].hh - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_zeros_get_mean_of_nonzero() {
        let records = vec![
            item("PR-AAA", 3, "0:00", "1:00"),
            item("PR-BBB", 3, "0:00", "3:00"),
            item("PR-CCC", 4, "0:00", "0:00"),
        ];
        let rows = aggregate_hh(&records, DEFAULT_AC_TYPE).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.hh > 0.0));
        let ccc = rows.iter().find(|r| r.tail == "PR-CCC").unwrap();
        assert!((ccc.hh - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_zero_is_imputation_undefined() {
        let records = vec![
            item("PR-AAA", 3, "0:00", "0:00"),
            item("PR-BBB", 3, "nan", "0:00"),
        ];
        let err = aggregate_hh(&records, DEFAULT_AC_TYPE).unwrap_err();
        assert!(matches!(err, PipelineError::ImputationUndefined { .. }));
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        assert!(aggregate_hh(&[], DEFAULT_AC_TYPE).unwrap().is_empty());
    }

    #[test]
    fn test_long_labor_text_is_dropped() {
        let records = vec![
            item("PR-ABC", 3, "1:00", "1900-01-01 02:30:00"),
            item("PR-ABC", 3, "1:00", "2:00"),
        ];
        let rows = aggregate_hh(&records, DEFAULT_AC_TYPE).unwrap();
        assert!((rows[0].hh - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_includes_other_types_before_filter() {
        let mut other = item("PR-ZZZ", 3, "0:00", "5:00");
        other.ac_type = "E195".to_string();
        let records = vec![
            other,
            item("PR-AAA", 3, "0:00", "1:00"),
            item("PR-BBB", 4, "0:00", "0:00"),
        ];
        let rows = aggregate_hh(&records, DEFAULT_AC_TYPE).unwrap();
        assert_eq!(rows.len(), 2);
        let bbb = rows.iter().find(|r| r.tail == "PR-BBB").unwrap();
        assert!((bbb.hh - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_administrative_chapter_and_undated_items_excluded() {
        let mut admin = item("PR-ABC", 3, "0:00", "4:00");
        admin.ata_desc = ADMINISTRATIVE_CHAPTER.to_string();
        let mut undated = item("PR-ABC", 3, "0:00", "4:00");
        undated.closing_date = None;
        let mut engine = item("PR-ABC", 3, "0:00", "6:00");
        engine.ata_desc = "ENGINE".to_string();

        let rows = aggregate_hh(&[admin, undated, engine], DEFAULT_AC_TYPE).unwrap();
        assert_eq!(rows.len(), 1);
        assert!((rows[0].hh - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_mostly_blank_executed_falls_back_to_planned() {
        let records = vec![
            item("PR-AAA", 3, "1:00", "nan"),
            item("PR-BBB", 3, "1:00", "nan"),
            item("PR-CCC", 3, "1:00", "2:30"),
        ];
        let rows = aggregate_hh(&records, DEFAULT_AC_TYPE).unwrap();
        let hh: Vec<f64> = rows.iter().map(|r| r.hh).collect();
        assert_eq!(hh, vec![1.0, 1.0, 2.5]);
    }

    #[test]
    fn test_mostly_blank_columns_still_impute() {
        let records = vec![
            item("PR-AAA", 3, "nan", "nan"),
            item("PR-BBB", 3, "nan", "nan"),
            item("PR-CCC", 3, "nan", "4:00"),
        ];
        let rows = aggregate_hh(&records, DEFAULT_AC_TYPE).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| (r.hh - 4.0).abs() < 1e-9));
    }

    #[test]
    fn test_numeric_labor_columns() {
        let records = vec![
            item("PR-ABC", 3, "1.5", "0"),
            item("PR-ABC", 4, "2", "2.5"),
        ];
        let rows = aggregate_hh(&records, DEFAULT_AC_TYPE).unwrap();
        assert!((rows[0].hh - 1.5).abs() < 1e-9);
        assert!((rows[1].hh - 2.5).abs() < 1e-9);
    }
}
