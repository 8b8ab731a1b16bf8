//! Joins labor hours with utilization and resamples into weekly rows.
//!
//! Buckets are 7 days wide and start at the first joined date, not on a
//! calendar week boundary. Historical datasets were cut this way and the
//! model was trained on them, so the origin must stay put.

use crate::types::{DailyAge, DailyCycles, DayKey, HhAggregate, WeeklyDatasetRow};
use chrono::{NaiveDate, TimeDelta};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

pub const BUCKET_DAYS: i64 = 7;

/// One (date, tail) after the joins.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedDay {
    pub date: NaiveDate,
    pub tail: String,
    pub hours: f64,
    /// Absent when the age view has no entry for the day.
    pub age: Option<f64>,
    pub cycles: f64,
    pub hh: f64,
}

/// Inner join of the cycles view with HH, then left join of the age view.
///
/// Output follows the cycles view's order. A maintenance day without a
/// matching flight day is dropped.
pub fn join_daily(hh: &[HhAggregate], cycles: &[DailyCycles], age: &[DailyAge]) -> Vec<JoinedDay> {
    let mut hh_by_key: HashMap<DayKey, Vec<f64>> = HashMap::new();
    for row in hh {
        hh_by_key
            .entry(DayKey::new(row.closing_date, &row.tail))
            .or_default()
            .push(row.hh);
    }
    let mut age_by_key: HashMap<DayKey, Vec<Option<f64>>> = HashMap::new();
    for row in age {
        age_by_key
            .entry(DayKey::new(row.date, &row.tail))
            .or_default()
            .push(row.tah);
    }

    let mut joined = Vec::new();
    for day in cycles {
        let key = DayKey::new(day.date, &day.tail);
        let Some(hh_values) = hh_by_key.get(&key) else {
            continue;
        };
        let ages = age_by_key.get(&key).map(Vec::as_slice).unwrap_or(&[None]);
        for &hh in hh_values {
            for &age in ages {
                joined.push(JoinedDay {
                    date: day.date,
                    tail: day.tail.clone(),
                    hours: day.hours,
                    age,
                    cycles: day.cycles,
                    hh: if hh.is_nan() { 0.0 } else { hh },
                });
            }
        }
    }
    joined
}

/// `YYYYMM` key of the calendar month containing `date`.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y%m").to_string()
}

/// Total flight hours per calendar month.
pub fn monthly_totals(days: &[JoinedDay]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for day in days {
        *totals.entry(month_key(day.date)).or_insert(0.0) += day.hours;
    }
    totals
}

/// Resamples joined days into contiguous 7-day buckets from the first date.
///
/// Every bucket between the first and last date is emitted, empty ones with
/// zero count and sums. `sum_uti_mensal` is the total of the month the
/// bucket starts in.
pub fn weekly_buckets(days: &[JoinedDay], monthly: &BTreeMap<String, f64>) -> Vec<WeeklyDatasetRow> {
    let (Some(first), Some(last)) = (
        days.iter().map(|d| d.date).min(),
        days.iter().map(|d| d.date).max(),
    ) else {
        return Vec::new();
    };

    let buckets = (last - first).num_days() / BUCKET_DAYS + 1;
    let mut rows: Vec<WeeklyDatasetRow> = (0..buckets)
        .map(|i| {
            let date = first + TimeDelta::days(i * BUCKET_DAYS);
            WeeklyDatasetRow {
                date,
                acft: 0,
                sum_daily_hours: 0.0,
                age_fleet: 0.0,
                cycles: 0.0,
                sum_uti_mensal: monthly.get(&month_key(date)).copied().unwrap_or(0.0),
                hh: 0.0,
            }
        })
        .collect();

    for day in days {
        let row = &mut rows[((day.date - first).num_days() / BUCKET_DAYS) as usize];
        row.acft += 1;
        row.sum_daily_hours += day.hours;
        row.age_fleet += day.age.unwrap_or(0.0);
        row.cycles += day.cycles;
        row.hh += day.hh;
    }
    rows
}

/// Builds the weekly dataset, keeping buckets strictly after `min_date`.
#[tracing::instrument(skip_all, fields(min_date = %min_date))]
pub fn build(
    hh: &[HhAggregate],
    cycles: &[DailyCycles],
    age: &[DailyAge],
    min_date: NaiveDate,
) -> Vec<WeeklyDatasetRow> {
    let joined = join_daily(hh, cycles, age);
    debug!(
        hh = hh.len(),
        cycles = cycles.len(),
        joined = joined.len(),
        "Joined labor hours with utilization"
    );

    let monthly = monthly_totals(&joined);
    let weeks = weekly_buckets(&joined, &monthly);
    let total = weeks.len();
    let rows: Vec<WeeklyDatasetRow> = weeks.into_iter().filter(|w| w.date > min_date).collect();

    info!(
        weeks = rows.len(),
        cut = total - rows.len(),
        "Built weekly dataset"
    );
    rows
}
