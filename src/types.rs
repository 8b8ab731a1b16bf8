//! Record types flowing between pipeline stages.
//!
//! Serialized field names match the checkpoint and dataset files the
//! training side already reads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Column order of the final weekly dataset.
pub const DATASET_COLUMNS: [&str; 7] = [
    "date",
    "acft",
    "sum_daily_hours",
    "age_fleet",
    "Cycles",
    "sum_uti_mensal",
    "HH",
];

/// A maintenance item as read from either spreadsheet layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaintenanceItemRecord {
    pub role: String,
    pub tail: String,
    pub ac_type: String,
    pub issue_station: String,
    pub closing_date: Option<NaiveDate>,
    pub ata: String,
    pub ata_desc: String,
    pub hh_planned: String,
    pub hh_executed: String,
}

impl MaintenanceItemRecord {
    pub fn into_canonical(self) -> CanonicalItemRecord {
        CanonicalItemRecord {
            tail: self.tail,
            ac_type: self.ac_type,
            issue_station: self.issue_station,
            closing_date: self.closing_date,
            ata: self.ata,
            ata_desc: self.ata_desc,
            hh_planned: self.hh_planned,
            hh_executed: self.hh_executed,
        }
    }
}

/// Unified maintenance item; labor hours are still undecoded text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CanonicalItemRecord {
    #[serde(rename = "AC")]
    pub tail: String,
    #[serde(rename = "AC_Type")]
    pub ac_type: String,
    #[serde(rename = "ISSUE_Station")]
    pub issue_station: String,
    #[serde(rename = "CLOSING_DATE")]
    pub closing_date: Option<NaiveDate>,
    #[serde(rename = "ATA")]
    pub ata: String,
    #[serde(rename = "ATA_DESC")]
    pub ata_desc: String,
    #[serde(rename = "HH_Planejado_WO")]
    pub hh_planned: String,
    #[serde(rename = "HH_Executado_WO")]
    pub hh_executed: String,
}

/// One raw line of the daily utilization feed, every field as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtilizationRecord {
    pub dep_date: String,
    pub tail: String,
    pub ac_type: String,
    pub per_day: String,
    pub hours: String,
    pub cycles: String,
    pub tah: String,
    pub tac: String,
    /// File the line came from.
    pub origin: PathBuf,
}

impl UtilizationRecord {
    /// Field values used for duplicate detection; the origin is not part of it.
    pub fn fields(&self) -> [&str; 8] {
        [
            self.dep_date.as_str(),
            self.tail.as_str(),
            self.ac_type.as_str(),
            self.per_day.as_str(),
            self.hours.as_str(),
            self.cycles.as_str(),
            self.tah.as_str(),
            self.tac.as_str(),
        ]
    }
}

/// Labor hours per aircraft per closing date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HhAggregate {
    #[serde(rename = "CLOSING_DATE")]
    pub closing_date: NaiveDate,
    #[serde(rename = "AC")]
    pub tail: String,
    #[serde(rename = "HH")]
    pub hh: f64,
}

/// Daily-cycles view of the utilization feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCycles {
    #[serde(rename = "Dep._Date")]
    pub date: NaiveDate,
    #[serde(rename = "A/C")]
    pub tail: String,
    #[serde(rename = "Hours_dec")]
    pub hours: f64,
    #[serde(rename = "Cycles")]
    pub cycles: f64,
}

/// Daily-age view; `tah` is the highest cumulative airframe hours seen that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAge {
    #[serde(rename = "Dep._Date")]
    pub date: NaiveDate,
    #[serde(rename = "A/C")]
    pub tail: String,
    #[serde(rename = "Hours_dec")]
    pub hours: f64,
    #[serde(rename = "TAH_dec")]
    pub tah: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UtilizationViews {
    pub cycles: Vec<DailyCycles>,
    pub age: Vec<DailyAge>,
}

/// Join key shared by every daily collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey {
    pub date: NaiveDate,
    pub tail: String,
}

impl DayKey {
    pub fn new(date: NaiveDate, tail: &str) -> Self {
        DayKey {
            date,
            tail: tail.to_string(),
        }
    }
}

/// One 7-day bucket of the final dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyDatasetRow {
    pub date: NaiveDate,
    /// Count of daily records in the bucket, not distinct aircraft.
    pub acft: usize,
    pub sum_daily_hours: f64,
    pub age_fleet: f64,
    #[serde(rename = "Cycles")]
    pub cycles: f64,
    pub sum_uti_mensal: f64,
    #[serde(rename = "HH")]
    pub hh: f64,
}
