//! Cell values as read from spreadsheets and delimited files, and their
//! conversion into the text and date forms the pipeline works with.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

const SECONDS_PER_DAY: f64 = 86_400.0;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%m-%d-%Y", "%d-%m-%Y", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%m-%d-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    /// Spreadsheet serial date-time (days since 1899-12-30).
    DateTime(f64),
}

impl Cell {
    /// Builds a cell from delimited text; blank fields become [`Cell::Empty`].
    pub fn from_field(field: &str) -> Self {
        if field.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(field.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text rendering used for identifier-like fields. Empty cells render as `""`.
    ///
    /// Whole-number floats drop the fraction, so an ATA code stored as a
    /// spreadsheet number reads `21`, not `21.0`.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(v) => v.to_string(),
            Cell::DateTime(serial) => serial_to_text(*serial),
        }
    }

    /// Text rendering for labor-hour fields, which must always be text.
    ///
    /// Missing values render as `"nan"`, the way a stringified dataframe
    /// column shows them.
    pub fn to_duration_text(&self) -> String {
        match self {
            Cell::Empty => "nan".to_string(),
            Cell::Float(v) => python_float(*v),
            other => other.to_text(),
        }
    }

    /// Interprets the cell as a calendar date.
    pub fn to_date(&self) -> Result<Option<NaiveDate>, String> {
        match self {
            Cell::Empty => Ok(None),
            Cell::DateTime(serial) | Cell::Float(serial) => serial_to_datetime(*serial)
                .map(|dt| Some(dt.date()))
                .ok_or_else(|| format!("serial date {} out of range", serial)),
            Cell::Int(i) => serial_to_datetime(*i as f64)
                .map(|dt| Some(dt.date()))
                .ok_or_else(|| format!("serial date {} out of range", i)),
            Cell::Text(s) => parse_date(s)
                .map(Some)
                .ok_or_else(|| format!("unrecognized date `{}`", s)),
        }
    }
}

/// Parses date text in any of the accepted layouts; a time component is dropped.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
                .map(|dt| dt.date())
        })
}

/// Renders a float the way Python's `str()` does for the common cases.
pub fn python_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * SECONDS_PER_DAY * 1000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

/// Time-of-day serials render as `HH:MM:SS`, anything longer as a full timestamp.
fn serial_to_text(serial: f64) -> String {
    let seconds = (serial * SECONDS_PER_DAY).round() as i64;
    if (0..86_400).contains(&seconds) {
        return format!(
            "{:02}:{:02}:{:02}",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        );
    }
    match serial_to_datetime(serial) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => python_float(serial),
    }
}
