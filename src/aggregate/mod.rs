//! Per-source cleaning and daily aggregation.
//!
//! `hh` turns canonical maintenance items into labor hours per aircraft and
//! day; `utilization` turns the flight feed into the daily-cycles and
//! daily-age views.

pub mod hh;
pub mod utilization;
pub mod utility;
