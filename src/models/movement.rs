// src/models/movement.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One line of a report query: a movement (lot) in a building on one day.
///
/// Every measure is optional in the database; aggregation reads them
/// through the `*_or_zero` accessors.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, Default, PartialEq)]
pub struct MovementRow {
    pub movement_id: String,
    pub center_id: String,
    pub building_id: String,
    pub species: Option<String>,
    pub strain: Option<String>,
    /// Entry date as stored. Parsed into a calendar date by the aggregator.
    pub entry_date: Option<String>,
    pub week: Option<i32>,
    pub day_of_cycle: Option<i32>,
    pub headcount: Option<i64>,
    pub batch_weight: Option<f64>,
    pub reference_weight: Option<f64>,
    pub mortality: Option<i64>,
    pub feed_consumption: Option<f64>,
    pub water_consumption: Option<f64>,
    pub eggs_total: Option<i64>,
    pub eggs_broken: Option<i64>,
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses a stored date, dropping any time of day.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    // MySQL zero dates and other sentinels end up here
    None
}

impl MovementRow {
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.entry_date.as_deref().and_then(parse_calendar_date)
    }

    pub fn headcount_or_zero(&self) -> i64 {
        self.headcount.unwrap_or(0)
    }

    pub fn batch_weight_or_zero(&self) -> f64 {
        finite_or_zero(self.batch_weight)
    }

    pub fn reference_weight_or_zero(&self) -> f64 {
        finite_or_zero(self.reference_weight)
    }

    pub fn mortality_or_zero(&self) -> i64 {
        self.mortality.unwrap_or(0)
    }

    pub fn feed_consumption_or_zero(&self) -> f64 {
        finite_or_zero(self.feed_consumption)
    }

    pub fn water_consumption_or_zero(&self) -> f64 {
        finite_or_zero(self.water_consumption)
    }

    pub fn eggs_total_or_zero(&self) -> i64 {
        self.eggs_total.unwrap_or(0)
    }

    pub fn eggs_broken_or_zero(&self) -> i64 {
        self.eggs_broken.unwrap_or(0)
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
