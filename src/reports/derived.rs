// src/reports/derived.rs
//! Ratios shown next to the raw measures: per-head values and percentages.

use serde::Serialize;

use crate::models::MovementRow;
use crate::reports::aggregator::Totals;

/// Divides, returning 0 when the denominator is zero or either side is not finite.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return 0.0;
    }
    numerator / denominator
}

/// Two-decimal precision used for every ratio.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounds a summed weight to the nearest whole unit, half away from zero.
pub fn round_weight(sum: f64) -> f64 {
    sum.round()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DerivedFields {
    pub weight_per_head: f64,
    pub mortality_pct: f64,
    pub feed_per_head: f64,
    pub laying_rate: f64,
}

impl DerivedFields {
    fn from_parts(headcount: f64, batch_weight: f64, mortality: f64, feed: f64, eggs: f64) -> Self {
        Self {
            weight_per_head: round2(safe_div(batch_weight, headcount)),
            mortality_pct: round2(safe_div(mortality, headcount) * 100.0),
            feed_per_head: round2(safe_div(feed, headcount)),
            laying_rate: round2(safe_div(eggs, headcount) * 100.0),
        }
    }

    pub fn for_row(row: &MovementRow) -> Self {
        Self::from_parts(
            row.headcount_or_zero() as f64,
            row.batch_weight_or_zero(),
            row.mortality_or_zero() as f64,
            row.feed_consumption_or_zero(),
            row.eggs_total_or_zero() as f64,
        )
    }

    /// Recomputed from the summed numerators and denominators of a totals line.
    /// The weight is the unrounded sum; the displayed total is rounded separately.
    pub fn for_totals(totals: &Totals) -> Self {
        Self::from_parts(
            totals.headcount as f64,
            totals.batch_weight_raw,
            totals.mortality as f64,
            totals.feed_consumption,
            totals.eggs_total as f64,
        )
    }
}
