// src/reports/aggregator.rs
//! Groups report rows by calendar date and computes subtotals and grand totals.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::MovementRow;
use crate::reports::derived::round_weight;

/// Grouping key. `Unknown` holds rows whose date is missing or unparseable
/// and orders before every real day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "type", content = "date", rename_all = "snake_case")]
pub enum DateKey {
    Unknown,
    Day(NaiveDate),
}

impl DateKey {
    pub fn of(row: &MovementRow) -> Self {
        match row.calendar_date() {
            Some(day) => DateKey::Day(day),
            None => DateKey::Unknown,
        }
    }

    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            DateKey::Day(day) => Some(*day),
            DateKey::Unknown => None,
        }
    }
}

/// Summable measures of a group or of a whole report.
///
/// Weights are rounded once, after summation. Consumptions keep their decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub rows: usize,
    pub headcount: i64,
    pub batch_weight: f64,
    pub reference_weight: f64,
    pub mortality: i64,
    pub feed_consumption: f64,
    pub water_consumption: f64,
    pub eggs_total: i64,
    pub eggs_broken: i64,
    /// Unrounded batch weight sum; per-head ratios divide this one.
    #[serde(skip)]
    pub batch_weight_raw: f64,
}

impl Totals {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Sums raw row values. Never built from other `Totals`, so no double rounding.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a MovementRow>,
    {
        let mut totals = Totals::zero();
        let mut batch_weight = 0.0;
        let mut reference_weight = 0.0;

        for row in rows {
            totals.rows += 1;
            totals.headcount += row.headcount_or_zero();
            batch_weight += row.batch_weight_or_zero();
            reference_weight += row.reference_weight_or_zero();
            totals.mortality += row.mortality_or_zero();
            totals.feed_consumption += row.feed_consumption_or_zero();
            totals.water_consumption += row.water_consumption_or_zero();
            totals.eggs_total += row.eggs_total_or_zero();
            totals.eggs_broken += row.eggs_broken_or_zero();
        }

        totals.batch_weight_raw = batch_weight;
        totals.batch_weight = round_weight(batch_weight);
        totals.reference_weight = round_weight(reference_weight);
        totals
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DateGroup {
    pub key: DateKey,
    pub rows: Vec<MovementRow>,
    pub totals: Totals,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregatedReport {
    pub groups: Vec<DateGroup>,
    pub grand_totals: Totals,
    pub unknown_date_rows: usize,
}

impl AggregatedReport {
    /// Earliest and latest real dates. The unknown group is skipped.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut days = self.groups.iter().filter_map(|g| g.key.day());
        let first = days.next()?;
        let last = days.last().unwrap_or(first);
        Some((first, last))
    }
}

/// Presentation order inside a date group: center, movement, day of cycle.
fn row_order(a: &MovementRow, b: &MovementRow) -> std::cmp::Ordering {
    a.center_id
        .cmp(&b.center_id)
        .then_with(|| a.movement_id.cmp(&b.movement_id))
        .then_with(|| a.day_of_cycle.unwrap_or(0).cmp(&b.day_of_cycle.unwrap_or(0)))
}

/// Partitions rows by calendar date and computes per-group and grand totals.
///
/// Groups come out in ascending date order with the unknown-date group first.
/// Within a group the sort is stable, so equal keys keep their input order.
pub fn group_by_date(rows: &[MovementRow]) -> AggregatedReport {
    let mut buckets: BTreeMap<DateKey, Vec<MovementRow>> = BTreeMap::new();

    for row in rows {
        let key = DateKey::of(row);
        if key == DateKey::Unknown {
            tracing::warn!(
                movement_id = %row.movement_id,
                center_id = %row.center_id,
                entry_date = ?row.entry_date,
                "row without a usable date, placed in the unknown-date group"
            );
        }
        buckets.entry(key).or_default().push(row.clone());
    }

    let unknown_date_rows = buckets.get(&DateKey::Unknown).map_or(0, Vec::len);

    let groups = buckets
        .into_iter()
        .map(|(key, mut rows)| {
            rows.sort_by(row_order);
            let totals = Totals::from_rows(&rows);
            DateGroup { key, rows, totals }
        })
        .collect();

    AggregatedReport {
        groups,
        grand_totals: Totals::from_rows(rows),
        unknown_date_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: Option<&str>, center: &str, movement: &str, day: i32, headcount: i64, weight: f64) -> MovementRow {
        MovementRow {
            movement_id: movement.to_string(),
            center_id: center.to_string(),
            building_id: "B1".to_string(),
            entry_date: date.map(str::to_string),
            day_of_cycle: Some(day),
            headcount: Some(headcount),
            batch_weight: Some(weight),
            ..Default::default()
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> DateKey {
        DateKey::Day(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_concrete_scenario() {
        let rows = vec![
            row(Some("2024-01-01"), "C1", "M1", 1, 100, 500.0),
            row(Some("2024-01-01"), "C1", "M2", 1, 50, 200.0),
            row(Some("2024-01-02"), "C1", "M1", 2, 80, 400.0),
        ];
        let report = group_by_date(&rows);

        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].key, ymd(2024, 1, 1));
        assert_eq!(report.groups[0].totals.headcount, 150);
        assert_eq!(report.groups[0].totals.batch_weight, 700.0);
        assert_eq!(report.groups[1].key, ymd(2024, 1, 2));
        assert_eq!(report.groups[1].totals.headcount, 80);
        assert_eq!(report.groups[1].totals.batch_weight, 400.0);
        assert_eq!(report.grand_totals.headcount, 230);
        assert_eq!(report.grand_totals.batch_weight, 1100.0);
    }

    #[test]
    fn test_empty_input() {
        let report = group_by_date(&[]);
        assert!(report.groups.is_empty());
        assert_eq!(report.grand_totals, Totals::zero());
        assert_eq!(report.unknown_date_rows, 0);
        assert_eq!(report.date_span(), None);
    }

    #[test]
    fn test_partition_is_exact() {
        let rows = vec![
            row(Some("2024-03-02"), "C2", "M9", 4, 10, 1.0),
            row(None, "C1", "M1", 1, 10, 1.0),
            row(Some("2024-03-01 23:59:59"), "C1", "M1", 3, 10, 1.0),
            row(Some("2024-03-01 00:00:01"), "C1", "M1", 2, 10, 1.0),
            row(Some("not a date"), "C1", "M2", 1, 10, 1.0),
        ];
        let report = group_by_date(&rows);

        let grouped: usize = report.groups.iter().map(|g| g.rows.len()).sum();
        assert_eq!(grouped, rows.len());
        for original in &rows {
            let hits = report
                .groups
                .iter()
                .flat_map(|g| g.rows.iter())
                .filter(|r| *r == original)
                .count();
            assert_eq!(hits, 1);
        }
        // both 2024-03-01 timestamps share one group
        assert_eq!(report.groups.len(), 3);
    }

    #[test]
    fn test_unknown_date_group_sorts_first() {
        let rows = vec![
            row(Some("2024-01-05"), "C1", "M1", 1, 10, 1.0),
            row(None, "C1", "M1", 1, 7, 1.0),
            row(Some("garbage"), "C1", "M1", 2, 3, 1.0),
        ];
        let report = group_by_date(&rows);

        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].key, DateKey::Unknown);
        assert_eq!(report.groups[0].rows.len(), 2);
        assert_eq!(report.groups[0].totals.headcount, 10);
        assert_eq!(report.unknown_date_rows, 2);
        assert_eq!(report.groups[1].key, ymd(2024, 1, 5));

        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(report.date_span(), Some((day, day)));
    }

    #[test]
    fn test_rows_sorted_within_group_and_stable() {
        let mut first = row(Some("2024-01-01"), "C1", "M1", 5, 1, 0.0);
        first.building_id = "first".to_string();
        let mut second = row(Some("2024-01-01"), "C1", "M1", 5, 2, 0.0);
        second.building_id = "second".to_string();

        let rows = vec![
            row(Some("2024-01-01"), "C2", "M1", 1, 1, 0.0),
            first,
            row(Some("2024-01-01"), "C1", "M1", 2, 1, 0.0),
            second,
            row(Some("2024-01-01"), "C1", "M0", 9, 1, 0.0),
        ];
        let report = group_by_date(&rows);
        let keys: Vec<(String, String, i32, String)> = report.groups[0]
            .rows
            .iter()
            .map(|r| (r.center_id.clone(), r.movement_id.clone(), r.day_of_cycle.unwrap(), r.building_id.clone()))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("C1".into(), "M0".into(), 9, "B1".into()),
                ("C1".into(), "M1".into(), 2, "B1".into()),
                ("C1".into(), "M1".into(), 5, "first".into()),
                ("C1".into(), "M1".into(), 5, "second".into()),
                ("C2".into(), "M1".into(), 1, "B1".into()),
            ]
        );
    }

    #[test]
    fn test_weight_rounded_after_summing() {
        // rounding each row first would give 0 + 0 + 0 = 0
        let rows = vec![
            row(Some("2024-01-01"), "C1", "M1", 1, 1, 0.4),
            row(Some("2024-01-01"), "C1", "M2", 1, 1, 0.4),
            row(Some("2024-01-01"), "C1", "M3", 1, 1, 0.4),
        ];
        let report = group_by_date(&rows);
        assert_eq!(report.groups[0].totals.batch_weight, 1.0);
        assert_eq!(report.grand_totals.batch_weight, 1.0);
    }

    #[test]
    fn test_grand_totals_from_raw_rows() {
        // each group rounds 0.6 up to 1; the raw total 1.2 rounds to 1
        let rows = vec![
            row(Some("2024-01-01"), "C1", "M1", 1, 1, 0.6),
            row(Some("2024-01-02"), "C1", "M1", 2, 1, 0.6),
        ];
        let report = group_by_date(&rows);
        assert_eq!(report.groups[0].totals.batch_weight, 1.0);
        assert_eq!(report.groups[1].totals.batch_weight, 1.0);
        assert_eq!(report.grand_totals.batch_weight, 1.0);
    }

    #[test]
    fn test_summable_fields_match_group_sums() {
        let mut rows = Vec::new();
        for i in 0..12 {
            let mut r = row(Some(&format!("2024-02-{:02}", 1 + i % 4)), "C1", &format!("M{}", i), i, 10 + i as i64, 100.0);
            r.mortality = if i % 3 == 0 { None } else { Some(i as i64) };
            r.feed_consumption = Some(1.25 * i as f64);
            r.eggs_total = Some(5);
            rows.push(r);
        }
        let report = group_by_date(&rows);

        let headcount: i64 = report.groups.iter().map(|g| g.totals.headcount).sum();
        let mortality: i64 = report.groups.iter().map(|g| g.totals.mortality).sum();
        let eggs: i64 = report.groups.iter().map(|g| g.totals.eggs_total).sum();
        let feed: f64 = report.groups.iter().map(|g| g.totals.feed_consumption).sum();
        let expected_headcount: i64 = rows.iter().map(|r| r.headcount_or_zero()).sum();

        assert_eq!(report.grand_totals.headcount, headcount);
        assert_eq!(report.grand_totals.headcount, expected_headcount);
        assert_eq!(report.grand_totals.mortality, mortality);
        assert_eq!(report.grand_totals.eggs_total, eggs);
        assert!((report.grand_totals.feed_consumption - feed).abs() < 1e-9);
        assert_eq!(report.grand_totals.rows, rows.len());
    }

    #[test]
    fn test_null_measures_count_as_zero() {
        let mut r = row(Some("2024-01-01"), "C1", "M1", 1, 0, 0.0);
        r.headcount = None;
        r.batch_weight = None;
        let report = group_by_date(&[r, row(Some("2024-01-01"), "C1", "M2", 1, 5, 2.0)]);
        assert_eq!(report.groups[0].totals.headcount, 5);
        assert_eq!(report.groups[0].totals.batch_weight, 2.0);
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![
            row(Some("2024-01-02"), "C2", "M1", 1, 3, 1.5),
            row(None, "C1", "M1", 1, 4, 2.5),
            row(Some("2024-01-01"), "C1", "M3", 1, 5, 3.5),
        ];
        let a = group_by_date(&rows);
        let b = group_by_date(&rows);

        assert_eq!(a.grand_totals, b.grand_totals);
        assert_eq!(a.groups.len(), b.groups.len());
        for (ga, gb) in a.groups.iter().zip(&b.groups) {
            assert_eq!(ga.key, gb.key);
            assert_eq!(ga.rows, gb.rows);
            assert_eq!(ga.totals, gb.totals);
        }
    }
}
