// src/reports/format.rs
//! Cell text for report lines. The PDF and CSV writers both go through here,
//! so every line has exactly one cell per configured column.

use chrono::NaiveDate;

use crate::models::MovementRow;
use crate::reports::aggregator::{AggregatedReport, DateKey, Totals};
use crate::reports::derived::DerivedFields;
use crate::reports::layout::{ColumnKey, Lang, ReportLayoutConfig};

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Whole number with a space every three digits: `12 500`.
pub fn format_int(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// Weight already rounded to a whole unit.
pub fn format_weight(value: f64) -> String {
    format_int(value.round() as i64)
}

pub fn format_decimal(value: f64) -> String {
    format!("{:.2}", value)
}

fn opt_int(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn date_label(key: DateKey, lang: Lang) -> String {
    match (key, lang) {
        (DateKey::Day(day), _) => format_date(day),
        (DateKey::Unknown, Lang::Fr) => "Date inconnue".to_string(),
        (DateKey::Unknown, Lang::Ar) => "تاريخ غير معروف".to_string(),
    }
}

/// Banner printed above the rows of one date group.
pub fn group_banner(key: DateKey, lang: Lang) -> String {
    match lang {
        Lang::Fr => format!("Date : {}", date_label(key, lang)),
        Lang::Ar => format!("التاريخ : {}", date_label(key, lang)),
    }
}

pub fn subtotal_label(key: DateKey, lang: Lang) -> String {
    match lang {
        Lang::Fr => format!("Total {}", date_label(key, lang)),
        Lang::Ar => format!("مجموع {}", date_label(key, lang)),
    }
}

pub fn grand_total_label(lang: Lang) -> &'static str {
    match lang {
        Lang::Fr => "Total général",
        Lang::Ar => "المجموع العام",
    }
}

/// Header line: one date when every group shares it, otherwise first..last.
pub fn date_range_summary(report: &AggregatedReport, lang: Lang) -> String {
    match (report.date_span(), lang) {
        (Some((first, last)), Lang::Fr) if first == last => format!("Journée du {}", format_date(first)),
        (Some((first, last)), Lang::Fr) => {
            format!("Du {} au {}", format_date(first), format_date(last))
        }
        (Some((first, last)), Lang::Ar) if first == last => format!("يوم {}", format_date(first)),
        (Some((first, last)), Lang::Ar) => {
            format!("من {} إلى {}", format_date(first), format_date(last))
        }
        (None, _) if report.unknown_date_rows > 0 => date_label(DateKey::Unknown, lang),
        (None, Lang::Fr) => "Aucune donnée".to_string(),
        (None, Lang::Ar) => "لا توجد بيانات".to_string(),
    }
}

/// Cells of one movement row, in layout column order.
pub fn row_cells(layout: &ReportLayoutConfig, row: &MovementRow) -> Vec<String> {
    let derived = DerivedFields::for_row(row);
    layout
        .columns
        .iter()
        .map(|column| match column.key {
            ColumnKey::Center => row.center_id.clone(),
            ColumnKey::Building => row.building_id.clone(),
            ColumnKey::Movement => row.movement_id.clone(),
            ColumnKey::Species => row.species.clone().unwrap_or_default(),
            ColumnKey::Strain => row.strain.clone().unwrap_or_default(),
            ColumnKey::Week => opt_int(row.week),
            ColumnKey::Day => opt_int(row.day_of_cycle),
            ColumnKey::Headcount => format_int(row.headcount_or_zero()),
            ColumnKey::BatchWeight => format_weight(row.batch_weight_or_zero()),
            ColumnKey::WeightPerHead => format_decimal(derived.weight_per_head),
            ColumnKey::ReferenceWeight => format_weight(row.reference_weight_or_zero()),
            ColumnKey::Mortality => format_int(row.mortality_or_zero()),
            ColumnKey::MortalityPct => format_decimal(derived.mortality_pct),
            ColumnKey::FeedConsumption => format_decimal(row.feed_consumption_or_zero()),
            ColumnKey::FeedPerHead => format_decimal(derived.feed_per_head),
            ColumnKey::WaterConsumption => format_decimal(row.water_consumption_or_zero()),
            ColumnKey::EggsTotal => format_int(row.eggs_total_or_zero()),
            ColumnKey::EggsBroken => format_int(row.eggs_broken_or_zero()),
            ColumnKey::LayingRate => format_decimal(derived.laying_rate),
        })
        .collect()
}

/// Cells of a subtotal or grand-total line. The label goes in the first
/// column; other text columns stay blank.
pub fn totals_cells(layout: &ReportLayoutConfig, label: &str, totals: &Totals) -> Vec<String> {
    let derived = DerivedFields::for_totals(totals);
    layout
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| match column.key {
            _ if i == 0 => label.to_string(),
            key if key.is_descriptive() => String::new(),
            ColumnKey::Headcount => format_int(totals.headcount),
            ColumnKey::BatchWeight => format_weight(totals.batch_weight),
            ColumnKey::WeightPerHead => format_decimal(derived.weight_per_head),
            ColumnKey::ReferenceWeight => format_weight(totals.reference_weight),
            ColumnKey::Mortality => format_int(totals.mortality),
            ColumnKey::MortalityPct => format_decimal(derived.mortality_pct),
            ColumnKey::FeedConsumption => format_decimal(totals.feed_consumption),
            ColumnKey::FeedPerHead => format_decimal(derived.feed_per_head),
            ColumnKey::WaterConsumption => format_decimal(totals.water_consumption),
            ColumnKey::EggsTotal => format_int(totals.eggs_total),
            ColumnKey::EggsBroken => format_int(totals.eggs_broken),
            ColumnKey::LayingRate => format_decimal(derived.laying_rate),
            _ => String::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportKind;
    use crate::reports::aggregator::group_by_date;
    use crate::reports::layout::layout_for;
    use strum::IntoEnumIterator;

    fn dated(date: &str) -> MovementRow {
        MovementRow {
            movement_id: "M1".to_string(),
            center_id: "C1".to_string(),
            building_id: "B1".to_string(),
            entry_date: Some(date.to_string()),
            headcount: Some(1200),
            batch_weight: Some(2400.4),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_int_groups_thousands() {
        assert_eq!(format_int(0), "0");
        assert_eq!(format_int(999), "999");
        assert_eq!(format_int(1000), "1 000");
        assert_eq!(format_int(1234567), "1 234 567");
        assert_eq!(format_int(-12500), "-12 500");
    }

    #[test]
    fn test_cells_match_column_count() {
        let row = dated("2024-01-01");
        for kind in ReportKind::iter() {
            let layout = layout_for(kind);
            assert_eq!(row_cells(layout, &row).len(), layout.columns.len());
            assert_eq!(totals_cells(layout, "Total", &Totals::zero()).len(), layout.columns.len());
        }
    }

    #[test]
    fn test_weight_row_cells() {
        let cells = row_cells(layout_for(ReportKind::Weight), &dated("2024-01-01"));
        assert_eq!(cells[0], "C1");
        assert_eq!(cells[7], "1 200");
        assert_eq!(cells[8], "2 400");
        assert_eq!(cells[9], "2.00");
    }

    #[test]
    fn test_totals_cells_put_label_first() {
        let layout = layout_for(ReportKind::DailyProduction);
        let totals = Totals { headcount: 50, mortality: 1, ..Totals::zero() };
        let cells = totals_cells(layout, "Total général", &totals);
        assert_eq!(cells[0], "Total général");
        assert_eq!(cells[1], "");
        assert_eq!(cells[5], "50");
        assert_eq!(cells[7], "2.00");
    }

    #[test]
    fn test_date_range_summary() {
        let single = group_by_date(&[dated("2024-01-01"), dated("2024-01-01 08:00:00")]);
        assert_eq!(date_range_summary(&single, Lang::Fr), "Journée du 01/01/2024");

        let span = group_by_date(&[dated("2024-01-03"), dated("2024-01-01"), dated("2024-01-02")]);
        assert_eq!(date_range_summary(&span, Lang::Fr), "Du 01/01/2024 au 03/01/2024");
        assert_eq!(date_range_summary(&span, Lang::Ar), "من 01/01/2024 إلى 03/01/2024");

        let unknown = group_by_date(&[dated("??")]);
        assert_eq!(date_range_summary(&unknown, Lang::Fr), "Date inconnue");

        let empty = group_by_date(&[]);
        assert_eq!(date_range_summary(&empty, Lang::Fr), "Aucune donnée");
    }

    #[test]
    fn test_group_labels() {
        let day = DateKey::Day(NaiveDate::from_ymd_opt(2024, 5, 9).unwrap());
        assert_eq!(group_banner(day, Lang::Fr), "Date : 09/05/2024");
        assert_eq!(subtotal_label(DateKey::Unknown, Lang::Fr), "Total Date inconnue");
    }
}
