// src/reports/csv_export.rs
//! Spreadsheet-friendly export walking the groups in the same order as the PDF.

use crate::error::ApiResult;
use crate::reports::aggregator::AggregatedReport;
use crate::reports::format::{grand_total_label, group_banner, row_cells, subtotal_label, totals_cells};
use crate::reports::layout::{Lang, ReportLayoutConfig};

pub fn render_csv(layout: &ReportLayoutConfig, report: &AggregatedReport, lang: Lang) -> ApiResult<Vec<u8>> {
    let width = layout.columns.len();
    // BOM для корректного отображения UTF-8 в Excel
    let mut csv_data = "\u{FEFF}".as_bytes().to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut csv_data);

        if layout.has_category_header() {
            let mut categories = Vec::with_capacity(width);
            for category in layout.categories {
                categories.push(category.label(lang).to_string());
                categories.extend(std::iter::repeat(String::new()).take(category.span - 1));
            }
            writer.write_record(&categories)?;
        }
        writer.write_record(layout.columns.iter().map(|c| c.label(lang)))?;

        for group in &report.groups {
            writer.write_record(padded(group_banner(group.key, lang), width))?;
            for row in &group.rows {
                writer.write_record(row_cells(layout, row))?;
            }
            let label = subtotal_label(group.key, lang);
            writer.write_record(totals_cells(layout, &label, &group.totals))?;
        }

        writer.write_record(totals_cells(layout, grand_total_label(lang), &report.grand_totals))?;
        writer.flush()?;
    }
    Ok(csv_data)
}

fn padded(first: String, width: usize) -> Vec<String> {
    let mut record = vec![String::new(); width];
    record[0] = first;
    record
}
