// src/reports/mod.rs
//! Report pipeline: fetched rows → date groups with totals → PDF or CSV bytes.

pub mod aggregator;
pub mod csv_export;
pub mod derived;
pub mod fonts;
pub mod format;
pub mod layout;
pub mod pdf;

pub use aggregator::{group_by_date, AggregatedReport, DateKey, Totals};
pub use derived::DerivedFields;
pub use layout::{layout_for, Lang, ReportLayoutConfig};

use crate::error::{ApiError, ApiResult};
use crate::models::ReportKind;
use crate::repositories::{DateRange, MovementSource, TenantScope};

/// Fetches and aggregates one report. A fetch failure aborts the whole
/// report; nothing partial is returned.
pub async fn build_report(
    source: &dyn MovementSource,
    kind: ReportKind,
    scope: &TenantScope,
    range: &DateRange,
) -> ApiResult<AggregatedReport> {
    let rows = source.fetch_rows(kind, scope, range).await.map_err(|err| {
        tracing::error!(
            report = %kind,
            company_code = %scope.company_code,
            error = %err,
            "failed to fetch report rows"
        );
        ApiError::report_failed(err)
    })?;

    let report = group_by_date(&rows);
    if report.unknown_date_rows > 0 {
        tracing::warn!(
            report = %kind,
            rows = report.unknown_date_rows,
            "report contains rows without a usable date"
        );
    }
    tracing::debug!(
        report = %kind,
        rows = rows.len(),
        groups = report.groups.len(),
        "report aggregated"
    );
    Ok(report)
}
