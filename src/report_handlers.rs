// src/report_handlers.rs
//! Обработчики отчётов: JSON-превью, PDF и CSV

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::AppState;
use crate::auth::get_current_user;
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::models::{MovementRow, ReportKind};
use crate::monitoring::{Metrics, ReportFormat};
use crate::reports::csv_export::render_csv;
use crate::reports::format::{date_label, date_range_summary};
use crate::reports::pdf::{render_pdf, RenderOptions};
use crate::reports::{
    build_report, layout_for, AggregatedReport, DateKey, DerivedFields, Lang, ReportLayoutConfig, Totals,
};
use crate::repositories::{DateRange, TenantScope};

// ==================== REQUEST STRUCTURES ====================

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub lang: Option<Lang>,
}

impl ReportQuery {
    pub fn date_range(&self) -> ApiResult<DateRange> {
        let from = parse_query_date("date_from", self.date_from.as_deref())?;
        let to = parse_query_date("date_to", self.date_to.as_deref())?;

        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ApiError::invalid_date_range(&from.to_string(), &to.to_string()));
            }
        }
        Ok(DateRange { from, to })
    }

    pub fn lang(&self) -> Lang {
        self.lang.unwrap_or_default()
    }
}

fn parse_query_date(field: &str, value: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::invalid_date(field, raw)),
    }
}

fn parse_kind(raw: &str) -> ApiResult<ReportKind> {
    ReportKind::from_str(raw).map_err(|_| ApiError::unknown_report_kind(raw))
}

// ==================== RESPONSE STRUCTURES ====================

#[derive(Debug, Serialize)]
pub struct RowView<'a> {
    #[serde(flatten)]
    pub row: &'a MovementRow,
    pub derived: DerivedFields,
}

#[derive(Debug, Serialize)]
pub struct GroupView<'a> {
    pub key: DateKey,
    pub label: String,
    pub rows: Vec<RowView<'a>>,
    pub totals: Totals,
    pub derived: DerivedFields,
}

#[derive(Debug, Serialize)]
pub struct ReportView<'a> {
    pub report_id: Uuid,
    pub kind: ReportKind,
    pub title: &'static str,
    pub period: String,
    pub generated_at: DateTime<Utc>,
    pub layout: &'static ReportLayoutConfig,
    pub groups: Vec<GroupView<'a>>,
    pub grand_totals: Totals,
    pub grand_derived: DerivedFields,
    pub unknown_date_rows: usize,
}

impl<'a> ReportView<'a> {
    fn new(report_id: Uuid, kind: ReportKind, report: &'a AggregatedReport, lang: Lang) -> Self {
        let layout = layout_for(kind);
        let groups = report
            .groups
            .iter()
            .map(|group| GroupView {
                key: group.key,
                label: date_label(group.key, lang),
                rows: group
                    .rows
                    .iter()
                    .map(|row| RowView { row, derived: DerivedFields::for_row(row) })
                    .collect(),
                totals: group.totals,
                derived: DerivedFields::for_totals(&group.totals),
            })
            .collect();

        Self {
            report_id,
            kind,
            title: layout.title(lang),
            period: date_range_summary(report, lang),
            generated_at: Utc::now(),
            layout,
            groups,
            grand_totals: report.grand_totals,
            grand_derived: DerivedFields::for_totals(&report.grand_totals),
            unknown_date_rows: report.unknown_date_rows,
        }
    }
}

// ==================== HELPERS ====================

struct LoadedReport {
    id: Uuid,
    kind: ReportKind,
    scope: TenantScope,
    report: AggregatedReport,
}

async fn load_report(
    app_state: &AppState,
    metrics: &Metrics,
    http_request: &HttpRequest,
    raw_kind: &str,
    query: &ReportQuery,
) -> ApiResult<LoadedReport> {
    let claims = get_current_user(http_request)?;
    let kind = parse_kind(raw_kind)?;
    let range = query.date_range()?;
    let scope = claims.tenant();
    let id = Uuid::new_v4();

    log::info!(
        "Report {} requested by {} ({}), range {:?}..{:?}, id {}",
        kind, claims.username, scope.company_code, range.from, range.to, id
    );

    let report = build_report(app_state.source.as_ref(), kind, &scope, &range)
        .await
        .map_err(|err| {
            metrics.record_report_failure();
            err
        })?;

    Ok(LoadedReport { id, kind, scope, report })
}

fn attachment_name(kind: ReportKind, id: Uuid, extension: &str) -> String {
    let simple = id.simple().to_string();
    format!(
        "{}_{}_{}.{}",
        kind.file_stem(),
        Local::now().format("%Y%m%d_%H%M%S"),
        &simple[..8],
        extension
    )
}

// ==================== HANDLERS ====================

pub async fn get_report_layouts() -> ApiResult<HttpResponse> {
    let layouts: Vec<&'static ReportLayoutConfig> = ReportKind::iter().map(layout_for).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(layouts)))
}

pub async fn get_report(
    app_state: web::Data<Arc<AppState>>,
    metrics: web::Data<Arc<Metrics>>,
    path: web::Path<String>,
    query: web::Query<ReportQuery>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let loaded = load_report(&app_state, &metrics, &http_request, &path.into_inner(), &query).await?;
    let view = ReportView::new(loaded.id, loaded.kind, &loaded.report, query.lang());

    metrics.record_report(ReportFormat::Json);
    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

pub async fn export_report_pdf(
    app_state: web::Data<Arc<AppState>>,
    metrics: web::Data<Arc<Metrics>>,
    path: web::Path<String>,
    query: web::Query<ReportQuery>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let loaded = load_report(&app_state, &metrics, &http_request, &path.into_inner(), &query).await?;

    let options = RenderOptions {
        company_name: app_state.config.report.company_name.clone(),
        generated_at: Local::now().naive_local(),
        font: app_state.font.clone(),
    };
    let rendered = render_pdf(layout_for(loaded.kind), &loaded.report, &options).map_err(|err| {
        tracing::error!(report_id = %loaded.id, error = %err, "PDF rendering failed");
        metrics.record_report_failure();
        err
    })?;

    tracing::info!(
        report_id = %loaded.id,
        report = %loaded.kind,
        company_code = %loaded.scope.company_code,
        pages = rendered.pages,
        bytes = rendered.bytes.len(),
        "PDF report generated"
    );
    metrics.record_report(ReportFormat::Pdf);

    let filename = attachment_name(loaded.kind, loaded.id, "pdf");
    Ok(HttpResponse::Ok()
        .insert_header(("Content-Type", "application/pdf"))
        .insert_header(("Content-Disposition", format!("attachment; filename=\"{}\"", filename)))
        .body(rendered.bytes))
}

pub async fn export_report_csv(
    app_state: web::Data<Arc<AppState>>,
    metrics: web::Data<Arc<Metrics>>,
    path: web::Path<String>,
    query: web::Query<ReportQuery>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let loaded = load_report(&app_state, &metrics, &http_request, &path.into_inner(), &query).await?;

    let csv_data = render_csv(layout_for(loaded.kind), &loaded.report, query.lang()).map_err(|err| {
        tracing::error!(report_id = %loaded.id, error = %err, "CSV export failed");
        metrics.record_report_failure();
        err
    })?;

    metrics.record_report(ReportFormat::Csv);

    let filename = attachment_name(loaded.kind, loaded.id, "csv");
    Ok(HttpResponse::Ok()
        .insert_header(("Content-Type", "text/csv; charset=utf-8"))
        .insert_header(("Content-Disposition", format!("attachment; filename=\"{}\"", filename)))
        .body(csv_data))
}

// ==================== TESTS ====================
