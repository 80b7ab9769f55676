// src/repositories/mod.rs
//! Источники строк для отчётов

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::MySqlPool;

use crate::error::ApiResult;
use crate::models::{MovementRow, ReportKind};

/// Tenant filter applied to every report query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantScope {
    pub user_code: String,
    pub company_code: String,
}

/// Inclusive calendar range; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Supplies report rows ordered by (date, center, movement, day of cycle).
#[async_trait]
pub trait MovementSource: Send + Sync {
    async fn fetch_rows(
        &self,
        kind: ReportKind,
        scope: &TenantScope,
        range: &DateRange,
    ) -> ApiResult<Vec<MovementRow>>;

    /// Cheap connectivity probe for readiness checks.
    async fn ping(&self) -> ApiResult<()>;
}

const WEIGHT_QUERY: &str = r#"
    SELECT
        m.code AS movement_id,
        c.code AS center_id,
        b.code AS building_id,
        m.species AS species,
        m.strain AS strain,
        DATE_FORMAT(w.weighing_date, '%Y-%m-%d %H:%i:%s') AS entry_date,
        w.week AS week,
        w.day_of_cycle AS day_of_cycle,
        w.headcount AS headcount,
        w.batch_weight AS batch_weight,
        w.reference_weight AS reference_weight,
        CAST(NULL AS SIGNED) AS mortality,
        CAST(NULL AS DOUBLE) AS feed_consumption,
        CAST(NULL AS DOUBLE) AS water_consumption,
        CAST(NULL AS SIGNED) AS eggs_total,
        CAST(NULL AS SIGNED) AS eggs_broken
    FROM weighings w
    JOIN movements m ON m.id = w.movement_id
    JOIN buildings b ON b.id = m.building_id
    JOIN centers c ON c.id = b.center_id
    WHERE m.company_code = ?
      AND EXISTS (
          SELECT 1 FROM user_centers uc
          WHERE uc.center_id = c.id AND uc.user_code = ?
      )
"#;

const DAILY_PRODUCTION_QUERY: &str = r#"
    SELECT
        m.code AS movement_id,
        c.code AS center_id,
        b.code AS building_id,
        m.species AS species,
        m.strain AS strain,
        DATE_FORMAT(d.entry_date, '%Y-%m-%d %H:%i:%s') AS entry_date,
        d.week AS week,
        d.day_of_cycle AS day_of_cycle,
        d.headcount AS headcount,
        CAST(NULL AS DOUBLE) AS batch_weight,
        CAST(NULL AS DOUBLE) AS reference_weight,
        d.mortality AS mortality,
        d.feed_consumption AS feed_consumption,
        d.water_consumption AS water_consumption,
        d.eggs_total AS eggs_total,
        d.eggs_broken AS eggs_broken
    FROM daily_entries d
    JOIN movements m ON m.id = d.movement_id
    JOIN buildings b ON b.id = m.building_id
    JOIN centers c ON c.id = b.center_id
    WHERE m.company_code = ?
      AND EXISTS (
          SELECT 1 FROM user_centers uc
          WHERE uc.center_id = c.id AND uc.user_code = ?
      )
"#;

/// Builds the query text for a report kind. Only placeholders vary with
/// the input; values are always bound.
pub fn report_query(kind: ReportKind, range: &DateRange) -> String {
    let (base, date_column) = match kind {
        ReportKind::Weight => (WEIGHT_QUERY, "w.weighing_date"),
        ReportKind::DailyProduction => (DAILY_PRODUCTION_QUERY, "d.entry_date"),
    };

    let mut sql = base.to_string();
    if range.from.is_some() {
        sql.push_str(&format!("      AND DATE({}) >= ?\n", date_column));
    }
    if range.to.is_some() {
        sql.push_str(&format!("      AND DATE({}) <= ?\n", date_column));
    }
    sql.push_str(&format!(
        "    ORDER BY DATE({}), c.code, m.code, day_of_cycle\n",
        date_column
    ));
    sql
}

pub struct MySqlMovementRepository {
    pool: MySqlPool,
}

impl MySqlMovementRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovementSource for MySqlMovementRepository {
    async fn fetch_rows(
        &self,
        kind: ReportKind,
        scope: &TenantScope,
        range: &DateRange,
    ) -> ApiResult<Vec<MovementRow>> {
        let sql = report_query(kind, range);

        let mut query = sqlx::query_as::<_, MovementRow>(&sql)
            .bind(&scope.company_code)
            .bind(&scope.user_code);
        if let Some(from) = range.from {
            query = query.bind(from);
        }
        if let Some(to) = range.to {
            query = query.bind(to);
        }

        let rows = query.fetch_all(&self.pool).await?;
        log::debug!(
            "Fetched {} rows for {} report (company {})",
            rows.len(),
            kind,
            scope.company_code
        );
        Ok(rows)
    }

    async fn ping(&self) -> ApiResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_without_range() {
        let sql = report_query(ReportKind::Weight, &DateRange::default());
        assert!(sql.contains("FROM weighings w"));
        assert!(!sql.contains(">= ?"));
        assert!(sql.trim_end().ends_with("ORDER BY DATE(w.weighing_date), c.code, m.code, day_of_cycle"));
        assert_eq!(sql.matches('?').count(), 2);
    }

    #[test]
    fn test_query_with_range_adds_placeholders() {
        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 31),
        };
        let sql = report_query(ReportKind::DailyProduction, &range);
        assert!(sql.contains("FROM daily_entries d"));
        assert!(sql.contains("AND DATE(d.entry_date) >= ?"));
        assert!(sql.contains("AND DATE(d.entry_date) <= ?"));
        assert_eq!(sql.matches('?').count(), 4);
    }

    #[test]
    fn test_queries_select_every_row_field() {
        let fields = [
            "movement_id", "center_id", "building_id", "species", "strain", "entry_date",
            "week", "day_of_cycle", "headcount", "batch_weight", "reference_weight",
            "mortality", "feed_consumption", "water_consumption", "eggs_total", "eggs_broken",
        ];
        for base in [WEIGHT_QUERY, DAILY_PRODUCTION_QUERY] {
            for field in fields {
                assert!(base.contains(&format!("AS {}", field)), "{}", field);
            }
        }
    }
}
