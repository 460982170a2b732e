//! X/Z report generation. X reports are snapshots and do
//! not close anything; Z reports are produced as part of closing a fiscal
//! day (see [`super::day::FiscalDayRepository::close`] for the lock that
//! guards against a parallel double-close).

use chrono::{NaiveDate, Utc};
use serde_json::json;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::core_types::{TenantId, UserId};
use crate::error::CoreResult;

use super::models::{FiscalReport, ReportType};

const AGGREGATE_QUERY: &str = "SELECT \
        COUNT(*) AS tx_count, \
        COALESCE(SUM(t.total), 0) AS total_amount, \
        COALESCE(SUM(t.tax), 0) AS total_tax, \
        MIN(fs.series_number) AS first_series, \
        MAX(fs.series_number) AS last_series \
     FROM transactions t \
     JOIN fiscal_series fs ON fs.transaction_id = t.id \
     WHERE t.tenant_id = $1 \
       AND t.status = 'completed' \
       AND ($2::uuid IS NULL OR fs.issued_by = $2) \
       AND (fs.issued_at AT TIME ZONE 'America/Caracas')::date = $3";

const BREAKDOWN_QUERY: &str = "SELECT payment_method, COUNT(*) AS cnt, COALESCE(SUM(total), 0) AS sum \
     FROM transactions t \
     JOIN fiscal_series fs ON fs.transaction_id = t.id \
     WHERE t.tenant_id = $1 AND t.status = 'completed' \
       AND ($2::uuid IS NULL OR fs.issued_by = $2) \
       AND (fs.issued_at AT TIME ZONE 'America/Caracas')::date = $3 \
     GROUP BY payment_method";

const INSERT_REPORT: &str = "INSERT INTO fiscal_reports \
        (tenant_id, report_type, report_number, fiscal_date, user_id, \
         transaction_count, total_amount, total_tax, first_series_number, last_series_number, report_data) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
     RETURNING id, tenant_id, report_type, report_number, fiscal_date, user_id, \
               transaction_count, total_amount, total_tax, first_series_number, last_series_number, report_data";

pub struct ReportGenerator<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Aggregates completed transactions in `(tenant, user?, date)` scope:
    /// count, sum, tax sum, payment-method breakdown, first/last series.
    /// `user_id = None` aggregates across all users for the tenant+date
    /// (used by Z at end of a shared fiscal date, X narrows to one user).
    pub async fn generate(
        &self,
        tenant_id: TenantId,
        user_id: Option<UserId>,
        fiscal_date: NaiveDate,
        report_type: ReportType,
    ) -> CoreResult<FiscalReport> {
        let row = sqlx::query(AGGREGATE_QUERY)
            .bind(tenant_id)
            .bind(user_id)
            .bind(fiscal_date)
            .fetch_one(self.pool)
            .await?;

        let breakdown = sqlx::query(BREAKDOWN_QUERY)
            .bind(tenant_id)
            .bind(user_id)
            .bind(fiscal_date)
            .fetch_all(self.pool)
            .await?;

        let payment_breakdown = Self::payment_breakdown(&breakdown);
        let next_number = self.next_report_number(tenant_id, report_type).await?;

        let report_row = sqlx::query(INSERT_REPORT)
            .bind(tenant_id)
            .bind(report_type)
            .bind(next_number)
            .bind(fiscal_date)
            .bind(user_id)
            .bind(row.try_get::<i64, _>("tx_count")?)
            .bind(row.try_get::<rust_decimal::Decimal, _>("total_amount")?)
            .bind(row.try_get::<rust_decimal::Decimal, _>("total_tax")?)
            .bind(row.try_get::<Option<i64>, _>("first_series")?)
            .bind(row.try_get::<Option<i64>, _>("last_series")?)
            .bind(json!({ "payment_breakdown": payment_breakdown, "generated_at": Utc::now().to_rfc3339() }))
            .fetch_one(self.pool)
            .await?;

        Self::row_to_report(&report_row)
    }

    /// Same aggregation as [`Self::generate`], bound to the caller's open
    /// transaction so the Z report commits atomically with the day close
    /// that produces it - the counter-style lock on `fiscal_days` must stay
    /// held through both the aggregate read and the report insert.
    pub async fn generate_locked(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: TenantId,
        user_id: Option<UserId>,
        fiscal_date: NaiveDate,
        report_type: ReportType,
    ) -> CoreResult<FiscalReport> {
        let row = sqlx::query(AGGREGATE_QUERY)
            .bind(tenant_id)
            .bind(user_id)
            .bind(fiscal_date)
            .fetch_one(&mut **tx)
            .await?;

        let breakdown = sqlx::query(BREAKDOWN_QUERY)
            .bind(tenant_id)
            .bind(user_id)
            .bind(fiscal_date)
            .fetch_all(&mut **tx)
            .await?;

        let payment_breakdown = Self::payment_breakdown(&breakdown);

        let next_row = sqlx::query(
            "SELECT COALESCE(MAX(report_number), 0) + 1 AS next \
             FROM fiscal_reports WHERE tenant_id = $1 AND report_type = $2",
        )
        .bind(tenant_id)
        .bind(report_type)
        .fetch_one(&mut **tx)
        .await?;
        let next_number: i64 = next_row.try_get("next")?;

        let report_row = sqlx::query(INSERT_REPORT)
            .bind(tenant_id)
            .bind(report_type)
            .bind(next_number)
            .bind(fiscal_date)
            .bind(user_id)
            .bind(row.try_get::<i64, _>("tx_count")?)
            .bind(row.try_get::<rust_decimal::Decimal, _>("total_amount")?)
            .bind(row.try_get::<rust_decimal::Decimal, _>("total_tax")?)
            .bind(row.try_get::<Option<i64>, _>("first_series")?)
            .bind(row.try_get::<Option<i64>, _>("last_series")?)
            .bind(json!({ "payment_breakdown": payment_breakdown, "generated_at": Utc::now().to_rfc3339() }))
            .fetch_one(&mut **tx)
            .await?;

        Self::row_to_report(&report_row)
    }

    fn payment_breakdown(breakdown: &[sqlx::postgres::PgRow]) -> Vec<serde_json::Value> {
        breakdown
            .iter()
            .map(|r| {
                json!({
                    "method": r.try_get::<String, _>("payment_method").unwrap_or_default(),
                    "count": r.try_get::<i64, _>("cnt").unwrap_or(0),
                    "sum": r.try_get::<rust_decimal::Decimal, _>("sum").unwrap_or_default().to_string(),
                })
            })
            .collect()
    }

    async fn next_report_number(&self, tenant_id: TenantId, report_type: ReportType) -> CoreResult<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(MAX(report_number), 0) + 1 AS next \
             FROM fiscal_reports WHERE tenant_id = $1 AND report_type = $2",
        )
        .bind(tenant_id)
        .bind(report_type)
        .fetch_one(self.pool)
        .await?;
        Ok(row.try_get("next")?)
    }

    fn row_to_report(row: &sqlx::postgres::PgRow) -> CoreResult<FiscalReport> {
        Ok(FiscalReport {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            report_type: row.try_get("report_type")?,
            report_number: row.try_get("report_number")?,
            fiscal_date: row.try_get("fiscal_date")?,
            user_id: row.try_get("user_id")?,
            transaction_count: row.try_get("transaction_count")?,
            total_amount: row.try_get("total_amount")?,
            total_tax: row.try_get("total_tax")?,
            first_series_number: row.try_get("first_series_number")?,
            last_series_number: row.try_get("last_series_number")?,
            report_data: row.try_get("report_data")?,
        })
    }
}
