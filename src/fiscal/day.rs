//! Fiscal-day lifecycle: lazily opened per `(tenant, user,
//! date-in-Caracas)`, closed at most once.

use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Row};

use crate::core_types::{FiscalDayId, TenantId, UserId};
use crate::error::{CoreError, CoreResult};

use super::models::{FiscalDay, ReportType};
use super::reports::ReportGenerator;

pub struct FiscalDayRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FiscalDayRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Finds today's open day for this user or opens one. A closed day
    /// for this date never re-opens for the same user; the next sale
    /// starts a new row for "today" once the Caracas calendar date has
    /// actually advanced.
    pub async fn find_or_open(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        fiscal_date: NaiveDate,
    ) -> CoreResult<FiscalDay> {
        if let Some(row) = sqlx::query(
            "SELECT id, tenant_id, user_id, fiscal_date, opened_at, closed_at, z_report_id FROM fiscal_days \
             WHERE tenant_id = $1 AND user_id = $2 AND fiscal_date = $3",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(fiscal_date)
        .fetch_optional(self.pool)
        .await?
        {
            return Self::row_to_day(&row);
        }

        let row = sqlx::query(
            "INSERT INTO fiscal_days (tenant_id, user_id, fiscal_date, opened_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, tenant_id, user_id, fiscal_date, opened_at, closed_at, z_report_id",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(fiscal_date)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Self::row_to_day(&row)
    }

    /// `AccessDenied` if a sale is attempted against an already-closed day
    /// for this user.
    pub async fn assert_open_for_sale(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        fiscal_date: NaiveDate,
    ) -> CoreResult<FiscalDay> {
        let day = self.find_or_open(tenant_id, user_id, fiscal_date).await?;
        if day.is_closed() {
            return Err(CoreError::access_denied("fiscal day closed"));
        }
        Ok(day)
    }

    /// Locks the day row while closing to prevent a parallel double-close.
    pub async fn close(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        fiscal_date: NaiveDate,
    ) -> CoreResult<FiscalDay> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, closed_at FROM fiscal_days \
             WHERE tenant_id = $1 AND user_id = $2 AND fiscal_date = $3 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(fiscal_date)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::not_found("no open fiscal day for this user and date"))?;

        let day_id: FiscalDayId = row.try_get("id")?;
        let already_closed: Option<chrono::DateTime<Utc>> = row.try_get("closed_at")?;
        if already_closed.is_some() {
            return Err(CoreError::conflict("fiscal day is already closed"));
        }

        // Z report is generated under the same row lock so a concurrent
        // close can never produce two reports for one fiscal day.
        let z_report =
            ReportGenerator::generate_locked(&mut tx, tenant_id, Some(user_id), fiscal_date, ReportType::Z).await?;

        let updated = sqlx::query(
            "UPDATE fiscal_days SET closed_at = $1, z_report_id = $2 WHERE id = $3 \
             RETURNING id, tenant_id, user_id, fiscal_date, opened_at, closed_at, z_report_id",
        )
        .bind(Utc::now())
        .bind(z_report.id)
        .bind(day_id)
        .fetch_one(&mut *tx)
        .await?;

        let closed = Self::row_to_day(&updated)?;
        tx.commit().await?;
        Ok(closed)
    }

    fn row_to_day(row: &sqlx::postgres::PgRow) -> CoreResult<FiscalDay> {
        Ok(FiscalDay {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            user_id: row.try_get("user_id")?,
            fiscal_date: row.try_get("fiscal_date")?,
            opened_at: row.try_get("opened_at")?,
            closed_at: row.try_get("closed_at")?,
            z_report_id: row.try_get("z_report_id")?,
        })
    }
}
