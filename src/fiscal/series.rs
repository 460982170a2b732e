//! Gapless series allocation.
//!
//! Must be called inside the checkout's single DB transaction, with the
//! counter lock held through commit: `SELECT ... FOR UPDATE` on
//! `FiscalCounter(tenant)`, increment, write, then insert the
//! `FiscalSeries` row. A locked counter rather than a sequence/IDENTITY
//! column, since a plain sequence can leave gaps on rollback and this
//! invariant must stay gapless even when a checkout aborts partway
//! through.

use chrono::Utc;
use sqlx::{Postgres, Row, Transaction};

use crate::core_types::{FiscalSeriesId, TenantId, TransactionId, UserId};
use crate::error::{CoreError, CoreResult};

use super::models::FiscalSeries;

pub struct FiscalSeriesAllocator;

impl FiscalSeriesAllocator {
    /// Locks `FiscalCounter(tenant)`, increments it, and inserts the new
    /// `FiscalSeries` row - all within the caller's transaction. The caller
    /// is responsible for holding this transaction open until the whole
    /// checkout commits - the counter lock must stay held through that
    /// commit, not be released and re-acquired.
    pub async fn allocate(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: TenantId,
        transaction_id: TransactionId,
        issued_by: UserId,
    ) -> CoreResult<FiscalSeries> {
        let counter = sqlx::query(
            "SELECT current FROM fiscal_counters WHERE tenant_id = $1 FOR UPDATE",
        )
        .bind(tenant_id)
        .fetch_optional(&mut **tx)
        .await?;

        let next_number: i64 = match counter {
            Some(row) => {
                let current: i64 = row.try_get("current")?;
                let next = current + 1;
                sqlx::query("UPDATE fiscal_counters SET current = $1 WHERE tenant_id = $2")
                    .bind(next)
                    .bind(tenant_id)
                    .execute(&mut **tx)
                    .await?;
                next
            }
            None => {
                sqlx::query(
                    "INSERT INTO fiscal_counters (tenant_id, current) VALUES ($1, 1)",
                )
                .bind(tenant_id)
                .execute(&mut **tx)
                .await?;
                1
            }
        };

        let row = sqlx::query(
            "INSERT INTO fiscal_series (tenant_id, series_number, transaction_id, issued_by, issued_at, is_voided) \
             VALUES ($1, $2, $3, $4, $5, false) \
             RETURNING id, tenant_id, series_number, transaction_id, issued_by, issued_at, \
                       is_voided, voided_at, voided_by, void_reason",
        )
        .bind(tenant_id)
        .bind(next_number)
        .bind(transaction_id)
        .bind(issued_by)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        Self::row_to_series(&row)
    }

    /// Marks a series as voided. The number is never reused and the next
    /// allocation continues from the counter.
    pub async fn void(
        pool: &sqlx::PgPool,
        tenant_id: TenantId,
        series_id: FiscalSeriesId,
        voided_by: UserId,
        reason: &str,
    ) -> CoreResult<FiscalSeries> {
        let row = sqlx::query(
            "UPDATE fiscal_series SET is_voided = true, voided_at = $1, voided_by = $2, void_reason = $3 \
             WHERE id = $4 AND tenant_id = $5 AND is_voided = false \
             RETURNING id, tenant_id, series_number, transaction_id, issued_by, issued_at, \
                       is_voided, voided_at, voided_by, void_reason",
        )
        .bind(Utc::now())
        .bind(voided_by)
        .bind(reason)
        .bind(series_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CoreError::conflict(format!("series {series_id} is already voided")))?;

        Self::row_to_series(&row)
    }

    fn row_to_series(row: &sqlx::postgres::PgRow) -> CoreResult<FiscalSeries> {
        Ok(FiscalSeries {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            series_number: row.try_get("series_number")?,
            transaction_id: row.try_get("transaction_id")?,
            issued_by: row.try_get("issued_by")?,
            issued_at: row.try_get("issued_at")?,
            is_voided: row.try_get("is_voided")?,
            voided_at: row.try_get("voided_at")?,
            voided_by: row.try_get("voided_by")?,
            void_reason: row.try_get("void_reason")?,
        })
    }
}
