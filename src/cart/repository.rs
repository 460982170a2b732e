//! Persistence for `Transaction`/`TransactionItem`. Status transitions are
//! plain `UPDATE`s guarded by the caller's open transaction where the
//! checkout orchestrator needs atomicity.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction as DbTransaction};

use crate::core_types::{CustomerId, EventId, HoldId, SeatId, TenantId, TransactionId, ZoneId};
use crate::error::{CoreError, CoreResult};

use super::models::{Transaction, TransactionItem, TransactionStatus};

pub struct TransactionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_pending(
        &self,
        tenant_id: TenantId,
        event_id: EventId,
        customer_id: CustomerId,
        currency: &str,
        payment_method: &str,
    ) -> CoreResult<Transaction> {
        let row = sqlx::query(
            "INSERT INTO transactions \
                (tenant_id, event_id, customer_id, status, subtotal, tax, total, currency, \
                 payment_method, created_at) \
             VALUES ($1, $2, $3, 'pending', 0, 0, 0, $4, $5, now()) \
             RETURNING id, tenant_id, event_id, customer_id, status, subtotal, tax, total, \
                       currency, payment_method, fiscal_series_id, created_at",
        )
        .bind(tenant_id)
        .bind(event_id)
        .bind(customer_id)
        .bind(currency)
        .bind(payment_method)
        .fetch_one(self.pool)
        .await?;

        Self::row_to_transaction(&row)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_item(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        tenant_id: TenantId,
        transaction_id: TransactionId,
        zone_id: ZoneId,
        seat_id: Option<SeatId>,
        hold_id: HoldId,
        unit_price: Decimal,
        quantity: i32,
    ) -> CoreResult<TransactionItem> {
        let total_price = unit_price * Decimal::from(quantity);
        let row = sqlx::query(
            "INSERT INTO transaction_items \
                (tenant_id, transaction_id, zone_id, seat_id, hold_id, unit_price, quantity, total_price) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, tenant_id, transaction_id, zone_id, seat_id, hold_id, unit_price, quantity, total_price",
        )
        .bind(tenant_id)
        .bind(transaction_id)
        .bind(zone_id)
        .bind(seat_id)
        .bind(hold_id)
        .bind(unit_price)
        .bind(quantity)
        .bind(total_price)
        .fetch_one(&mut **tx)
        .await?;

        Ok(TransactionItem {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            transaction_id: row.try_get("transaction_id")?,
            zone_id: row.try_get("zone_id")?,
            seat_id: row.try_get("seat_id")?,
            hold_id: row.try_get("hold_id")?,
            unit_price: row.try_get("unit_price")?,
            quantity: row.try_get("quantity")?,
            total_price: row.try_get("total_price")?,
        })
    }

    pub async fn set_totals(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        tenant_id: TenantId,
        transaction_id: TransactionId,
        subtotal: Decimal,
        tax: Decimal,
        total: Decimal,
    ) -> CoreResult<()> {
        sqlx::query(
            "UPDATE transactions SET subtotal = $1, tax = $2, total = $3 \
             WHERE id = $4 AND tenant_id = $5",
        )
        .bind(subtotal)
        .bind(tax)
        .bind(total)
        .bind(transaction_id)
        .bind(tenant_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Moves the transaction to `completed` and records its fiscal series,
    /// inside the caller's checkout transaction.
    pub async fn complete(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        tenant_id: TenantId,
        transaction_id: TransactionId,
        fiscal_series_id: crate::core_types::FiscalSeriesId,
    ) -> CoreResult<Transaction> {
        let row = sqlx::query(
            "UPDATE transactions SET status = 'completed', fiscal_series_id = $1 \
             WHERE id = $2 AND tenant_id = $3 AND status IN ('pending', 'reserved') \
             RETURNING id, tenant_id, event_id, customer_id, status, subtotal, tax, total, \
                       currency, payment_method, fiscal_series_id, created_at",
        )
        .bind(fiscal_series_id)
        .bind(transaction_id)
        .bind(tenant_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| CoreError::internal(format!("transaction {transaction_id} not in a completable state")))?;

        Self::row_to_transaction(&row)
    }

    pub async fn mark_status(
        &self,
        tenant_id: TenantId,
        transaction_id: TransactionId,
        status: TransactionStatus,
    ) -> CoreResult<Transaction> {
        let row = sqlx::query(
            "UPDATE transactions SET status = $1 WHERE id = $2 AND tenant_id = $3 \
             RETURNING id, tenant_id, event_id, customer_id, status, subtotal, tax, total, \
                       currency, payment_method, fiscal_series_id, created_at",
        )
        .bind(status)
        .bind(transaction_id)
        .bind(tenant_id)
        .fetch_one(self.pool)
        .await?;

        Self::row_to_transaction(&row)
    }

    /// Same transition as [`Self::mark_status`], bound to the caller's open
    /// transaction so the status change commits atomically with whatever
    /// else that transaction records (an audit entry, for instance).
    pub async fn mark_status_in_tx(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        tenant_id: TenantId,
        transaction_id: TransactionId,
        status: TransactionStatus,
    ) -> CoreResult<Transaction> {
        let row = sqlx::query(
            "UPDATE transactions SET status = $1 WHERE id = $2 AND tenant_id = $3 \
             RETURNING id, tenant_id, event_id, customer_id, status, subtotal, tax, total, \
                       currency, payment_method, fiscal_series_id, created_at",
        )
        .bind(status)
        .bind(transaction_id)
        .bind(tenant_id)
        .fetch_one(&mut **tx)
        .await?;

        Self::row_to_transaction(&row)
    }

    pub async fn find(&self, tenant_id: TenantId, transaction_id: TransactionId) -> CoreResult<Transaction> {
        let row = sqlx::query(
            "SELECT id, tenant_id, event_id, customer_id, status, subtotal, tax, total, \
                    currency, payment_method, fiscal_series_id, created_at \
             FROM transactions WHERE id = $1 AND tenant_id = $2",
        )
        .bind(transaction_id)
        .bind(tenant_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("transaction {transaction_id}")))?;

        Self::row_to_transaction(&row)
    }

    /// Reserved transactions whose deposit predates `older_than`, used by
    /// the reservation sweeper to find stale partial payments.
    pub async fn stale_reserved(&self, tenant_id: TenantId, older_than: chrono::DateTime<chrono::Utc>) -> CoreResult<Vec<Transaction>> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, event_id, customer_id, status, subtotal, tax, total, \
                    currency, payment_method, fiscal_series_id, created_at \
             FROM transactions \
             WHERE tenant_id = $1 AND status = 'reserved' AND created_at < $2",
        )
        .bind(tenant_id)
        .bind(older_than)
        .fetch_all(self.pool)
        .await?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    pub async fn items_for(&self, tenant_id: TenantId, transaction_id: TransactionId) -> CoreResult<Vec<TransactionItem>> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, transaction_id, zone_id, seat_id, hold_id, unit_price, quantity, total_price \
             FROM transaction_items WHERE tenant_id = $1 AND transaction_id = $2 ORDER BY id",
        )
        .bind(tenant_id)
        .bind(transaction_id)
        .fetch_all(self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(TransactionItem {
                    id: row.try_get("id")?,
                    tenant_id: row.try_get("tenant_id")?,
                    transaction_id: row.try_get("transaction_id")?,
                    zone_id: row.try_get("zone_id")?,
                    seat_id: row.try_get("seat_id")?,
                    hold_id: row.try_get("hold_id")?,
                    unit_price: row.try_get("unit_price")?,
                    quantity: row.try_get("quantity")?,
                    total_price: row.try_get("total_price")?,
                })
            })
            .collect()
    }

    fn row_to_transaction(row: &sqlx::postgres::PgRow) -> CoreResult<Transaction> {
        Ok(Transaction {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            event_id: row.try_get("event_id")?,
            customer_id: row.try_get("customer_id")?,
            status: row.try_get("status")?,
            subtotal: row.try_get("subtotal")?,
            tax: row.try_get("tax")?,
            total: row.try_get("total")?,
            currency: row.try_get("currency")?,
            payment_method: row.try_get("payment_method")?,
            fiscal_series_id: row.try_get("fiscal_series_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
