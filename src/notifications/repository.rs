//! Outbox writes. `enqueue` returns as soon as the row is persisted - it
//! never waits on deliverability; `mark_sent`/`mark_failed` are called by
//! the external worker, not by the core.

use sqlx::{PgPool, Row};

use crate::core_types::{CustomerId, OutboxEntryId, TenantId, TransactionId};
use crate::error::CoreResult;

use super::models::{Channel, OutboxEntry};

pub struct OutboxRepository<'a> {
    pool: &'a PgPool,
}

pub struct OutboxInput<'a> {
    pub template_id: Option<&'a str>,
    pub channel: Channel,
    pub recipient: &'a str,
    pub subject: &'a str,
    pub rendered_body: &'a str,
    pub customer_id: Option<CustomerId>,
    pub transaction_id: Option<TransactionId>,
}

impl<'a> OutboxRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn enqueue(&self, tenant_id: TenantId, input: OutboxInput<'_>) -> CoreResult<OutboxEntry> {
        let row = sqlx::query(
            "INSERT INTO notification_outbox \
                (tenant_id, template_id, channel, recipient, subject, rendered_body, status, \
                 customer_id, transaction_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8, now()) \
             RETURNING id, tenant_id, template_id, channel, recipient, subject, rendered_body, \
                       status, customer_id, transaction_id, task_id, error_message, created_at, sent_at",
        )
        .bind(tenant_id)
        .bind(input.template_id)
        .bind(input.channel)
        .bind(input.recipient)
        .bind(input.subject)
        .bind(input.rendered_body)
        .bind(input.customer_id)
        .bind(input.transaction_id)
        .fetch_one(self.pool)
        .await?;

        Self::row_to_entry(&row)
    }

    /// Claimed and flipped by the external delivery worker, never by the
    /// core.
    pub async fn mark_sent(&self, tenant_id: TenantId, id: OutboxEntryId) -> CoreResult<()> {
        sqlx::query(
            "UPDATE notification_outbox SET status = 'sent', sent_at = now() \
             WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(&self, tenant_id: TenantId, id: OutboxEntryId, reason: &str) -> CoreResult<()> {
        sqlx::query(
            "UPDATE notification_outbox SET status = 'failed', error_message = $1 \
             WHERE id = $2 AND tenant_id = $3",
        )
        .bind(reason)
        .bind(id)
        .bind(tenant_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn pending(&self, tenant_id: TenantId, limit: i64) -> CoreResult<Vec<OutboxEntry>> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, template_id, channel, recipient, subject, rendered_body, \
                    status, customer_id, transaction_id, task_id, error_message, created_at, sent_at \
             FROM notification_outbox \
             WHERE tenant_id = $1 AND status = 'pending' \
             ORDER BY created_at ASC LIMIT $2",
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    fn row_to_entry(row: &sqlx::postgres::PgRow) -> CoreResult<OutboxEntry> {
        Ok(OutboxEntry {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            template_id: row.try_get("template_id")?,
            channel: row.try_get("channel")?,
            recipient: row.try_get("recipient")?,
            subject: row.try_get("subject")?,
            rendered_body: row.try_get("rendered_body")?,
            status: row.try_get("status")?,
            customer_id: row.try_get("customer_id")?,
            transaction_id: row.try_get("transaction_id")?,
            task_id: row.try_get("task_id")?,
            error_message: row.try_get("error_message")?,
            created_at: row.try_get("created_at")?,
            sent_at: row.try_get("sent_at")?,
        })
    }
}
