//! No update path, no delete path - only `record` and reads. `record`
//! takes the caller's open transaction so the audit row commits atomically
//! with the change it describes.

use chrono::Utc;
use serde_json::Value as Json;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::core_types::{FiscalSeriesId, TenantId, UserId};
use crate::error::CoreResult;

use super::models::AuditEntry;

pub struct AuditRepository;

impl AuditRepository {
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: TenantId,
        user_id: Option<UserId>,
        action: &str,
        object_type: &str,
        object_id: &str,
        fiscal_series_id: Option<FiscalSeriesId>,
        old_value: Option<Json>,
        new_value: Option<Json>,
        description: &str,
    ) -> CoreResult<AuditEntry> {
        let row = sqlx::query(
            "INSERT INTO audit_entries \
                (tenant_id, user_id, action, object_type, object_id, fiscal_series_id, \
                 timestamp, old_value, new_value, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING id, tenant_id, user_id, action, object_type, object_id, \
                       fiscal_series_id, timestamp, old_value, new_value, description",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(action)
        .bind(object_type)
        .bind(object_id)
        .bind(fiscal_series_id)
        .bind(Utc::now())
        .bind(old_value)
        .bind(new_value)
        .bind(description)
        .fetch_one(&mut **tx)
        .await?;

        Self::row_to_entry(&row)
    }

    pub async fn for_object(
        pool: &PgPool,
        tenant_id: TenantId,
        object_type: &str,
        object_id: &str,
    ) -> CoreResult<Vec<AuditEntry>> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, user_id, action, object_type, object_id, \
                    fiscal_series_id, timestamp, old_value, new_value, description \
             FROM audit_entries \
             WHERE tenant_id = $1 AND object_type = $2 AND object_id = $3 \
             ORDER BY timestamp ASC, id ASC",
        )
        .bind(tenant_id)
        .bind(object_type)
        .bind(object_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// Filtered listing for `GET /audit?filters…`: any of `object_type`,
    /// `action`, or a `[from, to]` window may be omitted, in which case that
    /// predicate is skipped rather than matched literally against NULL.
    pub async fn query(
        pool: &PgPool,
        tenant_id: TenantId,
        object_type: Option<&str>,
        action: Option<&str>,
        from: Option<chrono::DateTime<Utc>>,
        to: Option<chrono::DateTime<Utc>>,
        limit: i64,
    ) -> CoreResult<Vec<AuditEntry>> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, user_id, action, object_type, object_id, \
                    fiscal_series_id, timestamp, old_value, new_value, description \
             FROM audit_entries \
             WHERE tenant_id = $1 \
               AND ($2::text IS NULL OR object_type = $2) \
               AND ($3::text IS NULL OR action = $3) \
               AND ($4::timestamptz IS NULL OR timestamp >= $4) \
               AND ($5::timestamptz IS NULL OR timestamp <= $5) \
             ORDER BY timestamp DESC, id DESC \
             LIMIT $6",
        )
        .bind(tenant_id)
        .bind(object_type)
        .bind(action)
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    fn row_to_entry(row: &sqlx::postgres::PgRow) -> CoreResult<AuditEntry> {
        Ok(AuditEntry {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            user_id: row.try_get("user_id")?,
            action: row.try_get("action")?,
            object_type: row.try_get("object_type")?,
            object_id: row.try_get("object_id")?,
            fiscal_series_id: row.try_get("fiscal_series_id")?,
            timestamp: row.try_get("timestamp")?,
            old_value: row.try_get("old_value")?,
            new_value: row.try_get("new_value")?,
            description: row.try_get("description")?,
        })
    }
}
