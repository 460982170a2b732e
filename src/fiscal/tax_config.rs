//! Tax config persistence and scope resolution: event-scoped
//! configs override tenant-scoped ones sharing the same `name`, the merge
//! happening here rather than in [`super::tax::TaxEngine`] so the engine
//! stays a pure function over an already-resolved list.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use crate::core_types::{EventId, TaxConfigId, TenantId};
use crate::error::CoreResult;

use super::models::{TaxConfig, TaxType};

pub struct TaxConfigRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TaxConfigRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        tenant_id: TenantId,
        event_id: Option<EventId>,
        name: &str,
        tax_type: TaxType,
        rate: Decimal,
        fixed_amount: Decimal,
        effective_from: DateTime<Utc>,
        effective_until: Option<DateTime<Utc>>,
    ) -> CoreResult<TaxConfig> {
        let row = sqlx::query(
            "INSERT INTO tax_configs \
                (tenant_id, event_id, name, tax_type, rate, fixed_amount, active, effective_from, effective_until) \
             VALUES ($1, $2, $3, $4, $5, $6, true, $7, $8) \
             RETURNING id, tenant_id, event_id, name, tax_type, rate, fixed_amount, active, effective_from, effective_until",
        )
        .bind(tenant_id)
        .bind(event_id)
        .bind(name)
        .bind(tax_type)
        .bind(rate)
        .bind(fixed_amount)
        .bind(effective_from)
        .bind(effective_until)
        .fetch_one(self.pool)
        .await?;

        Self::row_to_config(&row)
    }

    /// All configs in scope for an event, with an event-scoped config
    /// shadowing a tenant-scoped one of the same name. Time-window and
    /// `active` filtering happens in [`super::tax::TaxEngine::calculate`].
    pub async fn configs_for_event(&self, tenant_id: TenantId, event_id: EventId) -> CoreResult<Vec<TaxConfig>> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, event_id, name, tax_type, rate, fixed_amount, active, effective_from, effective_until \
             FROM tax_configs \
             WHERE tenant_id = $1 AND (event_id = $2 OR event_id IS NULL)",
        )
        .bind(tenant_id)
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        let mut configs: Vec<TaxConfig> = rows.iter().map(Self::row_to_config).collect::<CoreResult<_>>()?;

        // Drop any tenant-wide config whose name is shadowed by an
        // event-scoped one.
        let shadowed: std::collections::HashSet<String> = configs
            .iter()
            .filter(|c| c.event_id.is_some())
            .map(|c| c.name.clone())
            .collect();
        configs.retain(|c| c.event_id.is_some() || !shadowed.contains(&c.name));

        Ok(configs)
    }

    pub async fn deactivate(&self, tenant_id: TenantId, id: TaxConfigId) -> CoreResult<()> {
        sqlx::query("UPDATE tax_configs SET active = false WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    fn row_to_config(row: &sqlx::postgres::PgRow) -> CoreResult<TaxConfig> {
        Ok(TaxConfig {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            event_id: row.try_get("event_id")?,
            name: row.try_get("name")?,
            tax_type: row.try_get("tax_type")?,
            rate: row.try_get("rate")?,
            fixed_amount: row.try_get("fixed_amount")?,
            active: row.try_get("active")?,
            effective_from: row.try_get("effective_from")?,
            effective_until: row.try_get("effective_until")?,
        })
    }
}
