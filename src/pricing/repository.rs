//! Persistence for price stages and row pricing, enforcing the
//! no-overlapping-windows-per-scope invariant at write time rather than
//! leaving it to application-level discipline.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use crate::core_types::{EventId, RowPricingId, TenantId, ZoneId};
use crate::error::{CoreError, CoreResult};
use crate::tenant::TenantCtx;

use super::models::{ModifierType, PriceStage, RowPricing};

pub struct PricingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PricingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_stage(
        &self,
        ctx: &TenantCtx,
        event_id: EventId,
        zone_id: Option<ZoneId>,
        ordinal: i32,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        modifier_type: ModifierType,
        modifier_value: Decimal,
    ) -> CoreResult<PriceStage> {
        if starts_at >= ends_at {
            return Err(CoreError::validation("stage window start must precede end"));
        }

        let overlap = sqlx::query(
            "SELECT 1 FROM price_stages \
             WHERE tenant_id = $1 AND event_id = $2 \
               AND zone_id IS NOT DISTINCT FROM $3 \
               AND active \
               AND starts_at <= $5 AND ends_at >= $4",
        )
        .bind(ctx.tenant_id())
        .bind(event_id)
        .bind(zone_id)
        .bind(starts_at)
        .bind(ends_at)
        .fetch_optional(self.pool)
        .await?;
        if overlap.is_some() {
            return Err(CoreError::validation(
                "overlapping price stage in the same scope",
            ));
        }

        let row = sqlx::query(
            "INSERT INTO price_stages \
                (tenant_id, event_id, zone_id, ordinal, starts_at, ends_at, modifier_type, modifier_value, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, true) \
             RETURNING id, tenant_id, event_id, zone_id, ordinal, starts_at, ends_at, modifier_type, modifier_value, active",
        )
        .bind(ctx.tenant_id())
        .bind(event_id)
        .bind(zone_id)
        .bind(ordinal)
        .bind(starts_at)
        .bind(ends_at)
        .bind(modifier_type)
        .bind(modifier_value)
        .fetch_one(self.pool)
        .await?;

        Self::row_to_stage(&row)
    }

    /// All stages in scope for a zone: zone-scoped stages for this zone plus
    /// event-wide stages for its event. Filtering by instant happens in
    /// [`super::resolver::resolve_price`].
    pub async fn stages_in_scope(
        &self,
        ctx: &TenantCtx,
        event_id: EventId,
        zone_id: ZoneId,
    ) -> CoreResult<Vec<PriceStage>> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, event_id, zone_id, ordinal, starts_at, ends_at, modifier_type, modifier_value, active \
             FROM price_stages \
             WHERE tenant_id = $1 AND event_id = $2 AND (zone_id = $3 OR zone_id IS NULL)",
        )
        .bind(ctx.tenant_id())
        .bind(event_id)
        .bind(zone_id)
        .fetch_all(self.pool)
        .await?;

        rows.iter().map(Self::row_to_stage).collect()
    }

    /// Creates a row offset. Unique per `(zone, row)`; a
    /// second insert for the same pair is a constraint violation surfaced
    /// as [`CoreError::Internal`] by the `sqlx::Error` conversion, since
    /// the uniqueness is enforced by the schema, not checked here.
    pub async fn create_row_pricing(
        &self,
        ctx: &TenantCtx,
        zone_id: ZoneId,
        row: &str,
        offset: Decimal,
    ) -> CoreResult<RowPricing> {
        let existing = self.row_pricing_for(ctx, zone_id, row).await?;
        if existing.is_some() {
            return Err(CoreError::validation(format!(
                "row pricing for zone {zone_id} row {row} already exists"
            )));
        }

        let record = sqlx::query(
            "INSERT INTO row_pricing (tenant_id, zone_id, row, offset_amount) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, tenant_id, zone_id, row, offset_amount",
        )
        .bind(ctx.tenant_id())
        .bind(zone_id)
        .bind(row)
        .bind(offset)
        .fetch_one(self.pool)
        .await?;

        Ok(RowPricing {
            id: record.try_get::<RowPricingId, _>("id")?,
            tenant_id: record.try_get::<TenantId, _>("tenant_id")?,
            zone_id: record.try_get::<ZoneId, _>("zone_id")?,
            row: record.try_get("row")?,
            offset: record.try_get("offset_amount")?,
        })
    }

    pub async fn row_pricing_for(
        &self,
        ctx: &TenantCtx,
        zone_id: ZoneId,
        row: &str,
    ) -> CoreResult<Option<RowPricing>> {
        let record = sqlx::query(
            "SELECT id, tenant_id, zone_id, row, offset_amount FROM row_pricing \
             WHERE tenant_id = $1 AND zone_id = $2 AND row = $3",
        )
        .bind(ctx.tenant_id())
        .bind(zone_id)
        .bind(row)
        .fetch_optional(self.pool)
        .await?;

        record
            .map(|r| {
                Ok(RowPricing {
                    id: r.try_get::<RowPricingId, _>("id")?,
                    tenant_id: r.try_get::<TenantId, _>("tenant_id")?,
                    zone_id: r.try_get::<ZoneId, _>("zone_id")?,
                    row: r.try_get("row")?,
                    offset: r.try_get("offset_amount")?,
                })
            })
            .transpose()
    }

    fn row_to_stage(row: &sqlx::postgres::PgRow) -> CoreResult<PriceStage> {
        Ok(PriceStage {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            event_id: row.try_get("event_id")?,
            zone_id: row.try_get("zone_id")?,
            ordinal: row.try_get("ordinal")?,
            starts_at: row.try_get("starts_at")?,
            ends_at: row.try_get("ends_at")?,
            modifier_type: row.try_get("modifier_type")?,
            modifier_value: row.try_get("modifier_value")?,
            active: row.try_get("active")?,
        })
    }
}
