use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::{EventId, PriceStageId, RowPricingId, TenantId, ZoneId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ModifierType {
    Percentage,
    FixedAdd,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PriceStage {
    pub id: PriceStageId,
    pub tenant_id: TenantId,
    pub event_id: EventId,
    /// `None` means event-wide; applies after every zone-scoped stage.
    pub zone_id: Option<ZoneId>,
    pub ordinal: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub modifier_type: ModifierType,
    pub modifier_value: Decimal,
    pub active: bool,
}

impl PriceStage {
    pub fn matches_instant(&self, at: DateTime<Utc>) -> bool {
        self.active && self.starts_at <= at && at <= self.ends_at
    }

    pub fn apply(&self, price: Decimal) -> Decimal {
        match self.modifier_type {
            ModifierType::Percentage => price * (Decimal::ONE + self.modifier_value),
            ModifierType::FixedAdd => price + self.modifier_value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RowPricing {
    pub id: RowPricingId,
    pub tenant_id: TenantId,
    pub zone_id: ZoneId,
    pub row: String,
    pub offset: Decimal,
}
