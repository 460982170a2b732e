use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::{
    CustomerId, EventId, FiscalSeriesId, HoldId, SeatId, TenantId, TransactionId, TransactionItemId, ZoneId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Reserved,
    Completed,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: TransactionId,
    pub tenant_id: TenantId,
    pub event_id: EventId,
    pub customer_id: CustomerId,
    pub status: TransactionStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub payment_method: String,
    /// One-to-one once `completed`; the owning direction is
    /// `FiscalSeries.transaction_id` - this is a lookup-only
    /// back-reference, never written directly.
    pub fiscal_series_id: Option<FiscalSeriesId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionItem {
    pub id: TransactionItemId,
    pub tenant_id: TenantId,
    pub transaction_id: TransactionId,
    pub zone_id: ZoneId,
    pub seat_id: Option<SeatId>,
    /// The hold this item was priced from. Kept past checkout so the
    /// reserved/partial-payment path can look up which hold to finalize
    /// without threading it through a side channel.
    pub hold_id: HoldId,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
}
