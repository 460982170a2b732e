use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::{
    CustomerId, EventId, SeatId, TenantId, TicketId, TransactionId, TransactionItemId,
    ValidationEventId, ZoneId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Used,
    Expired,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DigitalTicket {
    pub id: TicketId,
    pub tenant_id: TenantId,
    pub transaction_id: TransactionId,
    pub transaction_item_id: TransactionItemId,
    pub event_id: EventId,
    pub customer_id: CustomerId,
    pub zone_id: ZoneId,
    pub seat_id: Option<SeatId>,
    /// `fiscal_series-item_index-sequence`.
    pub ticket_number: String,
    pub sequence: i32,
    /// Base64 authenticated-encryption ciphertext of [`super::crypto::TicketPayload`].
    pub signed_payload: String,
    /// `SHA-256(ticket_number || event_id || customer_id)`.
    pub validation_hash: String,
    pub usage_count: i32,
    pub max_usage: i32,
    pub status: TicketStatus,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub first_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DigitalTicket {
    pub fn is_multi_entry(&self) -> bool {
        self.max_usage > 1
    }

    pub fn remaining_uses(&self) -> i32 {
        (self.max_usage - self.usage_count).max(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ValidationMethod {
    Qr,
    Manual,
    Nfc,
}

/// Multi-entry tickets distinguish `check_in` (increments usage) from
/// `check_out` (logs only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EntryAction {
    CheckIn,
    CheckOut,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationEvent {
    pub id: ValidationEventId,
    pub tenant_id: TenantId,
    pub ticket_id: TicketId,
    pub result: bool,
    pub method: ValidationMethod,
    pub system_id: String,
    pub location: Option<String>,
    pub usage_before: i32,
    pub usage_after: i32,
    pub timestamp: DateTime<Utc>,
}
