use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::{CustomerId, OutboxEntryId, TenantId, TransactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Whatsapp,
}

/// Matches `NotificationPreference`'s boolean columns - used to decide
/// whether an entry should be enqueued at all before it ever reaches the
/// outbox table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum NotificationCategory {
    PurchaseConfirmation,
    PaymentReminder,
    EventReminder,
    Promotional,
    SystemUpdates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OutboxEntry {
    pub id: OutboxEntryId,
    pub tenant_id: TenantId,
    pub template_id: Option<String>,
    pub channel: Channel,
    pub recipient: String,
    pub subject: String,
    pub rendered_body: String,
    pub status: OutboxStatus,
    pub customer_id: Option<CustomerId>,
    pub transaction_id: Option<TransactionId>,
    pub task_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}
