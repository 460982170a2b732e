use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use utoipa::ToSchema;

use crate::core_types::{AuditEntryId, FiscalSeriesId, TenantId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub tenant_id: TenantId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub object_type: String,
    pub object_id: String,
    pub fiscal_series_id: Option<FiscalSeriesId>,
    pub timestamp: DateTime<Utc>,
    pub old_value: Option<Json>,
    pub new_value: Option<Json>,
    pub description: String,
}
