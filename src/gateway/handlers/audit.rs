//! Filtered audit trail listing. Writes happen inline wherever a
//! domain operation records its own entry - there is no `POST /audit`.

use axum::extract::{Query, State};
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::audit::{AuditEntry, AuditRepository};
use crate::error::CoreResult;
use crate::gateway::state::AppState;
use crate::tenant::TenantCtx;

fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditQuery {
    pub object_type: Option<String>,
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/audit",
    tag = "Audit",
    params(AuditQuery),
    responses((status = 200, description = "Matching audit entries, newest first", body = [AuditEntry]))
)]
pub async fn query(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Query(query): Query<AuditQuery>,
) -> CoreResult<Json<Vec<AuditEntry>>> {
    let entries = AuditRepository::query(
        state.db.pool(),
        ctx.tenant_id(),
        query.object_type.as_deref(),
        query.action.as_deref(),
        query.from,
        query.to,
        query.limit,
    )
    .await?;
    Ok(Json(entries))
}
