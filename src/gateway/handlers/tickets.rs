//! Ticket validation at the door. Issuance has no endpoint of its
//! own - tickets are only ever minted as a side effect of checkout.

use axum::extract::State;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::CoreResult;
use crate::gateway::state::AppState;
use crate::tenant::TenantCtx;
use crate::tickets::{EntryAction, TicketValidator, ValidationMethod, ValidationOutcome};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateRequest {
    pub identifier: String,
    pub method: ValidationMethod,
    pub system_id: String,
    pub location: Option<String>,
    #[serde(default = "default_mark_used")]
    pub mark_used: bool,
    pub action: Option<EntryAction>,
}

fn default_mark_used() -> bool {
    true
}

#[utoipa::path(
    post,
    path = "/api/v1/tickets/validate",
    tag = "Tickets",
    request_body = ValidateRequest,
    responses((status = 200, description = "Validation outcome", body = ValidationOutcome))
)]
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<ValidateRequest>,
) -> CoreResult<Json<ValidationOutcome>> {
    let validator = TicketValidator::new(state.db.pool(), &state.config.ticket_encryption_key);
    let outcome = validator
        .validate(
            ctx.tenant_id(),
            &req.identifier,
            req.method,
            &req.system_id,
            req.location.as_deref(),
            req.mark_used,
            req.action,
        )
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkValidateRequest {
    pub identifiers: Vec<String>,
    pub method: ValidationMethod,
    pub system_id: String,
    #[serde(default = "default_mark_used")]
    pub mark_used: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/tickets/validate/bulk",
    tag = "Tickets",
    request_body = BulkValidateRequest,
    responses((status = 200, description = "Up to 100 validation outcomes", body = [ValidationOutcome]))
)]
pub async fn bulk_validate(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<BulkValidateRequest>,
) -> CoreResult<Json<Vec<ValidationOutcome>>> {
    let validator = TicketValidator::new(state.db.pool(), &state.config.ticket_encryption_key);
    let outcomes = validator
        .bulk_validate(ctx.tenant_id(), &req.identifiers, req.method, &req.system_id, req.mark_used)
        .await?;
    Ok(Json(outcomes))
}
