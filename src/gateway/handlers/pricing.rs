//! Price stage and row-offset management. Resolution itself happens
//! inline during checkout, not through an endpoint here.

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::core_types::{EventId, ZoneId};
use crate::error::CoreResult;
use crate::gateway::state::AppState;
use crate::pricing::{ModifierType, PriceStage, PricingRepository, RowPricing};
use crate::tenant::TenantCtx;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStageRequest {
    pub event_id: EventId,
    pub zone_id: Option<ZoneId>,
    pub ordinal: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub modifier_type: ModifierType,
    pub modifier_value: Decimal,
}

#[utoipa::path(
    post,
    path = "/api/v1/price-stages",
    tag = "Pricing",
    request_body = CreateStageRequest,
    responses((status = 200, description = "Price stage created", body = PriceStage))
)]
pub async fn create_stage(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<CreateStageRequest>,
) -> CoreResult<Json<PriceStage>> {
    let repo = PricingRepository::new(state.db.pool());
    let stage = repo
        .create_stage(
            &ctx,
            req.event_id,
            req.zone_id,
            req.ordinal,
            req.starts_at,
            req.ends_at,
            req.modifier_type,
            req.modifier_value,
        )
        .await?;
    Ok(Json(stage))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRowPricingRequest {
    pub zone_id: ZoneId,
    pub row: String,
    pub offset: Decimal,
}

#[utoipa::path(
    post,
    path = "/api/v1/row-pricing",
    tag = "Pricing",
    request_body = CreateRowPricingRequest,
    responses((status = 200, description = "Row offset created", body = RowPricing))
)]
pub async fn create_row_pricing(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<CreateRowPricingRequest>,
) -> CoreResult<Json<RowPricing>> {
    let repo = PricingRepository::new(state.db.pool());
    let row_pricing = repo
        .create_row_pricing(&ctx, req.zone_id, &req.row, req.offset)
        .await?;
    Ok(Json(row_pricing))
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}/zones/{zone_id}/price-stages",
    tag = "Pricing",
    params(
        ("event_id" = EventId, Path, description = "Event id"),
        ("zone_id" = ZoneId, Path, description = "Zone id"),
    ),
    responses((status = 200, description = "Stages in scope for the zone", body = [PriceStage]))
)]
pub async fn stages_in_scope(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path((event_id, zone_id)): Path<(EventId, ZoneId)>,
) -> CoreResult<Json<Vec<PriceStage>>> {
    let repo = PricingRepository::new(state.db.pool());
    Ok(Json(repo.stages_in_scope(&ctx, event_id, zone_id).await?))
}
