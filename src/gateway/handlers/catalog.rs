//! Venue/event/zone/seat CRUD. Every handler pulls its `TenantCtx`
//! from the request extensions inserted by
//! [`crate::tenant::middleware::tenant_resolution_middleware`].

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::catalog::{CatalogRepository, Event, EventStatus, Seat, Venue, Zone, ZoneType};
use crate::core_types::{EventId, SeatId, VenueId, ZoneId};
use crate::error::CoreResult;
use crate::gateway::state::AppState;
use crate::tenant::TenantCtx;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVenueRequest {
    pub name: String,
    pub address: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/venues",
    tag = "Catalog",
    request_body = CreateVenueRequest,
    responses((status = 200, description = "Venue created", body = Venue))
)]
pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<CreateVenueRequest>,
) -> CoreResult<Json<Venue>> {
    let repo = CatalogRepository::new(state.db.pool());
    let venue = repo.create_venue(&ctx, &req.name, &req.address).await?;
    Ok(Json(venue))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub venue_id: VenueId,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Catalog",
    request_body = CreateEventRequest,
    responses((status = 200, description = "Event created in draft", body = Event))
)]
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<CreateEventRequest>,
) -> CoreResult<Json<Event>> {
    let repo = CatalogRepository::new(state.db.pool());
    let event = repo
        .create_event(&ctx, req.venue_id, &req.name, req.starts_at, req.ends_at)
        .await?;
    Ok(Json(event))
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{event_id}",
    tag = "Catalog",
    params(("event_id" = EventId, Path, description = "Event id")),
    responses((status = 200, description = "Event found", body = Event))
)]
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(event_id): Path<EventId>,
) -> CoreResult<Json<Event>> {
    let repo = CatalogRepository::new(state.db.pool());
    Ok(Json(repo.find_event(&ctx, event_id).await?))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionEventRequest {
    pub status: EventStatus,
}

#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/status",
    tag = "Catalog",
    params(("event_id" = EventId, Path, description = "Event id")),
    request_body = TransitionEventRequest,
    responses((status = 200, description = "Event transitioned", body = Event))
)]
pub async fn transition_event(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(event_id): Path<EventId>,
    Json(req): Json<TransitionEventRequest>,
) -> CoreResult<Json<Event>> {
    let repo = CatalogRepository::new(state.db.pool());
    Ok(Json(repo.transition_event_status(&ctx, event_id, req.status).await?))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateZoneRequest {
    pub event_id: EventId,
    pub name: String,
    pub zone_type: ZoneType,
    pub capacity: i32,
    pub base_price: Decimal,
}

#[utoipa::path(
    post,
    path = "/api/v1/zones",
    tag = "Catalog",
    request_body = CreateZoneRequest,
    responses((status = 200, description = "Zone created", body = Zone))
)]
pub async fn create_zone(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<CreateZoneRequest>,
) -> CoreResult<Json<Zone>> {
    let repo = CatalogRepository::new(state.db.pool());
    let zone = repo
        .create_zone(&ctx, req.event_id, &req.name, req.zone_type, req.capacity, req.base_price)
        .await?;
    Ok(Json(zone))
}

#[utoipa::path(
    get,
    path = "/api/v1/zones/{zone_id}",
    tag = "Catalog",
    params(("zone_id" = ZoneId, Path, description = "Zone id")),
    responses((status = 200, description = "Zone found", body = Zone))
)]
pub async fn get_zone(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(zone_id): Path<ZoneId>,
) -> CoreResult<Json<Zone>> {
    let repo = CatalogRepository::new(state.db.pool());
    Ok(Json(repo.find_zone(&ctx, zone_id).await?))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateSeatsRequest {
    pub rows: Vec<String>,
    pub seats_per_row: i32,
}

#[utoipa::path(
    post,
    path = "/api/v1/zones/{zone_id}/seats",
    tag = "Catalog",
    params(("zone_id" = ZoneId, Path, description = "Zone id")),
    request_body = GenerateSeatsRequest,
    responses((status = 200, description = "Seats generated", body = [Seat]))
)]
pub async fn generate_seats(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(zone_id): Path<ZoneId>,
    Json(req): Json<GenerateSeatsRequest>,
) -> CoreResult<Json<Vec<Seat>>> {
    let repo = CatalogRepository::new(state.db.pool());
    let seats = repo.generate_seats(&ctx, zone_id, &req.rows, req.seats_per_row).await?;
    Ok(Json(seats))
}

#[utoipa::path(
    post,
    path = "/api/v1/seats/{seat_id}/block",
    tag = "Catalog",
    params(("seat_id" = SeatId, Path, description = "Seat id")),
    responses((status = 200, description = "Seat blocked", body = Seat))
)]
pub async fn block_seat(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(seat_id): Path<SeatId>,
) -> CoreResult<Json<Seat>> {
    let repo = CatalogRepository::new(state.db.pool());
    Ok(Json(repo.block_seat(&ctx, seat_id).await?))
}
