//! Cart line management and checkout. `checkout`/`reserve_partial`/
//! `complete_reservation`/`refund` all drive [`CheckoutOrchestrator`]
//! against the processor installed in [`AppState::payment`].

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::cart::{CartService, CheckoutLine, CheckoutOrchestrator, CheckoutOutcome, Transaction};
use crate::core_types::{CartId, CustomerId, EventId, HoldId, SeatId, TransactionId, ZoneId};
use crate::error::CoreResult;
use crate::gateway::state::AppState;
use crate::inventory::Hold;
use crate::tenant::TenantCtx;

fn default_ttl_secs() -> i64 {
    600
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddSeatRequest {
    pub cart_id: CartId,
    pub zone_id: ZoneId,
    pub seat_id: SeatId,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: i64,
}

#[utoipa::path(
    post,
    path = "/api/v1/cart/seat",
    tag = "Cart",
    request_body = AddSeatRequest,
    responses((status = 200, description = "Seat held for the cart", body = Hold))
)]
pub async fn add_seat(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<AddSeatRequest>,
) -> CoreResult<Json<Hold>> {
    let service = CartService::new(state.db.pool());
    let hold = service
        .add_seat(&ctx, req.cart_id, req.zone_id, req.seat_id, Duration::seconds(req.ttl_secs))
        .await?;
    Ok(Json(hold))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddGeneralRequest {
    pub cart_id: CartId,
    pub zone_id: ZoneId,
    pub quantity: i32,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: i64,
}

#[utoipa::path(
    post,
    path = "/api/v1/cart/general",
    tag = "Cart",
    request_body = AddGeneralRequest,
    responses((status = 200, description = "General-admission quantity held for the cart", body = Hold))
)]
pub async fn add_general(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<AddGeneralRequest>,
) -> CoreResult<Json<Hold>> {
    let service = CartService::new(state.db.pool());
    let hold = service
        .add_general(&ctx, req.cart_id, req.zone_id, req.quantity, Duration::seconds(req.ttl_secs))
        .await?;
    Ok(Json(hold))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/lines/{hold_id}",
    tag = "Cart",
    params(("hold_id" = HoldId, Path, description = "Hold id")),
    responses((status = 200, description = "Line released"))
)]
pub async fn remove_line(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(hold_id): Path<HoldId>,
) -> CoreResult<Json<()>> {
    let service = CartService::new(state.db.pool());
    service.remove_line(&ctx, hold_id).await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExtendHoldRequest {
    pub ttl_secs: i64,
}

#[utoipa::path(
    post,
    path = "/api/v1/cart/lines/{hold_id}/extend",
    tag = "Cart",
    params(("hold_id" = HoldId, Path, description = "Hold id")),
    request_body = ExtendHoldRequest,
    responses((status = 200, description = "Hold extended", body = Hold))
)]
pub async fn extend_line(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(hold_id): Path<HoldId>,
    Json(req): Json<ExtendHoldRequest>,
) -> CoreResult<Json<Hold>> {
    let service = CartService::new(state.db.pool());
    let hold = service.extend(&ctx, hold_id, Duration::seconds(req.ttl_secs)).await?;
    Ok(Json(hold))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutLineRequest {
    pub hold_id: HoldId,
    pub zone_id: ZoneId,
    pub seat_id: Option<SeatId>,
    pub quantity: i32,
    pub max_usage: i32,
    pub ticket_valid_from: DateTime<Utc>,
    pub ticket_valid_until: DateTime<Utc>,
}

impl From<CheckoutLineRequest> for CheckoutLine {
    fn from(req: CheckoutLineRequest) -> Self {
        CheckoutLine {
            hold_id: req.hold_id,
            zone_id: req.zone_id,
            seat_id: req.seat_id,
            quantity: req.quantity,
            max_usage: req.max_usage,
            ticket_valid_from: req.ticket_valid_from,
            ticket_valid_until: req.ticket_valid_until,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub event_id: EventId,
    pub customer_id: CustomerId,
    pub currency: String,
    pub payment_method: String,
    pub lines: Vec<CheckoutLineRequest>,
}

#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    tag = "Cart",
    request_body = CheckoutRequest,
    responses((status = 200, description = "Checkout completed, tickets issued", body = CheckoutOutcome))
)]
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<CheckoutRequest>,
) -> CoreResult<Json<CheckoutOutcome>> {
    let orchestrator = CheckoutOrchestrator::new(state.db.pool(), &state.config.ticket_encryption_key);
    let lines = req.lines.into_iter().map(CheckoutLine::from).collect();
    let outcome = orchestrator
        .checkout(
            &ctx,
            req.event_id,
            req.customer_id,
            &req.currency,
            &req.payment_method,
            lines,
            state.payment.as_ref(),
        )
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReservePartialRequest {
    pub event_id: EventId,
    pub customer_id: CustomerId,
    pub currency: String,
    pub payment_method: String,
    pub lines: Vec<CheckoutLineRequest>,
    pub deposit_amount: Decimal,
}

#[utoipa::path(
    post,
    path = "/api/v1/checkout/reserve",
    tag = "Cart",
    request_body = ReservePartialRequest,
    responses((status = 200, description = "Deposit settled, seats reserved", body = Transaction))
)]
pub async fn reserve_partial(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<ReservePartialRequest>,
) -> CoreResult<Json<Transaction>> {
    let orchestrator = CheckoutOrchestrator::new(state.db.pool(), &state.config.ticket_encryption_key);
    let lines = req.lines.into_iter().map(CheckoutLine::from).collect();
    let transaction = orchestrator
        .reserve_partial(
            &ctx,
            req.event_id,
            req.customer_id,
            &req.currency,
            &req.payment_method,
            lines,
            state.payment.as_ref(),
            req.deposit_amount,
        )
        .await?;
    Ok(Json(transaction))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteReservationRequest {
    pub remaining_amount: Decimal,
    pub payment_method: String,
    pub max_usage: i32,
    pub ticket_valid_from: DateTime<Utc>,
    pub ticket_valid_until: DateTime<Utc>,
}

#[utoipa::path(
    post,
    path = "/api/v1/checkout/{transaction_id}/complete",
    tag = "Cart",
    params(("transaction_id" = TransactionId, Path, description = "Transaction id")),
    request_body = CompleteReservationRequest,
    responses((status = 200, description = "Remaining balance settled, tickets issued", body = CheckoutOutcome))
)]
pub async fn complete_reservation(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(transaction_id): Path<TransactionId>,
    Json(req): Json<CompleteReservationRequest>,
) -> CoreResult<Json<CheckoutOutcome>> {
    let orchestrator = CheckoutOrchestrator::new(state.db.pool(), &state.config.ticket_encryption_key);
    let outcome = orchestrator
        .complete_reservation(
            &ctx,
            transaction_id,
            req.remaining_amount,
            &req.payment_method,
            state.payment.as_ref(),
            req.max_usage,
            req.ticket_valid_from,
            req.ticket_valid_until,
        )
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundRequest {
    pub reason: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/checkout/{transaction_id}/refund",
    tag = "Cart",
    params(("transaction_id" = TransactionId, Path, description = "Transaction id")),
    request_body = RefundRequest,
    responses((status = 200, description = "Transaction refunded", body = Transaction))
)]
pub async fn refund(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(transaction_id): Path<TransactionId>,
    Json(req): Json<RefundRequest>,
) -> CoreResult<Json<Transaction>> {
    let orchestrator = CheckoutOrchestrator::new(state.db.pool(), &state.config.ticket_encryption_key);
    let transaction = orchestrator.refund(&ctx, transaction_id, &req.reason).await?;
    Ok(Json(transaction))
}
