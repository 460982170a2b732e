use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use crate::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::core_types::UserId;
use crate::error::CoreResult;
use crate::gateway::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses((status = 200, description = "User created", body = UserId))
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> CoreResult<Json<UserId>> {
    let user_id = state.user_auth.register(req).await?;
    Ok(Json(user_id))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses((status = 200, description = "Bearer token issued", body = AuthResponse))
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> CoreResult<Json<AuthResponse>> {
    let resp = state.user_auth.login(req).await?;
    Ok(Json(resp))
}
