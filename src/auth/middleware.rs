//! Bearer-token extraction and JWT verification middleware.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use super::service::UserAuthService;

pub async fn jwt_auth_middleware(
    State(auth): State<Arc<UserAuthService>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let unauthorized = |msg: &str| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": "ACCESS_DENIED", "message": msg })),
        )
            .into_response()
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| unauthorized("missing authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("invalid token format"))?;

    let claims = auth
        .verify_token(token)
        .map_err(|_| unauthorized("invalid or expired token"))?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
