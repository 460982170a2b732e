//! Request-ingress tenant resolution.
//!
//! Precedence: `tenant-id` header → `tenant-slug` header → subdomain →
//! authenticated user's primary tenant. If an authenticated user's own
//! tenant differs from whatever was resolved by header/slug/subdomain, the
//! whole request is rejected with `AccessDenied` rather than silently
//! preferring one source: reject, don't guess.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use crate::auth::Claims;
use crate::core_types::{TenantId, UserId};
use crate::db::Database;
use crate::error::CoreError;
use crate::tenant::{TenantCtx, TenantRepository};

const TENANT_ID_HEADER: &str = "tenant-id";
const TENANT_SLUG_HEADER: &str = "tenant-slug";

/// Pure resolution logic, independent of axum, so it can be unit tested and
/// reused by non-HTTP entry points (background workers build their own
/// `TenantCtx::system` and never call this).
pub async fn resolve_tenant(
    db: &Database,
    headers: &HeaderMap,
    host: Option<&str>,
    authenticated_user: Option<UserId>,
) -> Result<TenantCtx, CoreError> {
    let repo = TenantRepository::new(db.pool());

    let from_header_id: Option<TenantId> = headers
        .get(TENANT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok());

    let resolved_tenant_id = if let Some(id) = from_header_id {
        repo.find_by_id(id).await?.id
    } else if let Some(slug) = headers
        .get(TENANT_SLUG_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        repo.find_by_slug(slug).await?.id
    } else if let Some(subdomain) = host.and_then(|h| h.split('.').next()) {
        repo.find_by_slug(subdomain).await?.id
    } else if let Some(user_id) = authenticated_user {
        repo.find_primary_for_user(user_id).await?.id
    } else {
        return Err(CoreError::access_denied(
            "no tenant could be resolved for this request",
        ));
    };

    if let Some(user_id) = authenticated_user {
        let user_tenant = repo.find_primary_for_user(user_id).await?.id;
        if user_tenant != resolved_tenant_id {
            return Err(CoreError::access_denied(
                "authenticated user does not belong to the resolved tenant",
            ));
        }
        Ok(TenantCtx::for_user(resolved_tenant_id, user_id))
    } else {
        Ok(TenantCtx::system(resolved_tenant_id))
    }
}

/// Axum middleware: resolves the tenant and inserts a `TenantCtx` extension
/// for downstream handlers. Expects `jwt_auth_middleware`-style handling to
/// have already inserted a `Claims` extension when the request is
/// authenticated; runs after it in the layer stack.
pub async fn tenant_resolution_middleware(
    State(db): State<Arc<Database>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, CoreError> {
    let headers = request.headers().clone();
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let authenticated_user = request
        .extensions()
        .get::<Claims>()
        .and_then(|c| c.sub.parse::<UserId>().ok());

    let ctx = resolve_tenant(&db, &headers, host.as_deref(), authenticated_user).await?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_header_name_is_lowercase() {
        assert_eq!(TENANT_ID_HEADER, "tenant-id");
        assert_eq!(TENANT_SLUG_HEADER, "tenant-slug");
    }
}
