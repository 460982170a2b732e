//! HTTP gateway: axum router construction, middleware wiring and the
//! OpenAPI/Swagger surface. One `AppState`, public routes unguarded,
//! private routes behind a `from_fn_with_state` auth layer, SwaggerUi
//! merged in after `with_state`.

pub mod handlers;
pub mod openapi;
pub mod state;

use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{jwt_auth_middleware, UserAuthService};
use crate::db::Database;
use crate::tenant::middleware::tenant_resolution_middleware;

use state::AppState;

/// Routes that resolve a tenant but never require an authenticated user -
/// door-scanning systems present a `system_id` string, not a bearer token,
/// and `validate(...)` takes no user argument.
fn tenant_scoped_routes(db: Arc<Database>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/tickets/validate", post(handlers::tickets::validate))
        .route("/tickets/validate/bulk", post(handlers::tickets::bulk_validate))
        .layer(from_fn_with_state(db, tenant_resolution_middleware))
}

/// Routes that require both a resolved tenant and an authenticated user.
/// The JWT layer runs first (outermost `.layer()` call), inserting the
/// `Claims` extension that `tenant_resolution_middleware` then reads to
/// bind the tenant to that user rather than trusting a bare header.
fn authenticated_routes(db: Arc<Database>, user_auth: Arc<UserAuthService>) -> Router<Arc<AppState>> {
    Router::new()
        // Catalog
        .route("/venues", post(handlers::catalog::create_venue))
        .route("/events", post(handlers::catalog::create_event))
        .route("/events/{event_id}", get(handlers::catalog::get_event))
        .route("/events/{event_id}/status", post(handlers::catalog::transition_event))
        .route("/zones", post(handlers::catalog::create_zone))
        .route("/zones/{zone_id}", get(handlers::catalog::get_zone))
        .route("/zones/{zone_id}/seats", post(handlers::catalog::generate_seats))
        .route("/seats/{seat_id}/block", post(handlers::catalog::block_seat))
        // Pricing
        .route("/price-stages", post(handlers::pricing::create_stage))
        .route("/row-pricing", post(handlers::pricing::create_row_pricing))
        .route(
            "/events/{event_id}/zones/{zone_id}/price-stages",
            get(handlers::pricing::stages_in_scope),
        )
        // Cart + checkout
        .route("/cart/seat", post(handlers::cart::add_seat))
        .route("/cart/general", post(handlers::cart::add_general))
        .route("/cart/lines/{hold_id}", delete(handlers::cart::remove_line))
        .route("/cart/lines/{hold_id}/extend", post(handlers::cart::extend_line))
        .route("/checkout", post(handlers::cart::checkout))
        .route("/checkout/reserve", post(handlers::cart::reserve_partial))
        .route("/checkout/{transaction_id}/complete", post(handlers::cart::complete_reservation))
        .route("/checkout/{transaction_id}/refund", post(handlers::cart::refund))
        // Fiscal
        .route("/fiscal/series/{series_id}/void", post(handlers::fiscal::void_series))
        .route("/fiscal/day/close", post(handlers::fiscal::close_fiscal_day))
        .route("/fiscal/reports", post(handlers::fiscal::generate_report))
        .route("/fiscal/tax-configs", post(handlers::fiscal::create_tax_config))
        .route(
            "/fiscal/tax-configs/{tax_config_id}/deactivate",
            post(handlers::fiscal::deactivate_tax_config),
        )
        // Customers
        .route("/customers", post(handlers::customers::find_or_create))
        .route("/customers/{customer_id}", get(handlers::customers::get_customer))
        .route(
            "/customers/{customer_id}/preferences",
            get(handlers::customers::get_preferences),
        )
        // Audit
        .route("/audit", get(handlers::audit::query))
        .layer(from_fn_with_state(db, tenant_resolution_middleware))
        .layer(from_fn_with_state(user_auth, jwt_auth_middleware))
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
}

pub async fn run_server(bind_addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let db = Arc::new(state.db.clone());
    let user_auth = state.user_auth.clone();

    let app = Router::new()
        .nest(
            "/api/v1",
            public_routes()
                .merge(tenant_scoped_routes(db.clone()))
                .merge(authenticated_routes(db, user_auth)),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()));

    let listener = TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, "gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
