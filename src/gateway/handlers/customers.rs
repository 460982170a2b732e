//! Customer registry and notification preferences.

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::core_types::CustomerId;
use crate::customers::{Customer, CustomerInput, CustomerRepository, NotificationPreferences, PreferencesRepository};
use crate::error::CoreResult;
use crate::gateway::state::AppState;
use crate::tenant::TenantCtx;

#[derive(Debug, Deserialize, ToSchema)]
pub struct FindOrCreateCustomerRequest {
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub identification: Option<String>,
}

impl From<FindOrCreateCustomerRequest> for CustomerInput {
    fn from(req: FindOrCreateCustomerRequest) -> Self {
        CustomerInput {
            name: req.name,
            surname: req.surname,
            phone: req.phone,
            email: req.email,
            identification: req.identification,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    tag = "Customers",
    request_body = FindOrCreateCustomerRequest,
    responses((status = 200, description = "Customer found or created", body = Customer))
)]
pub async fn find_or_create(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<FindOrCreateCustomerRequest>,
) -> CoreResult<Json<Customer>> {
    let repo = CustomerRepository::new(state.db.pool());
    let customer = repo.find_or_create(ctx.tenant_id(), req.into()).await?;
    Ok(Json(customer))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{customer_id}",
    tag = "Customers",
    params(("customer_id" = CustomerId, Path, description = "Customer id")),
    responses((status = 200, description = "Customer found", body = Customer))
)]
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(customer_id): Path<CustomerId>,
) -> CoreResult<Json<Customer>> {
    let repo = CustomerRepository::new(state.db.pool());
    Ok(Json(repo.find(ctx.tenant_id(), customer_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{customer_id}/preferences",
    tag = "Customers",
    params(("customer_id" = CustomerId, Path, description = "Customer id")),
    responses((status = 200, description = "Notification preferences", body = NotificationPreferences))
)]
pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(customer_id): Path<CustomerId>,
) -> CoreResult<Json<NotificationPreferences>> {
    let prefs = PreferencesRepository::find(state.db.pool(), ctx.tenant_id(), customer_id).await?;
    Ok(Json(prefs))
}
