//! Fiscal series voiding, fiscal-day close, X/Z reports, and tax config
//! management. `user_id` for these endpoints is always the
//! authenticated caller, taken from the tenant context rather than a
//! request body field - a cashier can only close their own day.

use axum::extract::{Path, Query, State};
use axum::Extension;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::core_types::{EventId, FiscalSeriesId, TaxConfigId};
use crate::error::CoreResult;
use crate::fiscal::{
    FiscalDay, FiscalDayRepository, FiscalReport, FiscalSeries, FiscalSeriesAllocator, ReportGenerator, ReportType,
    TaxConfig, TaxConfigRepository, TaxType,
};
use crate::gateway::state::AppState;
use crate::tenant::TenantCtx;

#[derive(Debug, Deserialize, ToSchema)]
pub struct VoidSeriesRequest {
    pub reason: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/fiscal/series/{series_id}/void",
    tag = "Fiscal",
    params(("series_id" = FiscalSeriesId, Path, description = "Fiscal series id")),
    request_body = VoidSeriesRequest,
    responses((status = 200, description = "Series voided", body = FiscalSeries))
)]
pub async fn void_series(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(series_id): Path<FiscalSeriesId>,
    Json(req): Json<VoidSeriesRequest>,
) -> CoreResult<Json<FiscalSeries>> {
    let user_id = ctx.require_user()?;
    let series = FiscalSeriesAllocator::void(state.db.pool(), ctx.tenant_id(), series_id, user_id, &req.reason).await?;
    Ok(Json(series))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct FiscalDateQuery {
    pub fiscal_date: NaiveDate,
}

#[utoipa::path(
    post,
    path = "/api/v1/fiscal/day/close",
    tag = "Fiscal",
    params(FiscalDateQuery),
    responses((status = 200, description = "Fiscal day closed", body = FiscalDay))
)]
pub async fn close_fiscal_day(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Query(query): Query<FiscalDateQuery>,
) -> CoreResult<Json<FiscalDay>> {
    let user_id = ctx.require_user()?;
    let repo = FiscalDayRepository::new(state.db.pool());
    let day = repo.close(ctx.tenant_id(), user_id, query.fiscal_date).await?;
    Ok(Json(day))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportQuery {
    pub fiscal_date: NaiveDate,
    pub report_type: ReportType,
    /// `X` narrows to the caller; `Z` aggregates the whole tenant for the
    /// date when this is omitted.
    #[serde(default)]
    pub tenant_wide: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/fiscal/reports",
    tag = "Fiscal",
    params(ReportQuery),
    responses((status = 200, description = "Report generated", body = FiscalReport))
)]
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Query(query): Query<ReportQuery>,
) -> CoreResult<Json<FiscalReport>> {
    let scoped_user = if query.tenant_wide { None } else { Some(ctx.require_user()?) };
    let generator = ReportGenerator::new(state.db.pool());
    let report = generator
        .generate(ctx.tenant_id(), scoped_user, query.fiscal_date, query.report_type)
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaxConfigRequest {
    pub event_id: Option<EventId>,
    pub name: String,
    pub tax_type: TaxType,
    pub rate: Decimal,
    pub fixed_amount: Decimal,
    pub effective_from: DateTime<Utc>,
    pub effective_until: Option<DateTime<Utc>>,
}

#[utoipa::path(
    post,
    path = "/api/v1/fiscal/tax-configs",
    tag = "Fiscal",
    request_body = CreateTaxConfigRequest,
    responses((status = 200, description = "Tax config created", body = TaxConfig))
)]
pub async fn create_tax_config(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Json(req): Json<CreateTaxConfigRequest>,
) -> CoreResult<Json<TaxConfig>> {
    let repo = TaxConfigRepository::new(state.db.pool());
    let config = repo
        .create(
            ctx.tenant_id(),
            req.event_id,
            &req.name,
            req.tax_type,
            req.rate,
            req.fixed_amount,
            req.effective_from,
            req.effective_until,
        )
        .await?;
    Ok(Json(config))
}

#[utoipa::path(
    post,
    path = "/api/v1/fiscal/tax-configs/{tax_config_id}/deactivate",
    tag = "Fiscal",
    params(("tax_config_id" = TaxConfigId, Path, description = "Tax config id")),
    responses((status = 200, description = "Tax config deactivated"))
)]
pub async fn deactivate_tax_config(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TenantCtx>,
    Path(tax_config_id): Path<TaxConfigId>,
) -> CoreResult<Json<()>> {
    let repo = TaxConfigRepository::new(state.db.pool());
    repo.deactivate(ctx.tenant_id(), tax_config_id).await?;
    Ok(Json(()))
}
