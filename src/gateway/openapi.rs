//! OpenAPI / Swagger UI documentation.
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::audit::AuditEntry;
use crate::cart::{CheckoutOutcome, Transaction};
use crate::catalog::{Event, Seat, Venue, Zone};
use crate::customers::{Customer, NotificationPreferences};
use crate::fiscal::{FiscalDay, FiscalReport, FiscalSeries, TaxConfig};
use crate::gateway::handlers;
use crate::inventory::Hold;
use crate::pricing::{PriceStage, RowPricing};
use crate::tickets::ValidationOutcome;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Bearer token issued by `POST /api/v1/auth/login`"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Venezia Tickets API",
        version = "1.0.0",
        description = "Multi-tenant transactional engine for live-event ticketing: seat/capacity inventory, pricing resolution, fiscal ledger and digital ticket issuance.",
        contact(name = "API Support"),
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        handlers::health::health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::catalog::create_venue,
        handlers::catalog::create_event,
        handlers::catalog::get_event,
        handlers::catalog::transition_event,
        handlers::catalog::create_zone,
        handlers::catalog::get_zone,
        handlers::catalog::generate_seats,
        handlers::catalog::block_seat,
        handlers::pricing::create_stage,
        handlers::pricing::create_row_pricing,
        handlers::pricing::stages_in_scope,
        handlers::cart::add_seat,
        handlers::cart::add_general,
        handlers::cart::remove_line,
        handlers::cart::extend_line,
        handlers::cart::checkout,
        handlers::cart::reserve_partial,
        handlers::cart::complete_reservation,
        handlers::cart::refund,
        handlers::fiscal::void_series,
        handlers::fiscal::close_fiscal_day,
        handlers::fiscal::generate_report,
        handlers::fiscal::create_tax_config,
        handlers::fiscal::deactivate_tax_config,
        handlers::tickets::validate,
        handlers::tickets::bulk_validate,
        handlers::customers::find_or_create,
        handlers::customers::get_customer,
        handlers::customers::get_preferences,
        handlers::audit::query,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            Venue,
            Event,
            Zone,
            Seat,
            PriceStage,
            RowPricing,
            Hold,
            Transaction,
            CheckoutOutcome,
            FiscalSeries,
            FiscalDay,
            FiscalReport,
            TaxConfig,
            ValidationOutcome,
            Customer,
            NotificationPreferences,
            AuditEntry,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "System", description = "Health checks"),
        (name = "Auth", description = "Tenant-user registration and login"),
        (name = "Catalog", description = "Venues, events, zones and seats"),
        (name = "Pricing", description = "Price stages and row offsets"),
        (name = "Cart", description = "Cart lines, checkout and refunds"),
        (name = "Fiscal", description = "Fiscal series, day close, X/Z reports and tax configs"),
        (name = "Tickets", description = "Door validation"),
        (name = "Customers", description = "Customer registry and notification preferences"),
        (name = "Audit", description = "Audit trail queries"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn openapi_spec_generates() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Venezia Tickets API");
    }

    #[test]
    fn openapi_json_serializable() {
        let spec = ApiDoc::openapi();
        assert!(spec.to_json().is_ok());
    }

    #[test]
    fn security_scheme_registered() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("should have components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
