//! Venezia Tickets - multi-tenant ticketing and fiscal engine.
//!
//! Entry point: load configuration, establish the database pool, spawn the
//! background expirers alongside the HTTP gateway, and serve until the
//! process is signalled to stop.

use std::sync::Arc;

use anyhow::Context;

use venezia_tickets::auth::UserAuthService;
use venezia_tickets::cart::payment::{ManualSettlementProcessor, PaymentProcessor};
use venezia_tickets::config::AppConfig;
use venezia_tickets::db::Database;
use venezia_tickets::expirers::{HoldExpirer, ReservationSweeper};
use venezia_tickets::gateway::state::AppState;
use venezia_tickets::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    let _log_guard = logging::init_logging(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        bind_addr = %config.bind_addr,
        "starting venezia-tickets"
    );

    let db = Database::connect(&config.database_url, config.db_pool_size)
        .await
        .context("failed to connect to PostgreSQL")?;
    let pool = Arc::new(db.pool().clone());

    let config = Arc::new(config);
    let user_auth = Arc::new(UserAuthService::new(db.pool().clone(), config.jwt_secret.clone()));
    let payment: Arc<dyn PaymentProcessor> = Arc::new(ManualSettlementProcessor);

    let state = Arc::new(AppState::new(db, config.clone(), user_auth, payment));

    let hold_expirer = HoldExpirer::with_defaults(pool.clone());
    tokio::spawn(async move { hold_expirer.run().await });

    let reservation_sweeper = ReservationSweeper::with_defaults(pool);
    tokio::spawn(async move { reservation_sweeper.run().await });

    venezia_tickets::gateway::run_server(&config.bind_addr, state).await
}
