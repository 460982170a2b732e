//! Shared state handed to every handler: one `Arc<AppState>` wrapping the
//! connection pool and every ambient service a handler might need.

use std::sync::Arc;

use crate::auth::UserAuthService;
use crate::cart::PaymentProcessor;
use crate::config::AppConfig;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub user_auth: Arc<UserAuthService>,
    pub payment: Arc<dyn PaymentProcessor>,
}

impl AppState {
    pub fn new(
        db: Database,
        config: Arc<AppConfig>,
        user_auth: Arc<UserAuthService>,
        payment: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            db,
            config,
            user_auth,
            payment,
        }
    }
}
