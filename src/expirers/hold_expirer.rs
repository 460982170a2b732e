//! Sweeps every tenant's `active` holds past `expires_at` to `expired`.
//! Correctness never depends on this running -
//! [`crate::inventory::HoldManager::consume`] and `::reserve`
//! re-check liveness themselves - so a missed or delayed sweep only
//! widens the window before capacity is visibly reclaimed, never
//! corrupts it.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tracing::{debug, error, info};

use crate::audit::AuditRepository;
use crate::inventory::HoldManager;
use crate::tenant::TenantRepository;

#[derive(Debug, Clone)]
pub struct HoldExpirerConfig {
    pub scan_interval: Duration,
}

impl Default for HoldExpirerConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(60),
        }
    }
}

pub struct HoldExpirer {
    pool: Arc<PgPool>,
    config: HoldExpirerConfig,
}

impl HoldExpirer {
    pub fn new(pool: Arc<PgPool>, config: HoldExpirerConfig) -> Self {
        Self { pool, config }
    }

    pub fn with_defaults(pool: Arc<PgPool>) -> Self {
        Self::new(pool, HoldExpirerConfig::default())
    }

    /// Runs forever, scanning every active tenant's holds once per
    /// `scan_interval`. A scan failure for one tenant is logged and does
    /// not stop the sweep for the rest.
    pub async fn run(&self) -> ! {
        info!(
            scan_interval_secs = self.config.scan_interval.as_secs(),
            "starting hold expirer"
        );
        loop {
            if let Err(e) = self.scan_all_tenants().await {
                error!(error = %e, "hold expirer scan failed");
            }
            tokio::time::sleep(self.config.scan_interval).await;
        }
    }

    pub async fn scan_all_tenants(&self) -> crate::error::CoreResult<usize> {
        let tenants = TenantRepository::new(&self.pool).list_active().await?;
        let holds = HoldManager::new(&self.pool);
        let mut total = 0;

        for tenant in tenants {
            let expired = holds.expire_due_holds(tenant.id).await?;
            if expired.is_empty() {
                continue;
            }

            debug!(tenant_id = %tenant.id, count = expired.len(), "expired stale holds");
            let mut tx = self.pool.begin().await?;
            for hold_id in &expired {
                AuditRepository::record(
                    &mut tx,
                    tenant.id,
                    None,
                    "hold.expired",
                    "hold",
                    &hold_id.to_string(),
                    None,
                    None,
                    None,
                    "hold expired before checkout completed",
                )
                .await?;
            }
            tx.commit().await?;
            total += expired.len();
        }

        if total > 0 {
            info!(count = total, "expired holds across tenants");
        }
        Ok(total)
    }
}
