//! Finds partially-paid reservations (the `reserved` path) whose
//! deposit predates the configured deadline, releases their holds back to
//! the pool, cancels the transaction, and enqueues a payment reminder
//! through the notification outbox rather than sending anything itself.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::audit::AuditRepository;
use crate::cart::{TransactionRepository, TransactionStatus};
use crate::customers::CustomerRepository;
use crate::inventory::HoldManager;
use crate::notifications::{Channel, OutboxInput, OutboxRepository};
use crate::tenant::TenantRepository;

#[derive(Debug, Clone)]
pub struct ReservationSweeperConfig {
    pub scan_interval: Duration,
    /// How long a `reserved` transaction may wait for its remaining
    /// balance before it is abandoned.
    pub payment_deadline: Duration,
}

impl Default for ReservationSweeperConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(300),
            payment_deadline: Duration::from_secs(3600 * 24),
        }
    }
}

pub struct ReservationSweeper {
    pool: Arc<PgPool>,
    config: ReservationSweeperConfig,
}

impl ReservationSweeper {
    pub fn new(pool: Arc<PgPool>, config: ReservationSweeperConfig) -> Self {
        Self { pool, config }
    }

    pub fn with_defaults(pool: Arc<PgPool>) -> Self {
        Self::new(pool, ReservationSweeperConfig::default())
    }

    pub async fn run(&self) -> ! {
        info!(
            scan_interval_secs = self.config.scan_interval.as_secs(),
            payment_deadline_secs = self.config.payment_deadline.as_secs(),
            "starting reservation sweeper"
        );
        loop {
            if let Err(e) = self.scan_all_tenants().await {
                error!(error = %e, "reservation sweep failed");
            }
            tokio::time::sleep(self.config.scan_interval).await;
        }
    }

    pub async fn scan_all_tenants(&self) -> crate::error::CoreResult<usize> {
        let tenants = TenantRepository::new(&self.pool).list_active().await?;
        let transactions = TransactionRepository::new(&self.pool);
        let holds = HoldManager::new(&self.pool);
        let outbox = OutboxRepository::new(&self.pool);
        let customers = CustomerRepository::new(&self.pool);
        let deadline = Utc::now()
            - chrono::Duration::from_std(self.config.payment_deadline)
                .unwrap_or_else(|_| chrono::Duration::days(1));

        let mut abandoned = 0;

        for tenant in tenants {
            let stale = transactions.stale_reserved(tenant.id, deadline).await?;
            for transaction in stale {
                let items = transactions.items_for(tenant.id, transaction.id).await?;

                let mut tx = self.pool.begin().await?;
                for item in &items {
                    holds.abandon_reservation(&mut tx, tenant.id, item.hold_id).await?;
                }
                tx.commit().await?;

                transactions
                    .mark_status(tenant.id, transaction.id, TransactionStatus::Cancelled)
                    .await?;

                let mut audit_tx = self.pool.begin().await?;
                AuditRepository::record(
                    &mut audit_tx,
                    tenant.id,
                    None,
                    "reservation.abandoned",
                    "transaction",
                    &transaction.id.to_string(),
                    None,
                    None,
                    None,
                    "reservation deadline passed without the remaining balance",
                )
                .await?;
                audit_tx.commit().await?;

                let recipient = customers
                    .find(tenant.id, transaction.customer_id)
                    .await
                    .ok()
                    .and_then(|c| c.email.or(c.phone));

                if let Some(recipient) = recipient {
                    if let Err(e) = outbox
                        .enqueue(
                            tenant.id,
                            OutboxInput {
                                template_id: Some("reservation_expired"),
                                channel: Channel::Email,
                                recipient: &recipient,
                                subject: "Your reservation has expired",
                                rendered_body: "",
                                customer_id: Some(transaction.customer_id),
                                transaction_id: Some(transaction.id),
                            },
                        )
                        .await
                    {
                        warn!(transaction_id = %transaction.id, error = %e, "failed to enqueue reservation expiry notice");
                    }
                } else {
                    warn!(transaction_id = %transaction.id, "customer has no contact info for reservation expiry notice");
                }

                abandoned += 1;
            }
        }

        if abandoned > 0 {
            info!(count = abandoned, "abandoned stale reservations");
        }
        Ok(abandoned)
    }
}
