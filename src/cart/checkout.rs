//! Checkout orchestration.
//!
//! There is no "on transaction save" hook that fans out to fiscal, tickets
//! and audit - this module is that fan-out, written down as an ordinary
//! function so the commit boundary is visible at the call site rather than
//! hidden behind a signal handler.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::audit::AuditRepository;
use crate::catalog::CatalogRepository;
use crate::core_types::{CustomerId, EventId, HoldId, SeatId, TransactionId, ZoneId};
use crate::error::{CoreError, CoreResult};
use crate::fiscal::{FiscalDayRepository, FiscalSeriesAllocator, TaxConfigRepository, TaxEngine};
use crate::inventory::HoldManager;
use crate::pricing::{resolve_price, PricingRepository};
use crate::tenant::TenantCtx;
use crate::tickets::{DigitalTicket, TicketIssuer};

use super::models::{Transaction, TransactionItem, TransactionStatus};
use super::payment::{ChargeRequest, PaymentProcessor};
use super::repository::TransactionRepository;

/// One cart line queued for checkout: a live hold plus the catalog
/// coordinates needed to price and, on success, issue tickets for it.
pub struct CheckoutLine {
    pub hold_id: HoldId,
    pub zone_id: ZoneId,
    pub seat_id: Option<SeatId>,
    pub quantity: i32,
    pub max_usage: i32,
    pub ticket_valid_from: DateTime<Utc>,
    pub ticket_valid_until: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckoutOutcome {
    pub transaction: Transaction,
    pub tickets: Vec<DigitalTicket>,
}

pub struct CheckoutOrchestrator<'a> {
    pool: &'a PgPool,
    encryption_key: &'a [u8; 32],
}

impl<'a> CheckoutOrchestrator<'a> {
    pub fn new(pool: &'a PgPool, encryption_key: &'a [u8; 32]) -> Self {
        Self { pool, encryption_key }
    }

    /// Full checkout: price every line, charge the total, and - only on a
    /// settled charge - allocate a fiscal series, consume every hold, issue
    /// tickets and write one audit entry, all inside a single DB
    /// transaction rather than best-effort compensation across separate
    /// writes.
    ///
    /// On a charge that fails to settle, every hold is released and the
    /// transaction is left `cancelled`; no partial state is left behind.
    pub async fn checkout(
        &self,
        ctx: &TenantCtx,
        event_id: EventId,
        customer_id: CustomerId,
        currency: &str,
        payment_method: &str,
        lines: Vec<CheckoutLine>,
        processor: &dyn PaymentProcessor,
    ) -> CoreResult<CheckoutOutcome> {
        if lines.is_empty() {
            return Err(CoreError::validation("checkout requires at least one line"));
        }
        let user_id = ctx.require_user()?;

        let transactions = TransactionRepository::new(self.pool);
        let catalog = CatalogRepository::new(self.pool);
        let pricing = PricingRepository::new(self.pool);
        let tax_configs = TaxConfigRepository::new(self.pool);

        let transaction = transactions
            .create_pending(ctx.tenant_id(), event_id, customer_id, currency, payment_method)
            .await?;

        let now = Utc::now();
        let (priced_lines, subtotal) = self
            .price_lines(ctx, &transactions, &catalog, &pricing, event_id, transaction.id, now, lines)
            .await?;

        let configs = tax_configs.configs_for_event(ctx.tenant_id(), event_id).await?;
        let tax_items = TaxEngine::calculate(subtotal, now, &configs);
        let tax = TaxEngine::total(&tax_items);
        let total = subtotal + tax;

        let mut tx = self.pool.begin().await?;
        transactions
            .set_totals(&mut tx, ctx.tenant_id(), transaction.id, subtotal, tax, total)
            .await?;
        tx.commit().await?;

        let charge = processor
            .charge(ChargeRequest {
                amount: total,
                currency: currency.to_string(),
                method: payment_method.to_string(),
                reference: transaction.id.to_string(),
            })
            .await?;

        if !charge.settled {
            self.release_all(ctx, &priced_lines).await?;
            let mut tx = self.pool.begin().await?;
            let cancelled = transactions
                .mark_status_in_tx(&mut tx, ctx.tenant_id(), transaction.id, TransactionStatus::Cancelled)
                .await?;
            AuditRepository::record(
                &mut tx,
                ctx.tenant_id(),
                Some(user_id),
                "checkout.cancelled",
                "transaction",
                &cancelled.id.to_string(),
                None,
                None,
                None,
                "payment was not settled",
            )
            .await?;
            tx.commit().await?;
            return Err(CoreError::conflict(format!(
                "payment was not settled for transaction {}",
                cancelled.id
            )));
        }

        let holds = HoldManager::new(self.pool);
        let fiscal_days = FiscalDayRepository::new(self.pool);
        let fiscal_date = Self::caracas_date(now);
        fiscal_days.assert_open_for_sale(ctx.tenant_id(), user_id, fiscal_date).await?;

        let mut tx = self.pool.begin().await?;

        let series = FiscalSeriesAllocator::allocate(&mut tx, ctx.tenant_id(), transaction.id, user_id).await?;
        transactions
            .complete(&mut tx, ctx.tenant_id(), transaction.id, series.id)
            .await?;
        TaxEngine::persist_history(&mut tx, ctx.tenant_id(), transaction.id, &tax_items).await?;

        let issuer = TicketIssuer::new(self.encryption_key);
        let mut tickets = Vec::new();

        for (item_index, (line, item)) in priced_lines.iter().enumerate() {
            holds
                .consume(&mut tx, ctx.tenant_id(), line.hold_id, transaction.id, Some(user_id))
                .await?;

            let issued = issuer
                .issue_for_item(
                    &mut tx,
                    ctx.tenant_id(),
                    transaction.id,
                    item.id,
                    event_id,
                    customer_id,
                    line.zone_id,
                    line.seat_id,
                    series.series_number,
                    item_index as i32,
                    line.quantity,
                    line.max_usage,
                    line.ticket_valid_from,
                    line.ticket_valid_until,
                )
                .await?;
            tickets.extend(issued);
        }

        AuditRepository::record(
            &mut tx,
            ctx.tenant_id(),
            Some(user_id),
            "checkout.completed",
            "transaction",
            &transaction.id.to_string(),
            Some(series.id),
            None,
            None,
            &format!("checkout settled, series {}", series.series_number),
        )
        .await?;

        tx.commit().await?;

        let final_transaction = transactions.find(ctx.tenant_id(), transaction.id).await?;
        Ok(CheckoutOutcome {
            transaction: final_transaction,
            tickets,
        })
    }

    /// Partial-payment path: collects a deposit, moves every
    /// numbered seat `held → reserved`, and leaves the transaction
    /// `reserved` rather than `completed` - no fiscal series and no
    /// tickets yet. General-admission lines can't go through this path
    /// (there is no per-seat row for [`HoldManager::reserve`] to move).
    pub async fn reserve_partial(
        &self,
        ctx: &TenantCtx,
        event_id: EventId,
        customer_id: CustomerId,
        currency: &str,
        payment_method: &str,
        lines: Vec<CheckoutLine>,
        processor: &dyn PaymentProcessor,
        deposit_amount: Decimal,
    ) -> CoreResult<Transaction> {
        if lines.iter().any(|l| l.seat_id.is_none()) {
            return Err(CoreError::validation(
                "only numbered-seat lines can be partially paid and reserved",
            ));
        }

        let transactions = TransactionRepository::new(self.pool);
        let catalog = CatalogRepository::new(self.pool);
        let pricing = PricingRepository::new(self.pool);
        let now = Utc::now();

        let transaction = transactions
            .create_pending(ctx.tenant_id(), event_id, customer_id, currency, payment_method)
            .await?;

        let (priced_lines, subtotal) = self
            .price_lines(ctx, &transactions, &catalog, &pricing, event_id, transaction.id, now, lines)
            .await?;

        let mut tx = self.pool.begin().await?;
        transactions
            .set_totals(&mut tx, ctx.tenant_id(), transaction.id, subtotal, Decimal::ZERO, subtotal)
            .await?;
        tx.commit().await?;

        let charge = processor
            .charge(ChargeRequest {
                amount: deposit_amount,
                currency: currency.to_string(),
                method: payment_method.to_string(),
                reference: transaction.id.to_string(),
            })
            .await?;

        if !charge.settled {
            self.release_all(ctx, &priced_lines).await?;
            let mut tx = self.pool.begin().await?;
            let cancelled = transactions
                .mark_status_in_tx(&mut tx, ctx.tenant_id(), transaction.id, TransactionStatus::Cancelled)
                .await?;
            AuditRepository::record(
                &mut tx,
                ctx.tenant_id(),
                ctx.user_id(),
                "checkout.cancelled",
                "transaction",
                &cancelled.id.to_string(),
                None,
                None,
                None,
                "deposit was not settled",
            )
            .await?;
            tx.commit().await?;
            return Err(CoreError::conflict("deposit was not settled"));
        }

        let holds = HoldManager::new(self.pool);
        let mut tx = self.pool.begin().await?;
        for (line, _) in &priced_lines {
            holds.reserve(&mut tx, ctx.tenant_id(), line.hold_id).await?;
        }
        tx.commit().await?;

        transactions
            .mark_status(ctx.tenant_id(), transaction.id, TransactionStatus::Reserved)
            .await
    }

    /// Completes a reservation once the balance is paid in full: allocates
    /// the fiscal series, finalizes every hold (`reserved → sold`), issues
    /// tickets and audits - the same closing sequence [`Self::checkout`]
    /// runs, reached from `reserved` instead of `pending`.
    pub async fn complete_reservation(
        &self,
        ctx: &TenantCtx,
        transaction_id: TransactionId,
        remaining_amount: Decimal,
        payment_method: &str,
        processor: &dyn PaymentProcessor,
        max_usage: i32,
        ticket_valid_from: DateTime<Utc>,
        ticket_valid_until: DateTime<Utc>,
    ) -> CoreResult<CheckoutOutcome> {
        let user_id = ctx.require_user()?;
        let transactions = TransactionRepository::new(self.pool);

        let transaction = transactions.find(ctx.tenant_id(), transaction_id).await?;
        if transaction.status != TransactionStatus::Reserved {
            return Err(CoreError::conflict("transaction is not awaiting a remaining balance"));
        }
        let items = transactions.items_for(ctx.tenant_id(), transaction_id).await?;

        let charge = processor
            .charge(ChargeRequest {
                amount: remaining_amount,
                currency: transaction.currency.clone(),
                method: payment_method.to_string(),
                reference: transaction_id.to_string(),
            })
            .await?;
        if !charge.settled {
            return Err(CoreError::conflict("remaining balance was not settled"));
        }

        let holds = HoldManager::new(self.pool);
        let fiscal_days = FiscalDayRepository::new(self.pool);
        let now = Utc::now();
        let fiscal_date = Self::caracas_date(now);
        fiscal_days.assert_open_for_sale(ctx.tenant_id(), user_id, fiscal_date).await?;

        let mut tx = self.pool.begin().await?;

        let series = FiscalSeriesAllocator::allocate(&mut tx, ctx.tenant_id(), transaction_id, user_id).await?;
        transactions
            .complete(&mut tx, ctx.tenant_id(), transaction_id, series.id)
            .await?;

        let issuer = TicketIssuer::new(self.encryption_key);
        let mut tickets = Vec::new();

        for (item_index, item) in items.iter().enumerate() {
            holds
                .finalize_reservation(&mut tx, ctx.tenant_id(), item.hold_id, transaction_id)
                .await?;

            let issued = issuer
                .issue_for_item(
                    &mut tx,
                    ctx.tenant_id(),
                    transaction_id,
                    item.id,
                    transaction.event_id,
                    transaction.customer_id,
                    item.zone_id,
                    item.seat_id,
                    series.series_number,
                    item_index as i32,
                    item.quantity,
                    max_usage,
                    ticket_valid_from,
                    ticket_valid_until,
                )
                .await?;
            tickets.extend(issued);
        }

        AuditRepository::record(
            &mut tx,
            ctx.tenant_id(),
            Some(user_id),
            "checkout.reservation_completed",
            "transaction",
            &transaction_id.to_string(),
            Some(series.id),
            None,
            None,
            &format!("reservation settled, series {}", series.series_number),
        )
        .await?;

        tx.commit().await?;

        let final_transaction = transactions.find(ctx.tenant_id(), transaction_id).await?;
        Ok(CheckoutOutcome {
            transaction: final_transaction,
            tickets,
        })
    }

    /// Refund path: moves sold seats back to `refunded`, cancels every
    /// ticket, voids the fiscal series and leaves the transaction
    /// `refunded`. All within one DB transaction, except the series void
    /// which runs after commit since [`FiscalSeriesAllocator::void`] takes
    /// a pool, not an open transaction - a voided number is never reused
    /// and the counter keeps incrementing independent of this row.
    pub async fn refund(
        &self,
        ctx: &TenantCtx,
        transaction_id: TransactionId,
        reason: &str,
    ) -> CoreResult<Transaction> {
        let user_id = ctx.require_user()?;
        let transactions = TransactionRepository::new(self.pool);

        let transaction = transactions.find(ctx.tenant_id(), transaction_id).await?;
        if transaction.status != TransactionStatus::Completed {
            return Err(CoreError::conflict("only a completed transaction can be refunded"));
        }
        let fiscal_series_id = transaction
            .fiscal_series_id
            .ok_or_else(|| CoreError::internal("completed transaction has no fiscal series"))?;

        let items = transactions.items_for(ctx.tenant_id(), transaction_id).await?;

        let mut tx = self.pool.begin().await?;

        for item in &items {
            if let Some(seat_id) = item.seat_id {
                sqlx::query(
                    "UPDATE seats SET state = 'refunded' WHERE id = $1 AND tenant_id = $2 AND state = 'sold'",
                )
                .bind(seat_id)
                .bind(ctx.tenant_id())
                .execute(&mut *tx)
                .await?;
            } else {
                sqlx::query("UPDATE zones SET sold = sold - $1 WHERE id = $2 AND tenant_id = $3")
                    .bind(item.quantity)
                    .bind(item.zone_id)
                    .bind(ctx.tenant_id())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        TicketIssuer::cancel_for_transaction(&mut tx, ctx.tenant_id(), transaction_id).await?;

        AuditRepository::record(
            &mut tx,
            ctx.tenant_id(),
            Some(user_id),
            "checkout.refunded",
            "transaction",
            &transaction_id.to_string(),
            Some(fiscal_series_id),
            None,
            None,
            reason,
        )
        .await?;

        tx.commit().await?;

        let refunded = transactions
            .mark_status(ctx.tenant_id(), transaction_id, TransactionStatus::Refunded)
            .await?;

        FiscalSeriesAllocator::void(self.pool, ctx.tenant_id(), fiscal_series_id, user_id, reason).await?;

        Ok(refunded)
    }

    #[allow(clippy::too_many_arguments)]
    async fn price_lines(
        &self,
        ctx: &TenantCtx,
        transactions: &TransactionRepository<'_>,
        catalog: &CatalogRepository<'_>,
        pricing: &PricingRepository<'_>,
        event_id: EventId,
        transaction_id: TransactionId,
        at: DateTime<Utc>,
        lines: Vec<CheckoutLine>,
    ) -> CoreResult<(Vec<(CheckoutLine, TransactionItem)>, Decimal)> {
        let mut subtotal = Decimal::ZERO;
        let mut priced = Vec::with_capacity(lines.len());

        for line in lines {
            let zone = catalog.find_zone(ctx, line.zone_id).await?;
            let row = match line.seat_id {
                Some(seat_id) => Some(catalog.find_seat(ctx, seat_id).await?.row),
                None => None,
            };
            let row_pricing = match &row {
                Some(r) => pricing.row_pricing_for(ctx, line.zone_id, r).await?,
                None => None,
            };
            let stages = pricing.stages_in_scope(ctx, event_id, line.zone_id).await?;
            let quote = resolve_price(zone.base_price, row.as_deref(), at, row_pricing.as_ref(), stages);

            let mut tx = self.pool.begin().await?;
            let item = transactions
                .add_item(
                    &mut tx,
                    ctx.tenant_id(),
                    transaction_id,
                    line.zone_id,
                    line.seat_id,
                    line.hold_id,
                    quote.unit_price,
                    line.quantity,
                )
                .await?;
            tx.commit().await?;

            subtotal += item.total_price;
            priced.push((line, item));
        }

        Ok((priced, subtotal))
    }

    async fn release_all(&self, ctx: &TenantCtx, priced_lines: &[(CheckoutLine, TransactionItem)]) -> CoreResult<()> {
        let holds = HoldManager::new(self.pool);
        for (line, _) in priced_lines {
            holds.release(ctx, line.hold_id).await?;
        }
        Ok(())
    }

    fn caracas_date(at: DateTime<Utc>) -> chrono::NaiveDate {
        use chrono_tz::America::Caracas;
        at.with_timezone(&Caracas).date_naive()
    }
}
