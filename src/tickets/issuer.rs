//! Ticket issuance on transaction completion.
//!
//! Called from inside the same DB transaction the checkout orchestrator
//! uses to mark a `Transaction` completed - an explicit orchestrator
//! step, not a post-save hook. One [`DigitalTicket`] row is emitted per
//! unit sold.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, Row, Transaction};

use crate::core_types::{CustomerId, EventId, SeatId, TenantId, TransactionId, TransactionItemId, ZoneId};
use crate::error::CoreResult;

use super::crypto::{self, TicketPayload};
use super::models::{DigitalTicket, TicketStatus};

pub struct TicketIssuer<'a> {
    encryption_key: &'a [u8; 32],
}

impl<'a> TicketIssuer<'a> {
    pub fn new(encryption_key: &'a [u8; 32]) -> Self {
        Self { encryption_key }
    }

    /// Emits `quantity` tickets for one `TransactionItem`. `item_index`
    /// distinguishes items within the same transaction for the ticket
    /// number scheme `fiscal_series-item_index-sequence`.
    #[allow(clippy::too_many_arguments)]
    pub async fn issue_for_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: TenantId,
        transaction_id: TransactionId,
        transaction_item_id: TransactionItemId,
        event_id: EventId,
        customer_id: CustomerId,
        zone_id: ZoneId,
        seat_id: Option<SeatId>,
        fiscal_series_number: i64,
        item_index: i32,
        quantity: i32,
        max_usage: i32,
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    ) -> CoreResult<Vec<DigitalTicket>> {
        let mut tickets = Vec::with_capacity(quantity as usize);

        for sequence in 0..quantity {
            let ticket_number = format!("{fiscal_series_number}-{item_index}-{sequence}");
            let created_at = Utc::now();

            let row = sqlx::query(
                "INSERT INTO tickets \
                    (tenant_id, transaction_id, transaction_item_id, event_id, customer_id, \
                     zone_id, seat_id, ticket_number, sequence, signed_payload, validation_hash, \
                     usage_count, max_usage, status, valid_from, valid_until, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 0, $12, 'active', $13, $14, $15) \
                 RETURNING id",
            )
            .bind(tenant_id)
            .bind(transaction_id)
            .bind(transaction_item_id)
            .bind(event_id)
            .bind(customer_id)
            .bind(zone_id)
            .bind(seat_id)
            .bind(&ticket_number)
            .bind(sequence)
            .bind("") // signed_payload filled in below once the ticket id is known
            .bind("")
            .bind(max_usage)
            .bind(valid_from)
            .bind(valid_until)
            .bind(created_at)
            .fetch_one(&mut **tx)
            .await?;

            let ticket_id = row.try_get("id")?;

            let payload = TicketPayload {
                ticket_id,
                ticket_number: ticket_number.clone(),
                event_id,
                customer_id,
                zone_id,
                seat_id,
                valid_from,
                valid_until,
                max_usage,
                created_at,
            };
            let signed_payload = crypto::encrypt(self.encryption_key, &payload)?;
            let validation_hash = crypto::validation_hash(&ticket_number, event_id, customer_id);

            sqlx::query("UPDATE tickets SET signed_payload = $1, validation_hash = $2 WHERE id = $3")
                .bind(&signed_payload)
                .bind(&validation_hash)
                .bind(ticket_id)
                .execute(&mut **tx)
                .await?;

            tickets.push(DigitalTicket {
                id: ticket_id,
                tenant_id,
                transaction_id,
                transaction_item_id,
                event_id,
                customer_id,
                zone_id,
                seat_id,
                ticket_number,
                sequence,
                signed_payload,
                validation_hash,
                usage_count: 0,
                max_usage,
                status: TicketStatus::Active,
                valid_from,
                valid_until,
                first_used_at: None,
                created_at,
            });
        }

        Ok(tickets)
    }

    /// Cancels every ticket belonging to a transaction (refund path).
    pub async fn cancel_for_transaction(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: TenantId,
        transaction_id: TransactionId,
    ) -> CoreResult<u64> {
        let result = sqlx::query(
            "UPDATE tickets SET status = 'cancelled' \
             WHERE tenant_id = $1 AND transaction_id = $2 AND status != 'cancelled'",
        )
        .bind(tenant_id)
        .bind(transaction_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }
}
