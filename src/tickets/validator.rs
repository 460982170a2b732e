//! Bounded-use validation state machine.
//!
//! `validate` accepts either a signed payload or a bare ticket number,
//! checks authenticity and status, optionally marks the ticket used, and
//! always appends a [`ValidationEvent`] - on success and on failure alike.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};
use utoipa::ToSchema;

use crate::core_types::{EventId, TenantId, TicketId};
use crate::error::{CoreError, CoreResult};

use super::crypto;
use super::models::{DigitalTicket, EntryAction, TicketStatus, ValidationEvent, ValidationMethod};

/// Replayed/obsolete payloads are rejected if their embedded `created_at`
/// drifts more than this from the stored row.
const AUTHENTICITY_SKEW: Duration = Duration::seconds(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum ValidationFailureReason {
    NotFound,
    AuthenticityFailed,
    NotActive,
    OutsideValidityWindow,
    OutsideEventWindow,
    UsageLimitReached,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub ticket_id: Option<TicketId>,
    pub remaining_uses: Option<i32>,
    pub reason: Option<ValidationFailureReason>,
}

/// Reject check-in attempts this far outside the event's own window.
/// Deployment-configurable rather than a fixed constant.
#[derive(Debug, Clone, Copy)]
pub struct EventWindowGuard {
    pub before_start: Duration,
    pub after_start: Duration,
}

impl Default for EventWindowGuard {
    fn default() -> Self {
        Self {
            before_start: Duration::hours(1),
            after_start: Duration::hours(2),
        }
    }
}

pub struct TicketValidator<'a> {
    pool: &'a PgPool,
    encryption_key: &'a [u8; 32],
    event_window: EventWindowGuard,
}

impl<'a> TicketValidator<'a> {
    pub fn new(pool: &'a PgPool, encryption_key: &'a [u8; 32]) -> Self {
        Self {
            pool,
            encryption_key,
            event_window: EventWindowGuard::default(),
        }
    }

    /// `identifier` is either a signed payload (base64) or a bare ticket
    /// number; both resolve to the same stored row. `action` only matters
    /// for multi-entry tickets - `None` defaults to `check_in` semantics.
    pub async fn validate(
        &self,
        tenant_id: TenantId,
        identifier: &str,
        method: ValidationMethod,
        system_id: &str,
        location: Option<&str>,
        mark_used: bool,
        action: Option<EntryAction>,
    ) -> CoreResult<ValidationOutcome> {
        let ticket = self.lookup(tenant_id, identifier).await?;

        let Some(ticket) = ticket else {
            return Ok(ValidationOutcome {
                valid: false,
                ticket_id: None,
                remaining_uses: None,
                reason: Some(ValidationFailureReason::NotFound),
            });
        };

        if identifier_looks_like_payload(identifier) {
            if let Err(reason) = self.check_authenticity(identifier, &ticket) {
                self.log_event(tenant_id, &ticket, false, method, system_id, location)
                    .await?;
                return Ok(ValidationOutcome {
                    valid: false,
                    ticket_id: Some(ticket.id),
                    remaining_uses: Some(ticket.remaining_uses()),
                    reason: Some(reason),
                });
            }
        }

        let event_starts_at = self.event_start(tenant_id, ticket.event_id).await?;
        let now = Utc::now();

        if let Some(reason) = self.status_failure(&ticket, now, event_starts_at) {
            self.log_event(tenant_id, &ticket, false, method, system_id, location)
                .await?;
            return Ok(ValidationOutcome {
                valid: false,
                ticket_id: Some(ticket.id),
                remaining_uses: Some(ticket.remaining_uses()),
                reason: Some(reason),
            });
        }

        let checks_in = !matches!(action, Some(EntryAction::CheckOut));

        if !mark_used || !checks_in {
            self.log_event(tenant_id, &ticket, true, method, system_id, location)
                .await?;
            return Ok(ValidationOutcome {
                valid: true,
                ticket_id: Some(ticket.id),
                remaining_uses: Some(ticket.remaining_uses()),
                reason: None,
            });
        }

        let updated = self.mark_used(tenant_id, &ticket).await?;
        self.log_event(tenant_id, &updated, true, method, system_id, location)
            .await?;

        Ok(ValidationOutcome {
            valid: true,
            ticket_id: Some(updated.id),
            remaining_uses: Some(updated.remaining_uses()),
            reason: None,
        })
    }

    /// Up to 100 identifiers. Each is validated independently; one
    /// failure never aborts the batch.
    pub async fn bulk_validate(
        &self,
        tenant_id: TenantId,
        identifiers: &[String],
        method: ValidationMethod,
        system_id: &str,
        mark_used: bool,
    ) -> CoreResult<Vec<ValidationOutcome>> {
        if identifiers.len() > 100 {
            return Err(CoreError::validation("bulk validate accepts at most 100 identifiers"));
        }
        let mut outcomes = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            outcomes.push(
                self.validate(tenant_id, identifier, method, system_id, None, mark_used, None)
                    .await?,
            );
        }
        Ok(outcomes)
    }

    async fn lookup(&self, tenant_id: TenantId, identifier: &str) -> CoreResult<Option<DigitalTicket>> {
        let row = if identifier_looks_like_payload(identifier) {
            let Ok(payload) = crypto::decrypt(self.encryption_key, identifier) else {
                return Ok(None);
            };
            sqlx::query(&format!("{TICKET_SELECT} WHERE tenant_id = $1 AND id = $2"))
                .bind(tenant_id)
                .bind(payload.ticket_id)
                .fetch_optional(self.pool)
                .await?
        } else {
            sqlx::query(&format!("{TICKET_SELECT} WHERE tenant_id = $1 AND ticket_number = $2"))
                .bind(tenant_id)
                .bind(identifier)
                .fetch_optional(self.pool)
                .await?
        };

        row.map(row_to_ticket).transpose()
    }

    fn check_authenticity(&self, identifier: &str, ticket: &DigitalTicket) -> Result<(), ValidationFailureReason> {
        let payload = crypto::decrypt(self.encryption_key, identifier)
            .map_err(|_| ValidationFailureReason::AuthenticityFailed)?;

        let same_identity = payload.ticket_id == ticket.id
            && payload.event_id == ticket.event_id
            && payload.customer_id == ticket.customer_id;
        if !same_identity {
            return Err(ValidationFailureReason::AuthenticityFailed);
        }

        let skew = (payload.created_at - ticket.created_at).abs();
        if skew > AUTHENTICITY_SKEW {
            return Err(ValidationFailureReason::AuthenticityFailed);
        }
        Ok(())
    }

    fn status_failure(
        &self,
        ticket: &DigitalTicket,
        now: DateTime<Utc>,
        event_starts_at: DateTime<Utc>,
    ) -> Option<ValidationFailureReason> {
        // Checked ahead of the status branch: a multi-entry ticket that hit
        // max_usage has already flipped to `used`, and that transition must
        // still report as a usage-limit rejection, not a generic inactive one.
        if ticket.usage_count >= ticket.max_usage {
            return Some(ValidationFailureReason::UsageLimitReached);
        }
        if ticket.status != TicketStatus::Active {
            return Some(ValidationFailureReason::NotActive);
        }
        if now < ticket.valid_from || now > ticket.valid_until {
            return Some(ValidationFailureReason::OutsideValidityWindow);
        }
        let earliest = event_starts_at - self.event_window.before_start;
        let latest = event_starts_at + self.event_window.after_start;
        if now < earliest || now > latest {
            return Some(ValidationFailureReason::OutsideEventWindow);
        }
        None
    }

    async fn event_start(&self, tenant_id: TenantId, event_id: EventId) -> CoreResult<DateTime<Utc>> {
        let row = sqlx::query("SELECT starts_at FROM events WHERE id = $1 AND tenant_id = $2")
            .bind(event_id)
            .bind(tenant_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("event {event_id}")))?;
        Ok(row.try_get("starts_at")?)
    }

    /// Atomically increments `usage_count`; transitions to `used` once it
    /// reaches `max_usage`, and stamps `first_used_at` on the first call.
    async fn mark_used(&self, tenant_id: TenantId, ticket: &DigitalTicket) -> CoreResult<DigitalTicket> {
        let row = sqlx::query(
            "UPDATE tickets SET \
                usage_count = usage_count + 1, \
                status = CASE WHEN usage_count + 1 >= max_usage THEN 'used' ELSE status END, \
                first_used_at = COALESCE(first_used_at, now()) \
             WHERE id = $1 AND tenant_id = $2 AND status = 'active' AND usage_count < max_usage \
             RETURNING id, tenant_id, transaction_id, transaction_item_id, event_id, customer_id, \
                       zone_id, seat_id, ticket_number, sequence, signed_payload, validation_hash, \
                       usage_count, max_usage, status, valid_from, valid_until, first_used_at, created_at",
        )
        .bind(ticket.id)
        .bind(tenant_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| CoreError::conflict(format!("ticket {} usage limit reached concurrently", ticket.id)))?;

        row_to_ticket(row)
    }

    async fn log_event(
        &self,
        tenant_id: TenantId,
        ticket: &DigitalTicket,
        result: bool,
        method: ValidationMethod,
        system_id: &str,
        location: Option<&str>,
    ) -> CoreResult<ValidationEvent> {
        let usage_before = if result { ticket.usage_count.saturating_sub(1).max(0) } else { ticket.usage_count };
        let row = sqlx::query(
            "INSERT INTO validation_events \
                (tenant_id, ticket_id, result, method, system_id, location, usage_before, usage_after, timestamp) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now()) \
             RETURNING id, tenant_id, ticket_id, result, method, system_id, location, \
                       usage_before, usage_after, timestamp",
        )
        .bind(tenant_id)
        .bind(ticket.id)
        .bind(result)
        .bind(method)
        .bind(system_id)
        .bind(location)
        .bind(usage_before)
        .bind(ticket.usage_count)
        .fetch_one(self.pool)
        .await?;

        Ok(ValidationEvent {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            ticket_id: row.try_get("ticket_id")?,
            result: row.try_get("result")?,
            method: row.try_get("method")?,
            system_id: row.try_get("system_id")?,
            location: row.try_get("location")?,
            usage_before: row.try_get("usage_before")?,
            usage_after: row.try_get("usage_after")?,
            timestamp: row.try_get("timestamp")?,
        })
    }
}

const TICKET_SELECT: &str = "SELECT id, tenant_id, transaction_id, transaction_item_id, event_id, customer_id, \
     zone_id, seat_id, ticket_number, sequence, signed_payload, validation_hash, \
     usage_count, max_usage, status, valid_from, valid_until, first_used_at, created_at \
     FROM tickets";

fn identifier_looks_like_payload(identifier: &str) -> bool {
    // Ticket numbers are `series-item-sequence`; signed payloads are
    // base64 and therefore never contain a literal '-' in that shape.
    !identifier.contains('-') || identifier.len() > 40
}

fn row_to_ticket(row: sqlx::postgres::PgRow) -> CoreResult<DigitalTicket> {
    Ok(DigitalTicket {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        transaction_id: row.try_get("transaction_id")?,
        transaction_item_id: row.try_get("transaction_item_id")?,
        event_id: row.try_get("event_id")?,
        customer_id: row.try_get("customer_id")?,
        zone_id: row.try_get("zone_id")?,
        seat_id: row.try_get("seat_id")?,
        ticket_number: row.try_get("ticket_number")?,
        sequence: row.try_get("sequence")?,
        signed_payload: row.try_get("signed_payload")?,
        validation_hash: row.try_get("validation_hash")?,
        usage_count: row.try_get("usage_count")?,
        max_usage: row.try_get("max_usage")?,
        status: row.try_get("status")?,
        valid_from: row.try_get("valid_from")?,
        valid_until: row.try_get("valid_until")?,
        first_used_at: row.try_get("first_used_at")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ticket_number_is_not_mistaken_for_a_payload() {
        assert!(!identifier_looks_like_payload("42-0-1"));
    }

    #[test]
    fn long_base64_identifier_is_treated_as_a_payload() {
        let fake_payload = "a".repeat(64);
        assert!(identifier_looks_like_payload(&fake_payload));
    }
}
