//! Catalog persistence, using runtime-bound `sqlx::query` (no compile-time
//! `query!` macro, since there is no `.sqlx` offline cache checked into
//! this repo and no live database available at build time).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use crate::core_types::{EventId, SeatId, VenueId, ZoneId};
use crate::error::{CoreError, CoreResult};
use crate::tenant::TenantCtx;

use super::models::{Event, EventStatus, Seat, Venue, Zone, ZoneType};

pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_venue(
        &self,
        ctx: &TenantCtx,
        name: &str,
        address: &str,
    ) -> CoreResult<Venue> {
        let row = sqlx::query(
            "INSERT INTO venues (tenant_id, name, address) VALUES ($1, $2, $3) \
             RETURNING id, tenant_id, name, address",
        )
        .bind(ctx.tenant_id())
        .bind(name)
        .bind(address)
        .fetch_one(self.pool)
        .await?;

        Ok(Venue {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            name: row.try_get("name")?,
            address: row.try_get("address")?,
        })
    }

    pub async fn create_event(
        &self,
        ctx: &TenantCtx,
        venue_id: VenueId,
        name: &str,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> CoreResult<Event> {
        if starts_at >= ends_at {
            return Err(CoreError::validation("event start must be before end"));
        }

        let row = sqlx::query(
            "INSERT INTO events (tenant_id, venue_id, name, starts_at, ends_at, status) \
             VALUES ($1, $2, $3, $4, $5, 'draft') \
             RETURNING id, tenant_id, venue_id, name, starts_at, ends_at, status",
        )
        .bind(ctx.tenant_id())
        .bind(venue_id)
        .bind(name)
        .bind(starts_at)
        .bind(ends_at)
        .fetch_one(self.pool)
        .await?;

        Self::row_to_event(&row)
    }

    pub async fn find_event(&self, ctx: &TenantCtx, event_id: EventId) -> CoreResult<Event> {
        let row = sqlx::query(
            "SELECT id, tenant_id, venue_id, name, starts_at, ends_at, status \
             FROM events WHERE id = $1 AND tenant_id = $2",
        )
        .bind(event_id)
        .bind(ctx.tenant_id())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("event {event_id}")))?;

        Self::row_to_event(&row)
    }

    /// Advances event status, rejecting any transition not allowed by
    /// `EventStatus::can_transition_to`.
    pub async fn transition_event_status(
        &self,
        ctx: &TenantCtx,
        event_id: EventId,
        next: EventStatus,
    ) -> CoreResult<Event> {
        let current = self.find_event(ctx, event_id).await?;
        if !current.status.can_transition_to(next) {
            return Err(CoreError::validation(format!(
                "cannot transition event from {:?} to {:?}",
                current.status, next
            )));
        }

        let row = sqlx::query(
            "UPDATE events SET status = $1 WHERE id = $2 AND tenant_id = $3 \
             RETURNING id, tenant_id, venue_id, name, starts_at, ends_at, status",
        )
        .bind(next)
        .bind(event_id)
        .bind(ctx.tenant_id())
        .fetch_one(self.pool)
        .await?;

        Self::row_to_event(&row)
    }

    /// Creates a zone. For `numbered` zones the caller must follow with
    /// [`Self::generate_seats`] before the zone is sellable; `capacity` is
    /// validated against the generated seat count at that point, not here,
    /// since seats may arrive via an explicit list.
    pub async fn create_zone(
        &self,
        ctx: &TenantCtx,
        event_id: EventId,
        name: &str,
        zone_type: ZoneType,
        capacity: i32,
        base_price: Decimal,
    ) -> CoreResult<Zone> {
        if capacity < 0 {
            return Err(CoreError::validation("zone capacity must be >= 0"));
        }
        if base_price.is_sign_negative() {
            return Err(CoreError::validation("zone base_price must be non-negative"));
        }

        let event = self.find_event(ctx, event_id).await?;
        if event.status.locks_capacity() {
            return Err(CoreError::validation(
                "cannot add a zone to an event that has left draft",
            ));
        }

        let row = sqlx::query(
            "INSERT INTO zones (tenant_id, event_id, name, zone_type, capacity, base_price) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, tenant_id, event_id, name, zone_type, capacity, base_price",
        )
        .bind(ctx.tenant_id())
        .bind(event_id)
        .bind(name)
        .bind(zone_type)
        .bind(capacity)
        .bind(base_price)
        .fetch_one(self.pool)
        .await?;

        Self::row_to_zone(&row)
    }

    pub async fn find_zone(&self, ctx: &TenantCtx, zone_id: ZoneId) -> CoreResult<Zone> {
        let row = sqlx::query(
            "SELECT id, tenant_id, event_id, name, zone_type, capacity, base_price \
             FROM zones WHERE id = $1 AND tenant_id = $2",
        )
        .bind(zone_id)
        .bind(ctx.tenant_id())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("zone {zone_id}")))?;

        Self::row_to_zone(&row)
    }

    pub async fn find_seat(&self, ctx: &TenantCtx, seat_id: SeatId) -> CoreResult<Seat> {
        let row = sqlx::query(
            "SELECT id, tenant_id, zone_id, row, number, label, state, table_id \
             FROM seats WHERE id = $1 AND tenant_id = $2",
        )
        .bind(seat_id)
        .bind(ctx.tenant_id())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("seat {seat_id}")))?;

        Self::row_to_seat(&row)
    }

    /// Generates seats for a numbered zone from `rows × seats_per_row` and
    /// asserts the result matches the zone's declared `capacity`.
    /// Idempotency (re-running on an already-seeded zone) is the caller's
    /// responsibility; this always inserts.
    pub async fn generate_seats(
        &self,
        ctx: &TenantCtx,
        zone_id: ZoneId,
        rows: &[String],
        seats_per_row: i32,
    ) -> CoreResult<Vec<Seat>> {
        let zone = self.find_zone(ctx, zone_id).await?;
        if zone.zone_type != ZoneType::Numbered {
            return Err(CoreError::validation("only numbered zones have seats"));
        }
        let total = rows.len() as i32 * seats_per_row;
        if total != zone.capacity {
            return Err(CoreError::validation(format!(
                "generated seat count {total} does not match zone capacity {}",
                zone.capacity
            )));
        }

        let mut seats = Vec::with_capacity(total as usize);
        for row_label in rows {
            for number in 1..=seats_per_row {
                let label = format!("{row_label}-{number}");
                let record = sqlx::query(
                    "INSERT INTO seats (tenant_id, zone_id, row, number, label, state) \
                     VALUES ($1, $2, $3, $4, $5, 'available') \
                     RETURNING id, tenant_id, zone_id, row, number, label, state, table_id",
                )
                .bind(ctx.tenant_id())
                .bind(zone_id)
                .bind(row_label)
                .bind(number)
                .bind(&label)
                .fetch_one(self.pool)
                .await?;
                seats.push(Self::row_to_seat(&record)?);
            }
        }
        Ok(seats)
    }

    /// Soft-disables a seat. Seats are never renumbered once generated.
    pub async fn block_seat(&self, ctx: &TenantCtx, seat_id: SeatId) -> CoreResult<Seat> {
        let row = sqlx::query(
            "UPDATE seats SET state = 'blocked' WHERE id = $1 AND tenant_id = $2 AND state = 'available' \
             RETURNING id, tenant_id, zone_id, row, number, label, state, table_id",
        )
        .bind(seat_id)
        .bind(ctx.tenant_id())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| CoreError::conflict(format!("seat {seat_id} is not available to block")))?;

        Self::row_to_seat(&row)
    }

    fn row_to_event(row: &sqlx::postgres::PgRow) -> CoreResult<Event> {
        Ok(Event {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            venue_id: row.try_get("venue_id")?,
            name: row.try_get("name")?,
            starts_at: row.try_get("starts_at")?,
            ends_at: row.try_get("ends_at")?,
            status: row.try_get("status")?,
        })
    }

    fn row_to_zone(row: &sqlx::postgres::PgRow) -> CoreResult<Zone> {
        Ok(Zone {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            event_id: row.try_get("event_id")?,
            name: row.try_get("name")?,
            zone_type: row.try_get("zone_type")?,
            capacity: row.try_get("capacity")?,
            base_price: row.try_get("base_price")?,
        })
    }

    fn row_to_seat(row: &sqlx::postgres::PgRow) -> CoreResult<Seat> {
        Ok(Seat {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            zone_id: row.try_get("zone_id")?,
            row: row.try_get("row")?,
            number: row.try_get("number")?,
            label: row.try_get("label")?,
            state: row.try_get("state")?,
            table_id: row.try_get("table_id")?,
        })
    }
}

/// `SeatState` helpers used by the catalog layer directly (inventory owns
/// the transition contracts; this just reads).
impl Seat {
    pub fn is_available(&self) -> bool {
        self.state.is_saleable()
    }
}
