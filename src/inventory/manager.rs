//! Hold contracts. Every transition is a single conditional
//! `UPDATE ... WHERE state = $expected`, so two concurrent callers racing on
//! the same seat or zone are serialized by Postgres row locking rather than
//! an in-process mutex - this process is not the only writer, and a
//! second instance of it must serialize the same way.

use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::audit::AuditRepository;
use crate::core_types::{HoldId, SeatId, TenantId, TransactionId, UserId, ZoneId};
use crate::error::{CoreError, CoreResult};
use crate::tenant::TenantCtx;

use super::models::{Hold, HoldKind, HoldState};

pub struct HoldManager<'a> {
    pool: &'a PgPool,
}

impl<'a> HoldManager<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Numbered seat hold: atomic CAS `available → held`.
    pub async fn hold_seat(
        &self,
        ctx: &TenantCtx,
        zone_id: ZoneId,
        seat_id: SeatId,
        owner: &str,
        ttl: Duration,
        kind: HoldKind,
    ) -> CoreResult<Hold> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE seats SET state = 'held' \
             WHERE id = $1 AND tenant_id = $2 AND state = 'available'",
        )
        .bind(seat_id)
        .bind(ctx.tenant_id())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(CoreError::conflict(format!("seat {seat_id} is not available")));
        }

        let expires_at = Utc::now() + ttl;
        let row = sqlx::query(
            "INSERT INTO holds (tenant_id, zone_id, seat_id, quantity, owner, kind, expires_at, state) \
             VALUES ($1, $2, $3, 1, $4, $5, $6, 'active') \
             RETURNING id, tenant_id, zone_id, seat_id, quantity, owner, kind, expires_at, state",
        )
        .bind(ctx.tenant_id())
        .bind(zone_id)
        .bind(seat_id)
        .bind(owner)
        .bind(kind)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        let hold = Self::row_to_hold(&row)?;
        AuditRepository::record(
            &mut tx,
            ctx.tenant_id(),
            ctx.user_id(),
            "hold.created",
            "hold",
            &hold.id.to_string(),
            None,
            None,
            None,
            &format!("seat {seat_id} held by {owner}"),
        )
        .await?;
        tx.commit().await?;
        Ok(hold)
    }

    /// General-admission hold: locks the zone row, recomputes
    /// `sold + Σ active_holds.quantity`, and inserts only if the new total
    /// still fits capacity.
    pub async fn hold_general(
        &self,
        ctx: &TenantCtx,
        zone_id: ZoneId,
        quantity: i32,
        owner: &str,
        ttl: Duration,
        kind: HoldKind,
    ) -> CoreResult<Hold> {
        if quantity <= 0 {
            return Err(CoreError::validation("hold quantity must be positive"));
        }

        let mut tx = self.pool.begin().await?;

        let zone = sqlx::query("SELECT capacity, sold FROM zones WHERE id = $1 AND tenant_id = $2 FOR UPDATE")
            .bind(zone_id)
            .bind(ctx.tenant_id())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("zone {zone_id}")))?;
        let capacity: i32 = zone.try_get("capacity")?;
        let sold: i32 = zone.try_get("sold")?;

        let held_row = sqlx::query(
            "SELECT COALESCE(SUM(quantity), 0) AS held FROM holds \
             WHERE tenant_id = $1 AND zone_id = $2 AND state = 'active' AND expires_at >= now()",
        )
        .bind(ctx.tenant_id())
        .bind(zone_id)
        .fetch_one(&mut *tx)
        .await?;
        let currently_held: i64 = held_row.try_get("held")?;

        if sold as i64 + currently_held + quantity as i64 > capacity as i64 {
            return Err(CoreError::conflict(format!("zone {zone_id} has insufficient capacity")));
        }

        let expires_at = Utc::now() + ttl;
        let row = sqlx::query(
            "INSERT INTO holds (tenant_id, zone_id, seat_id, quantity, owner, kind, expires_at, state) \
             VALUES ($1, $2, NULL, $3, $4, $5, $6, 'active') \
             RETURNING id, tenant_id, zone_id, seat_id, quantity, owner, kind, expires_at, state",
        )
        .bind(ctx.tenant_id())
        .bind(zone_id)
        .bind(quantity)
        .bind(owner)
        .bind(kind)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        let hold = Self::row_to_hold(&row)?;
        AuditRepository::record(
            &mut tx,
            ctx.tenant_id(),
            ctx.user_id(),
            "hold.created",
            "hold",
            &hold.id.to_string(),
            None,
            None,
            None,
            &format!("{quantity} held in zone {zone_id} by {owner}"),
        )
        .await?;
        tx.commit().await?;
        Ok(hold)
    }

    /// `active → released`. Idempotent: releasing an already-terminal hold
    /// is a no-op, not an error.
    pub async fn release(&self, ctx: &TenantCtx, hold_id: HoldId) -> CoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let released = self.release_in_tx(&mut tx, ctx.tenant_id(), hold_id).await?;
        if released {
            AuditRepository::record(
                &mut tx,
                ctx.tenant_id(),
                ctx.user_id(),
                "hold.released",
                "hold",
                &hold_id.to_string(),
                None,
                None,
                None,
                "hold released",
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn release_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: TenantId,
        hold_id: HoldId,
    ) -> CoreResult<bool> {
        let row = sqlx::query(
            "UPDATE holds SET state = 'released' \
             WHERE id = $1 AND tenant_id = $2 AND state = 'active' \
             RETURNING seat_id",
        )
        .bind(hold_id)
        .bind(tenant_id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(row) = row else {
            return Ok(false); // already terminal: idempotent no-op
        };

        if let Some(seat_id) = row.try_get::<Option<SeatId>, _>("seat_id")? {
            sqlx::query(
                "UPDATE seats SET state = 'available' WHERE id = $1 AND tenant_id = $2 AND state = 'held'",
            )
            .bind(seat_id)
            .bind(tenant_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(true)
    }

    /// Only succeeds while `active` and not yet past `expires_at`.
    pub async fn extend(&self, ctx: &TenantCtx, hold_id: HoldId, new_ttl: Duration) -> CoreResult<Hold> {
        let new_expiry = Utc::now() + new_ttl;
        let row = sqlx::query(
            "UPDATE holds SET expires_at = $1 \
             WHERE id = $2 AND tenant_id = $3 AND state = 'active' AND expires_at >= now() \
             RETURNING id, tenant_id, zone_id, seat_id, quantity, owner, kind, expires_at, state",
        )
        .bind(new_expiry)
        .bind(hold_id)
        .bind(ctx.tenant_id())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| CoreError::conflict(format!("hold {hold_id} is not live")))?;

        Self::row_to_hold(&row)
    }

    /// Called inside the checkout DB transaction. Re-checks
    /// liveness under the same lock the caller already holds and aborts the
    /// whole transaction (by returning an error the caller propagates) if
    /// the hold is no longer active - correctness never depends on the
    /// expirer having run.
    #[allow(clippy::too_many_arguments)]
    pub async fn consume(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: TenantId,
        hold_id: HoldId,
        transaction_id: TransactionId,
        user_id: Option<UserId>,
    ) -> CoreResult<Hold> {
        let row = sqlx::query(
            "UPDATE holds SET state = 'consumed' \
             WHERE id = $1 AND tenant_id = $2 AND state = 'active' AND expires_at >= now() \
             RETURNING id, tenant_id, zone_id, seat_id, quantity, owner, kind, expires_at, state",
        )
        .bind(hold_id)
        .bind(tenant_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| CoreError::access_denied(format!("hold {hold_id} expired or already finalized")))?;

        let hold = Self::row_to_hold(&row)?;

        if let Some(seat_id) = hold.seat_id {
            let updated = sqlx::query(
                "UPDATE seats SET state = 'sold' WHERE id = $1 AND tenant_id = $2 AND state = 'held'",
            )
            .bind(seat_id)
            .bind(tenant_id)
            .execute(&mut **tx)
            .await?;
            if updated.rows_affected() == 0 {
                return Err(CoreError::internal(format!(
                    "seat {seat_id} was not held at consume time"
                )));
            }
        } else {
            sqlx::query("UPDATE zones SET sold = sold + $1 WHERE id = $2 AND tenant_id = $3")
                .bind(hold.quantity)
                .bind(hold.zone_id)
                .bind(tenant_id)
                .execute(&mut **tx)
                .await?;
        }

        AuditRepository::record(
            tx,
            tenant_id,
            user_id,
            "hold.consumed",
            "hold",
            &hold_id.to_string(),
            None,
            None,
            None,
            &format!("hold consumed by transaction {transaction_id}"),
        )
        .await?;

        Ok(hold)
    }

    /// Partial-payment path: moves a numbered seat from
    /// `held` to `reserved` without consuming the hold, so the cart can
    /// finish collecting payment in a later call. General-admission lines
    /// have no seat row to move and are not valid here.
    pub async fn reserve(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: TenantId,
        hold_id: HoldId,
    ) -> CoreResult<Hold> {
        let row = sqlx::query(
            "SELECT id, tenant_id, zone_id, seat_id, quantity, owner, kind, expires_at, state \
             FROM holds WHERE id = $1 AND tenant_id = $2 AND state = 'active' AND expires_at >= now()",
        )
        .bind(hold_id)
        .bind(tenant_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| CoreError::access_denied(format!("hold {hold_id} is not live")))?;

        let hold = Self::row_to_hold(&row)?;
        let seat_id = hold
            .seat_id
            .ok_or_else(|| CoreError::validation("only numbered holds can be reserved"))?;

        let updated = sqlx::query(
            "UPDATE seats SET state = 'reserved' WHERE id = $1 AND tenant_id = $2 AND state = 'held'",
        )
        .bind(seat_id)
        .bind(tenant_id)
        .execute(&mut **tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(CoreError::internal(format!("seat {seat_id} was not held at reserve time")));
        }

        Ok(hold)
    }

    /// Abandons a stale reservation (called by the reservation sweeper): releases the hold and
    /// returns the seat `reserved → available`, the mirror image of
    /// [`Self::reserve`].
    pub async fn abandon_reservation(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: TenantId,
        hold_id: HoldId,
    ) -> CoreResult<()> {
        let row = sqlx::query("UPDATE holds SET state = 'released' WHERE id = $1 AND tenant_id = $2 AND state = 'active' RETURNING seat_id")
            .bind(hold_id)
            .bind(tenant_id)
            .fetch_optional(&mut **tx)
            .await?;

        let Some(row) = row else {
            return Ok(()); // already terminal: idempotent no-op
        };

        if let Some(seat_id) = row.try_get::<Option<SeatId>, _>("seat_id")? {
            sqlx::query(
                "UPDATE seats SET state = 'available' WHERE id = $1 AND tenant_id = $2 AND state = 'reserved'",
            )
            .bind(seat_id)
            .bind(tenant_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Completes a reservation once the remaining balance settles: consumes
    /// the hold (still `active` until now) and moves the seat `reserved →
    /// sold`.
    pub async fn finalize_reservation(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: TenantId,
        hold_id: HoldId,
        transaction_id: TransactionId,
    ) -> CoreResult<Hold> {
        let row = sqlx::query(
            "UPDATE holds SET state = 'consumed' \
             WHERE id = $1 AND tenant_id = $2 AND state = 'active' \
             RETURNING id, tenant_id, zone_id, seat_id, quantity, owner, kind, expires_at, state",
        )
        .bind(hold_id)
        .bind(tenant_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| CoreError::access_denied(format!("hold {hold_id} expired or already finalized")))?;

        let hold = Self::row_to_hold(&row)?;
        let seat_id = hold
            .seat_id
            .ok_or_else(|| CoreError::validation("only numbered holds go through reservation"))?;

        let updated = sqlx::query(
            "UPDATE seats SET state = 'sold' WHERE id = $1 AND tenant_id = $2 AND state = 'reserved'",
        )
        .bind(seat_id)
        .bind(tenant_id)
        .execute(&mut **tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(CoreError::internal(format!(
                "seat {seat_id} was not reserved at finalize time"
            )));
        }

        let _ = transaction_id;
        Ok(hold)
    }

    /// Background expirer's sweep: move every `active` hold past its
    /// `expires_at` to `expired` and release the underlying capacity.
    /// Returns the ids of holds it expired, for audit logging by the
    /// caller.
    pub async fn expire_due_holds(&self, tenant_id: TenantId) -> CoreResult<Vec<HoldId>> {
        let mut tx = self.pool.begin().await?;

        let due = sqlx::query(
            "SELECT id, seat_id FROM holds \
             WHERE tenant_id = $1 AND state = 'active' AND expires_at < now() \
             FOR UPDATE",
        )
        .bind(tenant_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut expired_ids = Vec::with_capacity(due.len());
        for row in &due {
            let hold_id: HoldId = row.try_get("id")?;
            sqlx::query("UPDATE holds SET state = 'expired' WHERE id = $1")
                .bind(hold_id)
                .execute(&mut *tx)
                .await?;

            if let Some(seat_id) = row.try_get::<Option<SeatId>, _>("seat_id")? {
                sqlx::query(
                    "UPDATE seats SET state = 'available' WHERE id = $1 AND tenant_id = $2 AND state = 'held'",
                )
                .bind(seat_id)
                .bind(tenant_id)
                .execute(&mut *tx)
                .await?;
            }
            expired_ids.push(hold_id);
        }

        tx.commit().await?;
        Ok(expired_ids)
    }

    /// Effective availability for a general-admission zone at this instant:
    /// `capacity − sold − Σ active_holds.quantity`.
    pub async fn available_general(&self, ctx: &TenantCtx, zone_id: ZoneId) -> CoreResult<i32> {
        let zone = sqlx::query("SELECT capacity, sold FROM zones WHERE id = $1 AND tenant_id = $2")
            .bind(zone_id)
            .bind(ctx.tenant_id())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("zone {zone_id}")))?;
        let capacity: i32 = zone.try_get("capacity")?;
        let sold: i32 = zone.try_get("sold")?;

        let held_row = sqlx::query(
            "SELECT COALESCE(SUM(quantity), 0) AS held FROM holds \
             WHERE tenant_id = $1 AND zone_id = $2 AND state = 'active' AND expires_at >= now()",
        )
        .bind(ctx.tenant_id())
        .bind(zone_id)
        .fetch_one(self.pool)
        .await?;
        let held: i64 = held_row.try_get("held")?;

        Ok(capacity - sold - held as i32)
    }

    fn row_to_hold(row: &sqlx::postgres::PgRow) -> CoreResult<Hold> {
        Ok(Hold {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            zone_id: row.try_get("zone_id")?,
            seat_id: row.try_get("seat_id")?,
            quantity: row.try_get("quantity")?,
            owner: row.try_get("owner")?,
            kind: row.try_get("kind")?,
            expires_at: row.try_get("expires_at")?,
            state: row.try_get("state")?,
        })
    }
}
