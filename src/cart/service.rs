//! Cart-line management: a thin wrapper over [`HoldManager`] that scopes
//! holds to a cart by using the cart id as the hold's `owner` token. A cart
//! has no row of its own until checkout opens a `Transaction` for it - it
//! only exists as the set of active holds sharing that owner string.

use chrono::Duration;
use sqlx::PgPool;

use crate::core_types::{CartId, HoldId, SeatId, ZoneId};
use crate::error::CoreResult;
use crate::inventory::{Hold, HoldKind, HoldManager};
use crate::tenant::TenantCtx;

pub struct CartService<'a> {
    holds: HoldManager<'a>,
}

impl<'a> CartService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self {
            holds: HoldManager::new(pool),
        }
    }

    pub async fn add_seat(
        &self,
        ctx: &TenantCtx,
        cart_id: CartId,
        zone_id: ZoneId,
        seat_id: SeatId,
        ttl: Duration,
    ) -> CoreResult<Hold> {
        self.holds
            .hold_seat(ctx, zone_id, seat_id, &cart_id.to_string(), ttl, HoldKind::Standard)
            .await
    }

    pub async fn add_general(
        &self,
        ctx: &TenantCtx,
        cart_id: CartId,
        zone_id: ZoneId,
        quantity: i32,
        ttl: Duration,
    ) -> CoreResult<Hold> {
        self.holds
            .hold_general(ctx, zone_id, quantity, &cart_id.to_string(), ttl, HoldKind::Standard)
            .await
    }

    pub async fn remove_line(&self, ctx: &TenantCtx, hold_id: HoldId) -> CoreResult<()> {
        self.holds.release(ctx, hold_id).await
    }

    pub async fn extend(&self, ctx: &TenantCtx, hold_id: HoldId, ttl: Duration) -> CoreResult<Hold> {
        self.holds.extend(ctx, hold_id, ttl).await
    }
}
