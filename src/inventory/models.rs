use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::{HoldId, SeatId, TenantId, ZoneId};

/// A small state enum with `is_terminal`, stored as text rather than a
/// `SMALLINT` encoding since hold states don't need to sort numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum HoldState {
    Active,
    Consumed,
    Expired,
    Released,
}

impl HoldState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            HoldState::Consumed | HoldState::Expired | HoldState::Released
        )
    }
}

/// Offline-block holds share every mechanic with standard carts (same
/// expiry and release semantics) but settle through
/// reconciliation rather than payment, so the distinction only matters to
/// the checkout orchestrator's reservation branch, not to the state machine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum HoldKind {
    Standard,
    OfflineBlock,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Hold {
    pub id: HoldId,
    pub tenant_id: TenantId,
    pub zone_id: ZoneId,
    /// `Some` for a numbered seat hold, `None` for general admission.
    pub seat_id: Option<SeatId>,
    /// Only meaningful for general admission; `1` for numbered holds.
    pub quantity: i32,
    pub owner: String,
    pub kind: HoldKind,
    pub expires_at: DateTime<Utc>,
    pub state: HoldState,
}

impl Hold {
    pub fn is_numbered(&self) -> bool {
        self.seat_id.is_some()
    }

    /// A hold whose `expires_at` is in the past must never be observed as
    /// active by a liveness check, independent of whether the background
    /// expirer has run yet.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.state == HoldState::Active && self.expires_at >= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn sample(state: HoldState, expires_in: Duration) -> Hold {
        Hold {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            zone_id: Uuid::new_v4(),
            seat_id: None,
            quantity: 3,
            owner: "cart-1".to_string(),
            kind: HoldKind::Standard,
            expires_at: Utc::now() + expires_in,
            state,
        }
    }

    #[test]
    fn past_expiry_is_never_live_even_if_state_says_active() {
        let hold = sample(HoldState::Active, Duration::seconds(-1));
        assert!(!hold.is_live(Utc::now()));
    }

    #[test]
    fn terminal_states_cover_every_non_active_variant() {
        assert!(!HoldState::Active.is_terminal());
        assert!(HoldState::Consumed.is_terminal());
        assert!(HoldState::Expired.is_terminal());
        assert!(HoldState::Released.is_terminal());
    }
}
