use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::{EventId, SeatId, TableId, TenantId, VenueId, ZoneId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Venue {
    pub id: VenueId,
    pub tenant_id: TenantId,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Active,
    Closed,
    Cancelled,
}

impl EventStatus {
    /// Valid forward transitions: `draft → active → (closed | cancelled)`.
    /// No transition moves backward and there is no exit from
    /// `closed`/`cancelled`.
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        matches!(
            (self, next),
            (EventStatus::Draft, EventStatus::Active)
                | (EventStatus::Active, EventStatus::Closed)
                | (EventStatus::Active, EventStatus::Cancelled)
        )
    }

    /// Capacity-affecting catalog changes are rejected once the event has
    /// left `draft`.
    pub fn locks_capacity(self) -> bool {
        !matches!(self, EventStatus::Draft)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub id: EventId,
    pub tenant_id: TenantId,
    pub venue_id: VenueId,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: EventStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum ZoneType {
    Numbered,
    General,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Zone {
    pub id: ZoneId,
    pub tenant_id: TenantId,
    pub event_id: EventId,
    pub name: String,
    pub zone_type: ZoneType,
    pub capacity: i32,
    pub base_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum SeatState {
    Available,
    Held,
    Reserved,
    Sold,
    Refunded,
    Blocked,
}

impl SeatState {
    pub fn is_saleable(self) -> bool {
        matches!(self, SeatState::Available)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Seat {
    pub id: SeatId,
    pub tenant_id: TenantId,
    pub zone_id: ZoneId,
    pub row: String,
    pub number: i32,
    pub label: String,
    pub state: SeatState,
    pub table_id: Option<TableId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Table {
    pub id: TableId,
    pub tenant_id: TenantId,
    pub zone_id: ZoneId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_status_only_moves_forward() {
        assert!(EventStatus::Draft.can_transition_to(EventStatus::Active));
        assert!(EventStatus::Active.can_transition_to(EventStatus::Closed));
        assert!(EventStatus::Active.can_transition_to(EventStatus::Cancelled));
        assert!(!EventStatus::Active.can_transition_to(EventStatus::Draft));
        assert!(!EventStatus::Closed.can_transition_to(EventStatus::Active));
        assert!(!EventStatus::Cancelled.can_transition_to(EventStatus::Active));
    }

    #[test]
    fn capacity_locked_outside_draft() {
        assert!(!EventStatus::Draft.locks_capacity());
        assert!(EventStatus::Active.locks_capacity());
        assert!(EventStatus::Closed.locks_capacity());
    }
}
