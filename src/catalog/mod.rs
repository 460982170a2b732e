//! Catalog: venues, events, zones, seats, tables.
//!
//! Mostly CRUD, but the invariants are enforced here, not left to storage
//! constraints: capacity must equal seat count for
//! numbered zones, event status only moves forward, and capacity-affecting
//! changes are rejected once an event is active.

pub mod models;
pub mod repository;

pub use models::{Event, EventStatus, Seat, SeatState, Table, Venue, Zone, ZoneType};
pub use repository::CatalogRepository;
