//! Core identifier types used throughout the system.
//!
//! These are type aliases, not newtypes: every repository and service
//! function takes `tenant_id` as a mandatory leading argument, which is the
//! actual scoping mechanism (see [`crate::tenant`]), not the type system.

use uuid::Uuid;

pub type TenantId = Uuid;
pub type UserId = Uuid;
pub type VenueId = Uuid;
pub type EventId = Uuid;
pub type ZoneId = Uuid;
pub type SeatId = Uuid;
pub type TableId = Uuid;
pub type PriceStageId = Uuid;
pub type RowPricingId = Uuid;
pub type TaxConfigId = Uuid;
pub type HoldId = Uuid;
pub type CartId = Uuid;
pub type TransactionId = Uuid;
pub type TransactionItemId = Uuid;
pub type FiscalSeriesId = Uuid;
pub type FiscalDayId = Uuid;
pub type FiscalReportId = Uuid;
pub type TaxCalculationHistoryId = Uuid;
pub type AuditEntryId = Uuid;
pub type TicketId = Uuid;
pub type ValidationEventId = Uuid;
pub type CustomerId = Uuid;
pub type OutboxEntryId = Uuid;

/// Sequence number, monotonic within a scope (fiscal series, insertion order).
pub type SeqNum = i64;
