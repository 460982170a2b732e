//! Append-only audit log: an immutable record of every state-changing
//! operation, backed by Postgres rather than a flat file so it stays
//! queryable and tenant-partitioned (`GET /audit?filters…`).

pub mod models;
pub mod repository;

pub use models::AuditEntry;
pub use repository::AuditRepository;
