//! Notification outbox: enqueue-only interface to external senders.
//! The core's obligation ends at persisting the row; an external worker
//! outside this crate polls for `pending` rows and flips their status.

pub mod models;
pub mod repository;

pub use models::{Channel, NotificationCategory, OutboxEntry, OutboxStatus};
pub use repository::OutboxRepository;
