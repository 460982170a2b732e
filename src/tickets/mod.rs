//! Digital ticket issuance and validation.

pub mod crypto;
pub mod issuer;
pub mod models;
pub mod validator;

pub use issuer::TicketIssuer;
pub use models::{DigitalTicket, EntryAction, TicketStatus, ValidationEvent, ValidationMethod};
pub use validator::{TicketValidator, ValidationFailureReason, ValidationOutcome};
