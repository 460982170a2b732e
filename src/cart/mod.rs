//! Cart and checkout orchestration: the piece that bundles holds
//! into a transaction and drives it through payment, fiscal allocation,
//! ticket issuance and audit - all inside one DB transaction once payment
//! settles, as an explicit orchestrator step rather than an implicit hook.

pub mod checkout;
pub mod models;
pub mod payment;
pub mod repository;
pub mod service;

pub use checkout::{CheckoutLine, CheckoutOrchestrator, CheckoutOutcome};
pub use models::{Transaction, TransactionItem, TransactionStatus};
pub use payment::{ChargeRequest, ChargeResult, ManualSettlementProcessor, PaymentProcessor};
pub use repository::TransactionRepository;
pub use service::CartService;
