//! Deterministic pricing resolver.

pub mod models;
pub mod repository;
pub mod resolver;

pub use models::{ModifierType, PriceStage, RowPricing};
pub use resolver::{resolve_price, AppliedModifier, PriceQuote};
