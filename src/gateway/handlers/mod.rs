//! HTTP handlers, one module per domain area. Every handler returns
//! `CoreResult<Json<T>>` directly - [`crate::error::CoreError`] already
//! implements `IntoResponse`, so there is no separate `ApiResult` wrapper
//! to maintain alongside it.

pub mod audit;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod customers;
pub mod fiscal;
pub mod health;
pub mod pricing;
pub mod tickets;

pub use health::{health_check, HealthResponse};
