//! Tenant context and scoping.
//!
//! Every inbound operation resolves a tenant before any domain call reaches
//! a repository. The resolved value travels as an explicit argument -
//! `TenantCtx` - never as a threadlocal or process-global. It is a
//! programming error for any repository method to read tenant-scoped rows
//! without one.

pub mod context;
pub mod middleware;
pub mod repository;

pub use context::TenantCtx;
pub use repository::{Tenant, TenantRepository};
