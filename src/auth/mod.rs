//! User accounts and JWT issuance (ambient - ticket-holding users
//! authenticate the same way as operators; tenant membership is resolved
//! separately by [`crate::tenant`]).

pub mod middleware;
pub mod service;

pub use middleware::jwt_auth_middleware;
pub use service::{AuthResponse, Claims, LoginRequest, RegisterRequest, UserAuthService};
