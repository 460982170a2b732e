//! Core error taxonomy.
//!
//! Every fallible core operation returns [`CoreError`]. The kinds mirror the
//! taxonomy the fiscal design calls for: callers may retry `Conflict` and
//! `Timeout`, everything else is final. The gateway layer converts a
//! `CoreError` into an HTTP response via [`IntoResponse`]; nothing below the
//! gateway ever constructs a `StatusCode` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Lost an optimistic race on a seat, hold, or counter.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referenced entity missing in tenant scope.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invariant violated by the request.
    #[error("validation: {0}")]
    Validation(String),

    /// User/tenant mismatch, closed fiscal day, voided series, expired hold at consume.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// An external dependency exceeded its deadline.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Programming invariant broken. Logged in full, surfaced as opaque 5xx.
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::AccessDenied(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(anyhow::anyhow!(msg.into()))
    }

    /// Machine-readable error code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// True if the caller may safely retry the request as-is.
    pub fn retriable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Timeout(_))
    }

    fn http_status(&self) -> StatusCode {
        match self {
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::AccessDenied(_) => StatusCode::FORBIDDEN,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// From sqlx so `?` works directly in repository methods.
impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CoreError::NotFound("row not found".to_string()),
            other => {
                tracing::error!(error = %other, "database error");
                CoreError::Internal(anyhow::Error::new(other))
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        if let CoreError::Internal(ref cause) = self {
            tracing::error!(error = %cause, "internal error");
        }
        let status = self.http_status();
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_kinds() {
        assert!(CoreError::conflict("x").retriable());
        assert!(CoreError::timeout("x").retriable());
        assert!(!CoreError::validation("x").retriable());
        assert!(!CoreError::not_found("x").retriable());
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(CoreError::conflict("x").code(), "CONFLICT");
        assert_eq!(CoreError::access_denied("x").code(), "ACCESS_DENIED");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: CoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
