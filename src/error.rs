//! Error types for the cache
//!
//! Provides unified error handling using thiserror, plus the predicate every
//! caller uses to recognise a miss regardless of which tier produced it.

use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Boxed driver error carried by [`CacheError::Backend`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type shared by every cache tier.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent or logically expired
    #[error("cache: key not found: {0}")]
    KeyNotFound(String),

    /// Generic not-found sentinel, for callers that have no key at hand
    #[error("cache: key not found")]
    NotFound,

    /// Value could not be encoded or decoded
    #[error("cache: serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Counter operation on a value that does not hold an integer
    #[error("cache: value at key {0} is not an integer")]
    NotAnInteger(String),

    /// Counter operation would leave the i64 range
    #[error("cache: increment or decrement at key {0} would overflow")]
    Overflow(String),

    /// Transport or driver failure of a non-memory tier
    #[error("cache: backend error: {0}")]
    Backend(#[source] BoxError),

    /// Operation on a store that has been closed
    #[error("cache: store is closed")]
    Closed,

    /// Request rejected by the HTTP layer before reaching a tier
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Construction-time misconfiguration
    #[error("cache: invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Wraps an arbitrary driver error as [`CacheError::Backend`].
    pub fn backend(err: impl Into<BoxError>) -> Self {
        CacheError::Backend(err.into())
    }

    /// Returns true for both not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::KeyNotFound(_) | CacheError::NotFound)
    }
}

// == Not Found Predicate ==
/// Returns true if `err`, or any error in its source chain, is a cache miss.
///
/// Works through wrappers such as `anyhow::Error` context, so application code
/// can branch on a miss without knowing which tier reported it.
pub fn is_not_found(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(cache_err) = err.downcast_ref::<CacheError>() {
            if cache_err.is_not_found() {
                return true;
            }
        }
        current = err.source();
    }
    false
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::KeyNotFound(_) | CacheError::NotFound => StatusCode::NOT_FOUND,
            CacheError::Serialization(_) | CacheError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::NotAnInteger(_) | CacheError::Overflow(_) => StatusCode::CONFLICT,
            CacheError::Backend(_) => StatusCode::BAD_GATEWAY,
            CacheError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_messages() {
        assert_eq!(CacheError::NotFound.to_string(), "cache: key not found");
        assert_eq!(
            CacheError::KeyNotFound("mykey".to_string()).to_string(),
            "cache: key not found: mykey"
        );
    }

    #[test]
    fn test_is_not_found_variants() {
        assert!(CacheError::NotFound.is_not_found());
        assert!(CacheError::KeyNotFound("k".to_string()).is_not_found());
        assert!(!CacheError::Closed.is_not_found());
        assert!(!CacheError::backend("connection reset").is_not_found());
    }

    #[test]
    fn test_is_not_found_predicate() {
        let miss = CacheError::KeyNotFound("test".to_string());
        assert!(is_not_found(&miss));
        assert!(is_not_found(&CacheError::NotFound));

        let other = std::io::Error::new(std::io::ErrorKind::Other, "other error");
        assert!(!is_not_found(&other));

        // A driver message that merely looks like a miss is not one
        let driver = CacheError::backend("redis: nil");
        assert!(!is_not_found(&driver));
    }

    #[test]
    fn test_is_not_found_through_anyhow_context() {
        let err = anyhow::Error::new(CacheError::KeyNotFound("user:1".to_string()))
            .context("loading user profile");
        assert!(is_not_found(err.as_ref()));

        let err = anyhow::Error::new(CacheError::Closed).context("loading user profile");
        assert!(!is_not_found(err.as_ref()));
    }

    #[test]
    fn test_backend_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = CacheError::backend(io);
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "cache: backend error: refused");
    }

    #[test]
    fn test_into_response_status() {
        let response = CacheError::KeyNotFound("k".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = CacheError::Closed.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
