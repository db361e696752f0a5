//! DSO CRM API client.
//!
//! The DSO holds everything the portal shows: donor profiles, sponsored
//! children, orders and letters. Its REST API is loosely specified, so this
//! module only speaks HTTP and hands back raw JSON; [`crate::normalize`] turns
//! it into portal models.
//!
//! # Authentication
//!
//! - Document (CPF) and password are exchanged for a bearer token
//! - Every request also carries the portal's client key header
//! - Tokens are per donor and live in the donor's session, not in the client

pub mod auth;
pub mod client;
pub mod types;

pub use auth::AuthToken;
pub use client::DsoClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the DSO.
#[derive(Debug, Error)]
pub enum DsoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Token missing, expired or rejected (HTTP 401/403).
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the DSO.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success HTTP status.
    #[error("DSO API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the response body, if any.
        message: String,
    },

    /// HTTP 200 with a body that reports failure (`success: false`).
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Authentication failed (invalid document/password).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

impl DsoError {
    /// Whether the error means the token should be renewed.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dso_error_display() {
        let err = DsoError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "DSO API error (500): boom");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = DsoError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(DsoError::Unauthorized.is_unauthorized());
        assert!(!DsoError::RateLimited(1).is_unauthorized());
        assert!(!DsoError::AuthenticationFailed("x".to_string()).is_unauthorized());
    }
}
