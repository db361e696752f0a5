//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`;
//! error bodies are `{"error": "<message>"}` and never carry internals.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use donor_portal_core::{AmountError, DocumentError};

use crate::dso::DsoError;

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// DSO API operation failed.
    #[error("DSO error: {0}")]
    Dso(#[from] DsoError),

    /// The donor typed an invalid CPF.
    #[error("Invalid document: {0}")]
    Document(#[from] DocumentError),

    /// The donor typed an invalid amount.
    #[error("Invalid amount: {0}")]
    Amount(#[from] AmountError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Donor is not signed in, or the session expired.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Dso(err) => match err {
                DsoError::Unauthorized | DsoError::AuthenticationFailed(_) => {
                    StatusCode::UNAUTHORIZED
                }
                DsoError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                DsoError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DsoError::Http(_) | DsoError::Parse(_) | DsoError::Api { .. } => {
                    StatusCode::BAD_GATEWAY
                }
            },
            Self::Document(_) | Self::Amount(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Dso(err) => match err {
                DsoError::AuthenticationFailed(_) => "Invalid credentials".to_string(),
                DsoError::Unauthorized => "Session expired, please sign in again".to_string(),
                DsoError::RateLimited(_) => "Too many requests, please try again later".to_string(),
                DsoError::Rejected(msg) => msg.clone(),
                DsoError::Http(_) | DsoError::Parse(_) | DsoError::Api { .. } => {
                    "External service error".to_string()
                }
            },
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Unauthorized(msg) | Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Document(_) | Self::Amount(_) => self.to_string(),
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Dso(DsoError::Http(_) | DsoError::Parse(_) | DsoError::Api { .. })
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let message = self.public_message();

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with donors.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.filter(|e| !e.is_empty()).map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the donor.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for donor actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("sponsorship", "Sent letter", Some(&[("child_id", "C-1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("child C-1".to_string());
        assert_eq!(err.to_string(), "Not found: child C-1");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Document(DocumentError::Empty)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_dso_error_status_codes() {
        assert_eq!(
            get_status(DsoError::AuthenticationFailed("bad".to_string()).into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(DsoError::RateLimited(5).into()),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(DsoError::Rejected("Data indisponível".to_string()).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(
                DsoError::Api {
                    status: 500,
                    message: "stack trace".to_string()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err: AppError = DsoError::Api {
            status: 500,
            message: "NullPointerException at line 42".to_string(),
        }
        .into();
        assert_eq!(err.public_message(), "External service error");

        let err: AppError = DsoError::AuthenticationFailed("user 123 not found".to_string()).into();
        assert_eq!(err.public_message(), "Invalid credentials");
    }
}
