//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::AuthService;
use crate::session::WebStorage;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// CPF, with or without punctuation.
    pub document: String,
    pub password: String,
}

/// The signed-in donor and when the session ends.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: User,
    pub is_mock: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Sign in.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns 400 for an invalid document and 401 for rejected credentials.
pub async fn login(
    State(state): State<AppState>,
    storage: WebStorage,
    Json(request): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(&state)
        .login(&storage, &request.document, SecretString::from(request.password))
        .await?;
    Ok(Json(user))
}

/// Sign out.
///
/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, storage: WebStorage) -> StatusCode {
    AuthService::new(&state).logout(&storage).await;
    StatusCode::NO_CONTENT
}

/// The current session.
///
/// GET /api/auth/session
///
/// # Errors
///
/// Returns 401 when not signed in or the session expired.
pub async fn session(
    State(state): State<AppState>,
    storage: WebStorage,
) -> Result<Json<SessionResponse>> {
    let session = state
        .sessions()
        .load(&storage)
        .await
        .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))?;

    let ttl = TimeDelta::from_std(state.sessions().ttl()).ok();
    let expires_at = DateTime::from_timestamp_millis(session.timestamp)
        .zip(ttl)
        .map(|(saved, ttl)| saved + ttl);

    Ok(Json(SessionResponse {
        user: session.user,
        is_mock: session.is_mock,
        expires_at,
    }))
}
