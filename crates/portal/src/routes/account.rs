//! Account route handlers (require a session).

use axum::{Json, extract::State};

use crate::dso::ProfileUpdate;
use crate::error::{AppError, Result};
use crate::models::{Donation, User};
use crate::services::{DonationService, ProfileService, require_session};
use crate::session::WebStorage;
use crate::state::AppState;

/// The donor's profile.
///
/// GET /api/account/profile
///
/// # Errors
///
/// Returns 401 when not signed in, or when the token was rejected and could
/// not be renewed.
pub async fn profile(State(state): State<AppState>, storage: WebStorage) -> Result<Json<User>> {
    ProfileService::new(&state)
        .current_user(&storage)
        .await
        .map(Json)
        .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))
}

/// Update the donor's profile.
///
/// PUT /api/account/profile
///
/// # Errors
///
/// Returns 401 when not signed in and 422 when the DSO rejects the update.
pub async fn update_profile(
    State(state): State<AppState>,
    storage: WebStorage,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let user = ProfileService::new(&state).update(&storage, &update).await?;
    Ok(Json(user))
}

/// All donations, newest first.
///
/// GET /api/account/donations
///
/// # Errors
///
/// Returns 401 when not signed in.
pub async fn donations(
    State(state): State<AppState>,
    storage: WebStorage,
) -> Result<Json<Vec<Donation>>> {
    require_session(&state, &storage).await?;
    Ok(Json(DonationService::new(&state).list(&storage).await))
}
