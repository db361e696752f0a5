//! Sponsorship route handlers: children, letters, visits, gifts.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::Value;

use donor_portal_core::ChildId;

use crate::dso::{GiftRequest, LetterRequest, VisitRequest};
use crate::error::Result;
use crate::models::{Child, Letter};
use crate::services::{SponsorshipService, require_session};
use crate::session::WebStorage;
use crate::state::AppState;

/// Query parameters for the letter list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LettersQuery {
    pub child_id: Option<ChildId>,
}

/// Sponsored children.
///
/// GET /api/account/children
///
/// # Errors
///
/// Returns 401 when not signed in.
pub async fn children(
    State(state): State<AppState>,
    storage: WebStorage,
) -> Result<Json<Vec<Child>>> {
    require_session(&state, &storage).await?;
    Ok(Json(SponsorshipService::new(&state).children(&storage).await))
}

/// Letter history.
///
/// GET /api/account/letters?childId=...
///
/// # Errors
///
/// Returns 401 when not signed in.
pub async fn letters(
    State(state): State<AppState>,
    storage: WebStorage,
    Query(query): Query<LettersQuery>,
) -> Result<Json<Vec<Letter>>> {
    require_session(&state, &storage).await?;
    let child_id = query.child_id.filter(|id| !id.is_empty());
    Ok(Json(
        SponsorshipService::new(&state)
            .letters(&storage, child_id)
            .await,
    ))
}

/// Send a letter.
///
/// POST /api/account/letters
///
/// # Errors
///
/// Returns 400 for an invalid letter, 401 when not signed in, 422 when the
/// DSO rejects it.
pub async fn send_letter(
    State(state): State<AppState>,
    storage: WebStorage,
    Json(letter): Json<LetterRequest>,
) -> Result<Json<Value>> {
    let result = SponsorshipService::new(&state)
        .send_letter(&storage, &letter)
        .await?;
    Ok(Json(result))
}

/// Request a visit.
///
/// POST /api/account/visits
///
/// # Errors
///
/// Returns 400 without a date, 401 when not signed in, 422 when the DSO
/// rejects it.
pub async fn schedule_visit(
    State(state): State<AppState>,
    storage: WebStorage,
    Json(visit): Json<VisitRequest>,
) -> Result<Json<Value>> {
    let result = SponsorshipService::new(&state)
        .schedule_visit(&storage, &visit)
        .await?;
    Ok(Json(result))
}

/// Send a gift.
///
/// POST /api/account/gifts
///
/// # Errors
///
/// Returns 400 for a zero amount, 401 when not signed in, 422 when the DSO
/// rejects it.
pub async fn send_gift(
    State(state): State<AppState>,
    storage: WebStorage,
    Json(gift): Json<GiftRequest>,
) -> Result<Json<Value>> {
    let result = SponsorshipService::new(&state)
        .send_gift(&storage, &gift)
        .await?;
    Ok(Json(result))
}
