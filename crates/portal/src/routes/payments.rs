//! Order and payment route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::Value;

use crate::dso::{DebitRequest, OrderRequest};
use crate::error::Result;
use crate::models::Donation;
use crate::services::PaymentService;
use crate::session::WebStorage;
use crate::state::AppState;

/// Create an order.
///
/// POST /api/account/orders
///
/// # Errors
///
/// Returns 400 for an invalid order, 401 when not signed in, 422 when the
/// DSO rejects it.
pub async fn generate_order(
    State(state): State<AppState>,
    storage: WebStorage,
    Json(order): Json<OrderRequest>,
) -> Result<Json<Value>> {
    let result = PaymentService::new(&state)
        .generate_order(&storage, &order)
        .await?;
    Ok(Json(result))
}

/// Pay by direct debit. Returns the donation recorded for this session.
///
/// POST /api/account/payments/debit
///
/// # Errors
///
/// Returns 400 for a zero amount, 401 when not signed in, 422 when the DSO
/// rejects the payment.
pub async fn debit(
    State(state): State<AppState>,
    storage: WebStorage,
    Json(payment): Json<DebitRequest>,
) -> Result<(StatusCode, Json<Donation>)> {
    let donation = PaymentService::new(&state).debit(&storage, &payment).await?;
    Ok((StatusCode::CREATED, Json(donation)))
}
