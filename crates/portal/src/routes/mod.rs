//! HTTP route handlers for the donor portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Health check
//!
//! # Auth
//! POST /api/auth/login               - Sign in with document and password
//! POST /api/auth/logout              - Sign out
//! GET  /api/auth/session             - Current session
//!
//! # Account (requires a session)
//! GET  /api/account/profile          - Donor profile
//! PUT  /api/account/profile          - Update profile
//! GET  /api/account/donations        - Merged donation history
//! GET  /api/account/children         - Sponsored children
//! GET  /api/account/letters          - Letter history
//! POST /api/account/letters          - Send a letter
//! POST /api/account/visits           - Request a visit
//! POST /api/account/gifts            - Send a gift
//! POST /api/account/orders           - Create an order
//! POST /api/account/payments/debit   - Pay by direct debit
//! ```

pub mod account;
pub mod auth;
pub mod payments;
pub mod sponsorship;

use axum::{
    Router,
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::session::{cookie_mirror_middleware, create_session_layer};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(account::profile).put(account::update_profile),
        )
        .route("/donations", get(account::donations))
        .route("/children", get(sponsorship::children))
        .route(
            "/letters",
            get(sponsorship::letters).post(sponsorship::send_letter),
        )
        .route("/visits", post(sponsorship::schedule_visit))
        .route("/gifts", post(sponsorship::send_gift))
        .route("/orders", post(payments::generate_order))
        .route("/payments/debit", post(payments::debit))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/account", account_routes())
}

/// Build the full application: routes, sessions, cookie mirroring and
/// request tracing. Error tracking layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(&state.config().session);

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(middleware::from_fn(cookie_mirror_middleware))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the DSO.
async fn health() -> &'static str {
    "ok"
}
