//! Business logic services for the portal.
//!
//! # Services
//!
//! - `auth` - Login (DSO or mock mode) and logout
//! - `profile` - Profile reads with token renewal, profile updates
//! - `donations` - Donation history merged from three sources
//! - `sponsorship` - Children, letters, visits and gifts
//! - `payments` - Orders and direct debit payments
//! - `throttle` - Minimum interval between repeated fetches
//!
//! Services borrow the shared [`AppState`] and are built per request.

pub mod auth;
pub mod donations;
pub mod payments;
pub mod profile;
pub mod sponsorship;
pub mod throttle;

pub use auth::AuthService;
pub use donations::DonationService;
pub use payments::PaymentService;
pub use profile::ProfileService;
pub use sponsorship::SponsorshipService;
pub use throttle::FetchThrottle;

use secrecy::SecretString;

use donor_portal_core::DonorId;

use crate::cache::Resource;
use crate::error::{AppError, Result};
use crate::session::{Session, SessionStorage};
use crate::state::AppState;

/// Throttle key for one donor's resource.
#[must_use]
pub fn throttle_key(resource: Resource, donor: &DonorId) -> String {
    format!("{}:{donor}", resource.as_str())
}

/// The current session, or `Unauthorized`.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` when there is no valid session.
pub async fn require_session(
    state: &AppState,
    storage: &dyn SessionStorage,
) -> Result<Session> {
    state
        .sessions()
        .load(storage)
        .await
        .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))
}

/// The session's bearer token, or `Unauthorized`.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` for sessions without a token.
pub fn require_token(session: &Session) -> Result<&SecretString> {
    session
        .token
        .as_ref()
        .ok_or_else(|| AppError::Unauthorized("Session has no token".to_string()))
}
