//! Storage keys and cookie names shared with the browser UI.

/// JSON session blob.
pub const LOGIN_DATA: &str = "dso_login_data";

/// Login timestamp in epoch milliseconds, mirrored out of the blob.
pub const LOGIN_TIMESTAMP: &str = "dso_login_timestamp";

/// Current bearer token.
pub const TOKEN: &str = "dso_token";

/// Older UI builds read the token from these keys.
pub const LEGACY_TOKENS: &[&str] = &["token", "authToken"];

/// Donations made during this session, not yet visible in the DSO.
pub const SESSION_DONATIONS: &str = "dso_session_donations";

/// Cookie mirroring the bearer token.
pub const TOKEN_COOKIE: &str = "dso_token";

/// Every key a logout or expiry must remove.
#[must_use]
pub fn all() -> Vec<&'static str> {
    let mut keys = vec![LOGIN_DATA, LOGIN_TIMESTAMP, TOKEN, SESSION_DONATIONS];
    keys.extend_from_slice(LEGACY_TOKENS);
    keys
}
