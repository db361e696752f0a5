//! Browser-facing session storage.
//!
//! Each browser gets a `tower-sessions` session (in-memory store) that plays
//! the role of its key/value storage. Cookies the session logic sets are
//! queued per request and written as `Set-Cookie` headers on the way out.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderValue, StatusCode, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Cookie};

use super::storage::{SessionStorage, StorageError};
use crate::config::SessionConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "portal_session";

/// Cookies queued during one request.
#[derive(Clone, Default)]
pub struct PendingCookies(Arc<Mutex<Vec<Cookie<'static>>>>);

impl PendingCookies {
    async fn push(&self, cookie: Cookie<'static>) {
        let mut cookies = self.0.lock().await;
        cookies.retain(|c| c.name() != cookie.name());
        cookies.push(cookie);
    }

    async fn take(&self) -> Vec<Cookie<'static>> {
        std::mem::take(&mut *self.0.lock().await)
    }
}

/// Middleware that gives each request a cookie queue and flushes it into
/// `Set-Cookie` headers.
pub async fn cookie_mirror_middleware(mut request: Request, next: Next) -> Response {
    let pending = PendingCookies::default();
    request.extensions_mut().insert(pending.clone());

    let mut response = next.run(request).await;

    for cookie in pending.take().await {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(cookie = cookie.name(), error = %e, "Invalid cookie header"),
        }
    }

    response
}

/// [`SessionStorage`] backed by the request's `tower-sessions` session.
#[derive(Clone)]
pub struct WebStorage {
    session: tower_sessions::Session,
    cookies: PendingCookies,
}

#[async_trait]
impl SessionStorage for WebStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.session.get::<String>(key).await?)
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        Ok(self.session.insert(key, value).await?)
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.session.remove::<String>(key).await?;
        Ok(())
    }

    async fn set_cookie(&self, cookie: Cookie<'static>) {
        self.cookies.push(cookie).await;
    }
}

impl<S> FromRequestParts<S> for WebStorage
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<tower_sessions::Session>()
            .cloned()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Session layer missing"))?;
        let cookies = parts
            .extensions
            .get::<PendingCookies>()
            .cloned()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Cookie layer missing"))?;
        Ok(Self { session, cookies })
    }
}

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &SessionConfig) -> SessionManagerLayer<MemoryStore> {
    let expiry = tower_sessions::cookie::time::Duration::try_from(config.ttl)
        .unwrap_or(tower_sessions::cookie::time::Duration::MAX);

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(expiry))
        .with_secure(config.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pending_cookies_keep_last_per_name() {
        let pending = PendingCookies::default();
        pending.push(Cookie::new("dso_token", "one")).await;
        pending.push(Cookie::new("other", "x")).await;
        pending.push(Cookie::new("dso_token", "two")).await;

        let cookies = pending.take().await;
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().any(|c| c.name() == "dso_token" && c.value() == "two"));
        assert!(pending.take().await.is_empty());
    }
}
