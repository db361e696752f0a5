//! Session persistence: the login blob, token mirrors and the token cookie.
//!
//! A session is valid for the configured TTL (20 minutes by default) from the
//! moment it was saved. Expired sessions are purged on the next read. None of
//! the operations here return errors: storage or parse failures are logged
//! and treated as "no session".

use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tower_sessions::cookie::{Cookie, SameSite};
use tracing::{debug, info, warn};

use donor_portal_core::DonorId;

use super::keys;
use super::storage::SessionStorage;
use crate::cache::QueryCache;
use crate::config::SessionConfig;
use crate::models::{Donation, User};

/// Authentication state persisted per browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    #[serde(default, with = "secret_opt", skip_serializing_if = "Option::is_none")]
    pub token: Option<SecretString>,
    #[serde(default)]
    pub is_mock: bool,
    /// When the session was saved, in epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

impl Session {
    /// Whether the session is still inside its TTL at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now.timestamp_millis().saturating_sub(self.timestamp) < ttl_ms
    }
}

/// Document and password kept for silent re-authentication.
///
/// Lives only in the server-side session store, never in a cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub document: String,
    #[serde(with = "secret")]
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(document: impl Into<String>, password: SecretString) -> Self {
        Self {
            document: document.into(),
            password,
        }
    }
}

/// Reads and writes [`Session`]s through any [`SessionStorage`].
#[derive(Clone)]
pub struct SessionStore {
    config: SessionConfig,
    cache: QueryCache,
}

impl SessionStore {
    #[must_use]
    pub const fn new(config: SessionConfig, cache: QueryCache) -> Self {
        Self { config, cache }
    }

    /// Session time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Persist a session stamped with the current time.
    ///
    /// With a token, the token is mirrored into the token keys and the token
    /// cookie. Without one, any previous token is removed.
    pub async fn save(
        &self,
        storage: &dyn SessionStorage,
        user: User,
        token: Option<SecretString>,
        is_mock: bool,
        credentials: Option<Credentials>,
    ) {
        let session = Session {
            user,
            token,
            is_mock,
            timestamp: Utc::now().timestamp_millis(),
            credentials,
        };
        self.write(storage, &session).await;
    }

    /// Persist a renewed token, keeping the rest of the session.
    pub async fn renew_token(
        &self,
        storage: &dyn SessionStorage,
        session: &Session,
        token: SecretString,
    ) {
        self.save(
            storage,
            session.user.clone(),
            Some(token),
            session.is_mock,
            session.credentials.clone(),
        )
        .await;
    }

    async fn write(&self, storage: &dyn SessionStorage, session: &Session) {
        let blob = match serde_json::to_string(session) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "Failed to encode session");
                return;
            }
        };

        set(storage, keys::LOGIN_DATA, blob).await;
        set(storage, keys::LOGIN_TIMESTAMP, session.timestamp.to_string()).await;

        if let Some(token) = &session.token {
            let token = token.expose_secret();
            set(storage, keys::TOKEN, token.to_string()).await;
            for key in keys::LEGACY_TOKENS {
                set(storage, key, token.to_string()).await;
            }
            storage.set_cookie(self.token_cookie(token)).await;
        } else {
            remove(storage, keys::TOKEN).await;
            for key in keys::LEGACY_TOKENS {
                remove(storage, key).await;
            }
            storage.set_cookie(removal_cookie()).await;
        }

        debug!(donor = %session.user.id, is_mock = session.is_mock, "Session saved");
    }

    /// Load the current session, purging it if it has expired.
    pub async fn load(&self, storage: &dyn SessionStorage) -> Option<Session> {
        self.load_at(storage, Utc::now()).await
    }

    /// [`Self::load`] against an explicit clock.
    pub async fn load_at(&self, storage: &dyn SessionStorage, now: DateTime<Utc>) -> Option<Session> {
        let session = self.read(storage).await?;
        if session.is_valid_at(now, self.config.ttl) {
            Some(session)
        } else {
            info!(donor = %session.user.id, "Session expired");
            self.purge(storage, Some(&session.user.id)).await;
            None
        }
    }

    /// Read the blob without checking expiry. Unparseable blobs are removed.
    async fn read(&self, storage: &dyn SessionStorage) -> Option<Session> {
        let blob = match storage.get_item(keys::LOGIN_DATA).await {
            Ok(blob) => blob?,
            Err(e) => {
                warn!(error = %e, "Failed to read session");
                return None;
            }
        };

        match serde_json::from_str(&blob) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session");
                self.purge(storage, None).await;
                None
            }
        }
    }

    /// Remove every session key, expire the token cookie and drop the
    /// donor's cached queries.
    pub async fn clear(&self, storage: &dyn SessionStorage) {
        let donor = self.read(storage).await.map(|s| s.user.id);
        self.purge(storage, donor.as_ref()).await;
    }

    async fn purge(&self, storage: &dyn SessionStorage, donor: Option<&DonorId>) {
        for key in keys::all() {
            remove(storage, key).await;
        }
        storage.set_cookie(removal_cookie()).await;
        if let Some(donor) = donor {
            self.cache.invalidate_donor(donor).await;
        }
    }

    /// Donations recorded during this session, newest first.
    pub async fn local_donations(&self, storage: &dyn SessionStorage) -> Vec<Donation> {
        let blob = match storage.get_item(keys::SESSION_DONATIONS).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read session donations");
                return Vec::new();
            }
        };
        serde_json::from_str(&blob).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable session donations");
            Vec::new()
        })
    }

    /// Record a donation made during this session.
    pub async fn record_local_donation(&self, storage: &dyn SessionStorage, donation: Donation) {
        let mut donations = self.local_donations(storage).await;
        donations.retain(|d| d.id != donation.id);
        donations.insert(0, donation);
        match serde_json::to_string(&donations) {
            Ok(blob) => set(storage, keys::SESSION_DONATIONS, blob).await,
            Err(e) => warn!(error = %e, "Failed to encode session donations"),
        }
    }

    fn token_cookie(&self, token: &str) -> Cookie<'static> {
        let max_age = tower_sessions::cookie::time::Duration::try_from(self.config.ttl)
            .unwrap_or(tower_sessions::cookie::time::Duration::MAX);
        Cookie::build((keys::TOKEN_COOKIE, token.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(self.config.secure_cookies)
            .max_age(max_age)
            .build()
    }
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((keys::TOKEN_COOKIE, ""))
        .path("/")
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();
    cookie
}

async fn set(storage: &dyn SessionStorage, key: &str, value: String) {
    if let Err(e) = storage.set_item(key, value).await {
        warn!(key, error = %e, "Failed to write session key");
    }
}

async fn remove(storage: &dyn SessionStorage, key: &str) {
    if let Err(e) = storage.remove_item(key).await {
        warn!(key, error = %e, "Failed to remove session key");
    }
}

mod secret {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.expose_secret())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
        String::deserialize(deserializer).map(SecretString::from)
    }
}

mod secret_opt {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<SecretString>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(secret) => serializer.serialize_some(secret.expose_secret()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<SecretString>, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .filter(|s| !s.is_empty())
            .map(SecretString::from))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use donor_portal_core::{Amount, Document, DonationId, DonationStatus, DonationType};

    use super::*;
    use crate::cache::CacheValue;
    use crate::models::DonationSource;
    use crate::session::storage::MemoryStorage;

    fn store() -> SessionStore {
        SessionStore::new(SessionConfig::default(), QueryCache::new())
    }

    fn user() -> User {
        User::from_document(&Document::parse("529.982.247-25").expect("valid document"))
    }

    fn donation(id: &str) -> Donation {
        Donation {
            id: DonationId::new(id),
            date: None,
            amount: Amount::from_cents(1000),
            kind: DonationType::Once,
            status: DonationStatus::Paid,
            description: "Doação".to_string(),
            source: DonationSource::Local,
        }
    }

    #[tokio::test]
    async fn test_save_mirrors_token_and_sets_cookie() {
        let store = store();
        let storage = MemoryStorage::new();
        store
            .save(&storage, user(), Some(SecretString::from("tok")), false, None)
            .await;

        for key in ["dso_token", "token", "authToken"] {
            assert_eq!(
                storage.get_item(key).await.expect("get"),
                Some("tok".to_string())
            );
        }
        assert!(storage.get_item("dso_login_timestamp").await.expect("get").is_some());

        let cookie = storage.cookie("dso_token").await.expect("cookie");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(
            cookie.max_age(),
            Some(tower_sessions::cookie::time::Duration::seconds(1200))
        );
    }

    #[tokio::test]
    async fn test_load_round_trips_credentials() {
        let store = store();
        let storage = MemoryStorage::new();
        let credentials = Credentials::new("52998224725", SecretString::from("pw"));
        store
            .save(&storage, user(), Some(SecretString::from("tok")), false, Some(credentials))
            .await;

        let session = store.load(&storage).await.expect("session");
        assert_eq!(session.user, user());
        assert_eq!(session.token.as_ref().map(|t| t.expose_secret()), Some("tok"));
        let credentials = session.credentials.expect("credentials");
        assert_eq!(credentials.password.expose_secret(), "pw");
    }

    #[tokio::test]
    async fn test_expired_session_is_purged() {
        let store = store();
        let storage = MemoryStorage::new();
        store
            .save(&storage, user(), Some(SecretString::from("tok")), false, None)
            .await;
        store.record_local_donation(&storage, donation("local-0")).await;

        let later = Utc::now() + TimeDelta::minutes(21);
        assert!(store.load_at(&storage, later).await.is_none());
        assert!(storage.is_empty().await);

        let cookie = storage.cookie("dso_token").await.expect("removal cookie");
        assert_eq!(cookie.value(), "");
        assert_eq!(
            cookie.max_age(),
            Some(tower_sessions::cookie::time::Duration::ZERO)
        );
    }

    #[tokio::test]
    async fn test_session_valid_just_inside_ttl() {
        let store = store();
        let storage = MemoryStorage::new();
        store.save(&storage, user(), None, true, None).await;

        let later = Utc::now() + TimeDelta::minutes(19);
        let session = store.load_at(&storage, later).await.expect("still valid");
        assert!(session.is_mock);
        assert!(session.token.is_none());
    }

    #[tokio::test]
    async fn test_unparseable_blob_is_absent() {
        let store = store();
        let storage = MemoryStorage::new();
        storage
            .set_item("dso_login_data", "{not json".to_string())
            .await
            .expect("set");
        assert!(store.load(&storage).await.is_none());
        assert!(storage.get_item("dso_login_data").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_everything_and_invalidates_cache() {
        let cache = QueryCache::new();
        let store = SessionStore::new(SessionConfig::default(), cache.clone());
        let storage = MemoryStorage::new();
        let user = user();
        store
            .save(&storage, user.clone(), Some(SecretString::from("tok")), false, None)
            .await;
        cache.insert(&user.id, CacheValue::Letters(Vec::new())).await;

        store.clear(&storage).await;

        assert!(storage.is_empty().await);
        assert!(cache.letters(&user.id).await.is_none());
    }

    #[tokio::test]
    async fn test_record_local_donation_newest_first() {
        let store = store();
        let storage = MemoryStorage::new();
        store.record_local_donation(&storage, donation("a")).await;
        store.record_local_donation(&storage, donation("b")).await;
        store.record_local_donation(&storage, donation("a")).await;

        let ids: Vec<String> = store
            .local_donations(&storage)
            .await
            .into_iter()
            .map(|d| d.id.into_inner())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
