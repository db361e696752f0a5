//! Application state shared across handlers.

use std::sync::Arc;

use crate::cache::QueryCache;
use crate::config::PortalConfig;
use crate::dso::{DsoClient, DsoError};
use crate::normalize::FieldAliases;
use crate::services::throttle::FetchThrottle;
use crate::session::SessionStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the DSO
/// client, the session store and the per-donor caches.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    dso: DsoClient,
    sessions: SessionStore,
    cache: QueryCache,
    throttle: FetchThrottle,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the DSO HTTP client cannot be built.
    pub fn new(config: PortalConfig) -> Result<Self, DsoError> {
        let dso = DsoClient::new(&config.dso)?;
        let cache = QueryCache::new();
        let sessions = SessionStore::new(config.session, cache.clone());
        let throttle = FetchThrottle::new(config.session.throttle);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                dso,
                sessions,
                cache,
                throttle,
            }),
        })
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the DSO API client.
    #[must_use]
    pub fn dso(&self) -> &DsoClient {
        &self.inner.dso
    }

    /// Get a reference to the session store.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Get a reference to the query cache.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    /// Get a reference to the fetch throttle.
    #[must_use]
    pub fn throttle(&self) -> &FetchThrottle {
        &self.inner.throttle
    }

    /// Get the profile field aliases.
    #[must_use]
    pub fn aliases(&self) -> &FieldAliases {
        &self.inner.config.aliases
    }

    /// Whether sessions are served locally without calling the DSO.
    #[must_use]
    pub fn mock_mode(&self) -> bool {
        self.inner.config.dso.mock_mode
    }
}
