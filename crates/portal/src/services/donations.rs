//! Donation history aggregation.

use tracing::{debug, instrument, warn};

use crate::cache::{CacheValue, Resource};
use crate::dso::OrderHistoryQuery;
use crate::models::Donation;
use crate::normalize::{merge_donations, normalize_history, normalize_products};
use crate::session::{Session, SessionStorage};
use crate::state::AppState;

use super::{ProfileService, throttle_key};

/// Donation service.
///
/// Fetches profile products first (renewing the token if the DSO rejects it),
/// then order history and local session donations concurrently with the
/// current token, and merges them. Each source fails on its own; the merged
/// list is always returned, but only complete merges are cached.
pub struct DonationService<'a> {
    state: &'a AppState,
}

impl<'a> DonationService<'a> {
    /// Create a new donation service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// All donations for the signed-in donor, newest first.
    ///
    /// Empty without a session.
    #[instrument(skip(self, storage))]
    pub async fn list(&self, storage: &dyn SessionStorage) -> Vec<Donation> {
        let Some(session) = self.state.sessions().load(storage).await else {
            return Vec::new();
        };

        if session.is_mock {
            return self.state.sessions().local_donations(storage).await;
        }

        let donor = &session.user.id;
        if !self
            .state
            .throttle()
            .should_fetch(&throttle_key(Resource::Donations, donor))
            && let Some(donations) = self.state.cache().donations(donor).await
        {
            debug!("Donations fetch throttled, serving cached list");
            return donations;
        }

        // The profile fetch may renew the token; history must use the new one
        let server = self.server_donations(storage).await;
        let Some(session) = self.state.sessions().load(storage).await else {
            return Vec::new();
        };

        let (history, local) = tokio::join!(
            self.history_donations(&session),
            self.state.sessions().local_donations(storage),
        );
        let history_ok = history.is_some();
        let history = history.unwrap_or_default();
        debug!(
            server = server.len(),
            history = history.len(),
            local = local.len(),
            "Fetched donation sources"
        );

        let merged = merge_donations(local, history, server);
        if history_ok {
            self.state
                .cache()
                .insert(&session.user.id, CacheValue::Donations(merged.clone()))
                .await;
        }
        merged
    }

    /// Donations derived from the products on the donor's profile.
    async fn server_donations(&self, storage: &dyn SessionStorage) -> Vec<Donation> {
        ProfileService::new(self.state)
            .fetch(storage)
            .await
            .map(|profile| normalize_products(&profile.products))
            .unwrap_or_default()
    }

    /// Donations from the order history endpoint; `None` when the request
    /// failed.
    async fn history_donations(&self, session: &Session) -> Option<Vec<Donation>> {
        let Some(token) = session.token.as_ref() else {
            return Some(Vec::new());
        };

        let query = OrderHistoryQuery {
            contact_id: session.user.id.to_string(),
            document: Some(session.user.document.clone()).filter(|d| !d.is_empty()),
        };

        match self.state.dso().order_history(token, &query).await {
            Ok(raw) => Some(normalize_history(&raw)),
            Err(e) => {
                warn!(error = %e, "Failed to fetch order history");
                None
            }
        }
    }
}
