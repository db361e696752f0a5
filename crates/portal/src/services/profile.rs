//! Donor profile reads and updates, with silent token renewal.

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheValue, Resource};
use crate::dso::ProfileUpdate;
use crate::error::Result;
use crate::models::User;
use crate::normalize::{Profile, normalize_profile};
use crate::session::{Session, SessionStorage};
use crate::state::AppState;

use super::{require_session, require_token, throttle_key};

/// Profile service.
///
/// Reads go through the throttle and the query cache. When the DSO rejects
/// the session token, the service re-authenticates once with the cached
/// credentials and retries once.
pub struct ProfileService<'a> {
    state: &'a AppState,
}

impl<'a> ProfileService<'a> {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Fetch the signed-in donor's profile.
    ///
    /// Returns `None` when there is no session, when the DSO cannot be reached,
    /// or when the token was rejected and could not be renewed. Never errors.
    #[instrument(skip(self, storage))]
    pub async fn fetch(&self, storage: &dyn SessionStorage) -> Option<Profile> {
        let session = self.state.sessions().load(storage).await?;

        if session.is_mock {
            return Some(Profile {
                user: session.user,
                products: Vec::new(),
            });
        }

        let donor = &session.user.id;
        if !self
            .state
            .throttle()
            .should_fetch(&throttle_key(Resource::Profile, donor))
            && let Some(profile) = self.state.cache().profile(donor).await
        {
            debug!("Profile fetch throttled, serving cached profile");
            return Some(profile);
        }

        self.load(storage, &session).await
    }

    /// Fetch from the DSO, bypassing throttle and cache.
    async fn load(&self, storage: &dyn SessionStorage, session: &Session) -> Option<Profile> {
        let Some(token) = session.token.as_ref() else {
            debug!("Session has no token");
            return None;
        };

        let raw = match self.state.dso().get_profile(token).await {
            Ok(raw) => raw,
            Err(e) if e.is_unauthorized() => self.renew_and_retry(storage, session).await?,
            Err(e) => {
                warn!(error = %e, "Failed to fetch profile");
                return None;
            }
        };

        let profile = self.normalize(&raw)?;
        self.state
            .cache()
            .insert(&session.user.id, CacheValue::Profile(Box::new(profile.clone())))
            .await;
        Some(profile)
    }

    /// Re-authenticate with the cached credentials and retry the profile
    /// fetch exactly once. Any failure ends the session.
    async fn renew_and_retry(
        &self,
        storage: &dyn SessionStorage,
        session: &Session,
    ) -> Option<Value> {
        let Some(credentials) = session.credentials.as_ref() else {
            info!("Token rejected and no cached credentials; ending session");
            self.state.sessions().clear(storage).await;
            return None;
        };

        let token = match self
            .state
            .dso()
            .authenticate(&credentials.document, &credentials.password)
            .await
        {
            Ok(auth) => auth.access_token,
            Err(e) => {
                warn!(error = %e, "Token renewal failed; ending session");
                self.state.sessions().clear(storage).await;
                return None;
            }
        };

        info!("Token renewed");
        self.state
            .sessions()
            .renew_token(storage, session, token.clone())
            .await;

        match self.state.dso().get_profile(&token).await {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!(error = %e, "Profile fetch failed after renewal");
                None
            }
        }
    }

    fn normalize(&self, raw: &Value) -> Option<Profile> {
        let profile = normalize_profile(raw, self.state.aliases());
        if profile.is_none() {
            warn!("Profile payload has neither id nor document");
        }
        profile
    }

    /// The signed-in donor: the fresh profile when it can be fetched,
    /// otherwise the user saved in the session.
    pub async fn current_user(&self, storage: &dyn SessionStorage) -> Option<User> {
        match self.fetch(storage).await {
            Some(profile) => Some(profile.user),
            None => self
                .state
                .sessions()
                .load(storage)
                .await
                .map(|session| session.user),
        }
    }

    /// Update the signed-in donor's profile and return the refreshed user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without a session, `AppError::BadRequest`
    /// for an empty update, and `AppError::Dso` if the DSO rejects the update.
    #[instrument(skip(self, storage, update))]
    pub async fn update(&self, storage: &dyn SessionStorage, update: &ProfileUpdate) -> Result<User> {
        if update.is_empty() {
            return Err(crate::error::AppError::BadRequest(
                "Nothing to update".to_string(),
            ));
        }

        let session = require_session(self.state, storage).await?;
        let donor = session.user.id.clone();

        if session.is_mock {
            let mut user = session.user.clone();
            apply_update(&mut user, update);
            self.state
                .sessions()
                .save(storage, user.clone(), None, true, None)
                .await;
            return Ok(user);
        }

        let token = require_token(&session)?;
        self.state.dso().update_profile(token, update).await?;
        crate::error::add_breadcrumb("profile", "Updated profile", None);

        self.state.cache().invalidate_donor(&donor).await;
        self.state
            .throttle()
            .reset(&throttle_key(Resource::Profile, &donor));

        // The DSO may echo stale data for a moment; fall back to applying the
        // update to what we know.
        if let Some(profile) = self.load(storage, &session).await {
            return Ok(profile.user);
        }
        let mut user = session.user;
        apply_update(&mut user, update);
        Ok(user)
    }
}

/// Overwrite the fields an update sets.
fn apply_update(user: &mut User, update: &ProfileUpdate) {
    fn set(field: &mut Option<String>, value: Option<&String>) {
        if let Some(value) = value {
            *field = Some(value.clone());
        }
    }

    if let Some(name) = &update.name {
        user.name.clone_from(name);
    }
    if let Some(email) = &update.email {
        user.email = email.to_lowercase();
    }
    set(&mut user.phone, update.phone.as_ref());
    let address = &mut user.address;
    set(&mut address.address, update.address.as_ref());
    set(&mut address.number, update.number.as_ref());
    set(&mut address.complement, update.complement.as_ref());
    set(&mut address.neighborhood, update.neighborhood.as_ref());
    set(&mut address.city, update.city.as_ref());
    set(&mut address.state, update.state.as_ref());
    set(&mut address.zip_code, update.zip_code.as_ref());
    set(&mut address.country, update.country.as_ref());
}

#[cfg(test)]
mod tests {
    use donor_portal_core::Document;

    use super::*;

    #[test]
    fn test_apply_update_only_touches_set_fields() {
        let mut user =
            User::from_document(&Document::parse("529.982.247-25").expect("valid document"));
        user.address.city = Some("Recife".to_string());

        apply_update(
            &mut user,
            &ProfileUpdate {
                email: Some("Ana@Example.org".to_string()),
                zip_code: Some("50000-000".to_string()),
                ..ProfileUpdate::default()
            },
        );

        assert_eq!(user.email, "ana@example.org");
        assert_eq!(user.address.zip_code.as_deref(), Some("50000-000"));
        assert_eq!(user.address.city.as_deref(), Some("Recife"));
    }
}
