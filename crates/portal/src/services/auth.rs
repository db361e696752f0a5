//! Donor login and logout.
//!
//! Login exchanges document and password for a DSO token and saves the
//! session with the credentials cached for later renewal. In mock mode the
//! DSO is never called: any valid CPF signs in with a minimal user.

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use donor_portal_core::Document;

use crate::dso::auth::mask_document;
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::models::User;
use crate::normalize::normalize_profile;
use crate::session::{Credentials, SessionStorage};
use crate::state::AppState;

/// Authentication service.
pub struct AuthService<'a> {
    state: &'a AppState,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Sign a donor in and start a session.
    ///
    /// Any previous session in `storage` is cleared first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Document` for an invalid CPF, `AppError::BadRequest`
    /// for an empty password, and `AppError::Dso` if the DSO rejects the
    /// credentials.
    #[instrument(skip(self, storage, document, password), fields(document = %mask_document(document)))]
    pub async fn login(
        &self,
        storage: &dyn SessionStorage,
        document: &str,
        password: SecretString,
    ) -> Result<User> {
        let document = Document::parse(document)?;
        if password.expose_secret().is_empty() {
            return Err(AppError::BadRequest("Password is required".to_string()));
        }

        let sessions = self.state.sessions();
        sessions.clear(storage).await;

        if self.state.mock_mode() {
            let user = User::from_document(&document);
            sessions.save(storage, user.clone(), None, true, None).await;
            info!("Mock session started");
            set_sentry_user(&user.id, None);
            return Ok(user);
        }

        let auth = self
            .state
            .dso()
            .authenticate(document.as_str(), &password)
            .await?;

        let user = self.resolve_user(&document, &auth).await;
        sessions
            .save(
                storage,
                user.clone(),
                Some(auth.access_token),
                false,
                Some(Credentials::new(document.into_inner(), password)),
            )
            .await;

        info!(donor = %user.id, "Donor signed in");
        set_sentry_user(&user.id, Some(&user.email));
        add_breadcrumb("auth", "Signed in", None);
        Ok(user)
    }

    /// The user behind a fresh token: from the authentication response when
    /// it carries one, else from the profile endpoint, else a minimal user.
    async fn resolve_user(&self, document: &Document, auth: &crate::dso::AuthToken) -> User {
        let aliases = self.state.aliases();

        if let Some(profile) = auth
            .user
            .as_ref()
            .and_then(|raw| normalize_profile(raw, aliases))
        {
            return profile.user;
        }

        match self.state.dso().get_profile(&auth.access_token).await {
            Ok(raw) => {
                if let Some(profile) = normalize_profile(&raw, aliases) {
                    return profile.user;
                }
                warn!("Profile after login could not be normalized");
            }
            Err(e) => warn!(error = %e, "Profile fetch after login failed"),
        }
        User::from_document(document)
    }

    /// End the session.
    #[instrument(skip(self, storage))]
    pub async fn logout(&self, storage: &dyn SessionStorage) {
        self.state.sessions().clear(storage).await;
        clear_sentry_user();
        info!("Donor signed out");
    }
}
