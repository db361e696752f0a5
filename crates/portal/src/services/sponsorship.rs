//! Sponsored children, letters, visits and gifts.

use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use donor_portal_core::{Amount, ChildId};

use crate::cache::{CacheValue, Resource};
use crate::dso::{GiftRequest, LetterQuery, LetterRequest, VisitRequest};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{Child, Letter};
use crate::normalize::{normalize_children, normalize_letters};
use crate::session::SessionStorage;
use crate::state::AppState;

use super::{require_session, require_token, throttle_key};

/// Longest letter body the DSO accepts.
pub const MAX_LETTER_LENGTH: usize = 5000;

/// Sponsorship service.
pub struct SponsorshipService<'a> {
    state: &'a AppState,
}

impl<'a> SponsorshipService<'a> {
    /// Create a new sponsorship service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The donor's sponsored children. Empty on any failure.
    #[instrument(skip(self, storage))]
    pub async fn children(&self, storage: &dyn SessionStorage) -> Vec<Child> {
        let Some(session) = self.state.sessions().load(storage).await else {
            return Vec::new();
        };
        if session.is_mock {
            return Vec::new();
        }

        let donor = &session.user.id;
        if !self
            .state
            .throttle()
            .should_fetch(&throttle_key(Resource::Children, donor))
            && let Some(children) = self.state.cache().children(donor).await
        {
            debug!("Children fetch throttled, serving cached list");
            return children;
        }

        let Some(token) = session.token.as_ref() else {
            return Vec::new();
        };
        match self.state.dso().list_children(token).await {
            Ok(raw) => {
                let children = normalize_children(&raw);
                self.state
                    .cache()
                    .insert(donor, CacheValue::Children(children.clone()))
                    .await;
                children
            }
            Err(e) => {
                warn!(error = %e, "Failed to list children");
                Vec::new()
            }
        }
    }

    /// Letters, newest first, optionally for one child. Empty on any failure.
    ///
    /// Only the unfiltered list is cached.
    #[instrument(skip(self, storage))]
    pub async fn letters(&self, storage: &dyn SessionStorage, child_id: Option<ChildId>) -> Vec<Letter> {
        let Some(session) = self.state.sessions().load(storage).await else {
            return Vec::new();
        };
        if session.is_mock {
            return Vec::new();
        }

        let donor = &session.user.id;
        let all = child_id.is_none();
        if all
            && !self
                .state
                .throttle()
                .should_fetch(&throttle_key(Resource::Letters, donor))
            && let Some(letters) = self.state.cache().letters(donor).await
        {
            debug!("Letters fetch throttled, serving cached list");
            return letters;
        }

        let Some(token) = session.token.as_ref() else {
            return Vec::new();
        };
        match self
            .state
            .dso()
            .list_letters(token, &LetterQuery { child_id })
            .await
        {
            Ok(raw) => {
                let letters = normalize_letters(&raw);
                if all {
                    self.state
                        .cache()
                        .insert(donor, CacheValue::Letters(letters.clone()))
                        .await;
                }
                letters
            }
            Err(e) => {
                warn!(error = %e, "Failed to list letters");
                Vec::new()
            }
        }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Send a letter to a sponsored child.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an empty or oversized letter,
    /// `AppError::Unauthorized` without a session, and `AppError::Dso` if the
    /// DSO rejects the letter.
    #[instrument(skip(self, storage, letter), fields(child_id = %letter.child_id))]
    pub async fn send_letter(&self, storage: &dyn SessionStorage, letter: &LetterRequest) -> Result<Value> {
        validate_child(&letter.child_id)?;
        if letter.body.trim().is_empty() {
            return Err(AppError::BadRequest("Letter cannot be empty".to_string()));
        }
        if letter.body.chars().count() > MAX_LETTER_LENGTH {
            return Err(AppError::BadRequest(format!(
                "Letter cannot exceed {MAX_LETTER_LENGTH} characters"
            )));
        }

        let session = require_session(self.state, storage).await?;
        let result = if session.is_mock {
            mock_accepted()
        } else {
            self.state
                .dso()
                .send_letter(require_token(&session)?, letter)
                .await?
        };

        self.state
            .cache()
            .invalidate(Resource::Letters, &session.user.id)
            .await;
        self.state
            .throttle()
            .reset(&throttle_key(Resource::Letters, &session.user.id));
        add_breadcrumb(
            "sponsorship",
            "Sent letter",
            Some(&[("child_id", letter.child_id.as_str())]),
        );
        Ok(result)
    }

    /// Ask to visit a sponsored child.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` without a preferred date,
    /// `AppError::Unauthorized` without a session, and `AppError::Dso` if the
    /// DSO rejects the request.
    #[instrument(skip(self, storage, visit), fields(child_id = %visit.child_id))]
    pub async fn schedule_visit(&self, storage: &dyn SessionStorage, visit: &VisitRequest) -> Result<Value> {
        validate_child(&visit.child_id)?;
        if visit.preferred_date.trim().is_empty() {
            return Err(AppError::BadRequest("Preferred date is required".to_string()));
        }

        let session = require_session(self.state, storage).await?;
        let result = if session.is_mock {
            mock_accepted()
        } else {
            self.state
                .dso()
                .schedule_visit(require_token(&session)?, visit)
                .await?
        };

        add_breadcrumb(
            "sponsorship",
            "Requested visit",
            Some(&[("child_id", visit.child_id.as_str())]),
        );
        Ok(result)
    }

    /// Send a gift to a sponsored child.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a zero amount, `AppError::Unauthorized`
    /// without a session, and `AppError::Dso` if the DSO rejects the gift.
    #[instrument(skip(self, storage, gift), fields(child_id = %gift.child_id))]
    pub async fn send_gift(&self, storage: &dyn SessionStorage, gift: &GiftRequest) -> Result<Value> {
        validate_child(&gift.child_id)?;
        if gift.amount == Amount::ZERO {
            return Err(AppError::BadRequest("Gift amount must be positive".to_string()));
        }

        let session = require_session(self.state, storage).await?;
        let result = if session.is_mock {
            mock_accepted()
        } else {
            self.state
                .dso()
                .send_gift(require_token(&session)?, gift)
                .await?
        };

        let amount = gift.amount.to_string();
        add_breadcrumb(
            "sponsorship",
            "Sent gift",
            Some(&[("child_id", gift.child_id.as_str()), ("amount", amount.as_str())]),
        );
        Ok(result)
    }
}

fn validate_child(child_id: &ChildId) -> Result<()> {
    if child_id.as_str().trim().is_empty() {
        return Err(AppError::BadRequest("Child is required".to_string()));
    }
    Ok(())
}

/// Response for actions accepted without reaching the DSO.
fn mock_accepted() -> Value {
    json!({ "success": true, "mock": true })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_child() {
        assert!(validate_child(&ChildId::new("C-1")).is_ok());
        assert!(matches!(
            validate_child(&ChildId::new("  ")),
            Err(AppError::BadRequest(_))
        ));
    }
}
