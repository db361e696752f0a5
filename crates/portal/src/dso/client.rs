//! DSO REST API client.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use super::auth::{self, AUTH_PATH, AuthToken, error_message};
use super::types::{
    DebitRequest, GiftRequest, LetterQuery, LetterRequest, OrderHistoryQuery, OrderRequest,
    ProfileUpdate, VisitRequest,
};
use super::DsoError;
use crate::config::{CLIENT_KEY_HEADER, DsoConfig};
use crate::normalize::fields::is_failure;

const PROFILE_PATH: &str = "/api/v1/my-profile";
const CHILDREN_PATH: &str = "/api/v1/childfund/list-children";
const ORDER_HISTORY_PATH: &str = "/api/v1/user-order-generator";
const GENERATE_ORDER_PATH: &str = "/api/v1/generator-orders";
const PAYMENT_DEBIT_PATH: &str = "/api/v1/childfund/payment/debit";
const SCHEDULE_VISIT_PATH: &str = "/api/v1/childfund/relationship/schedule-visit";
const SEND_LETTER_PATH: &str = "/api/v1/childfund/relationship/send-letter";
const SEND_GIFT_PATH: &str = "/api/v1/childfund/relationship/send-gift";
const LIST_LETTERS_PATH: &str = "/api/v1/childfund/relationship/list-all-letters";

/// Default `Retry-After` when a 429 does not say.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// DSO API client.
///
/// Holds no donor state: every donor call takes the donor's bearer token, so
/// one client is shared by all sessions.
#[derive(Clone)]
pub struct DsoClient {
    inner: Arc<DsoClientInner>,
}

struct DsoClientInner {
    client: reqwest::Client,
    base_url: String,
    client_key: SecretString,
}

impl DsoClient {
    /// Create a new DSO client.
    ///
    /// # Errors
    ///
    /// Returns `DsoError::Http` if the HTTP client cannot be built.
    pub fn new(config: &DsoConfig) -> Result<Self, DsoError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(DsoClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                client_key: config.client_key.clone(),
            }),
        })
    }

    /// The DSO base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn request(&self, method: Method, path: &str, token: &SecretString) -> RequestBuilder {
        self.inner
            .client
            .request(method, self.url(path))
            .bearer_auth(token.expose_secret())
            .header(CLIENT_KEY_HEADER, self.inner.client_key.expose_secret())
    }

    /// Send a request and map the status to a `DsoError`.
    ///
    /// Empty 2xx bodies come back as `Value::Null`.
    async fn send(&self, request: RequestBuilder) -> Result<Value, DsoError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DsoError::Unauthorized);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(DsoError::RateLimited(retry_after));
        }

        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| error_message(&body))
                .unwrap_or(text);
            return Err(DsoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Send a donor action and treat a failure body as an error.
    async fn send_action<B: Serialize + Sync>(
        &self,
        path: &str,
        token: &SecretString,
        body: &B,
    ) -> Result<Value, DsoError> {
        let value = self
            .send(self.request(Method::POST, path, token).json(body))
            .await?;
        if is_failure(&value) {
            let message = error_message(&value).unwrap_or_else(|| "request rejected".to_string());
            return Err(DsoError::Rejected(message));
        }
        Ok(value)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange document and password for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `DsoError::AuthenticationFailed` if the credentials are rejected.
    pub async fn authenticate(
        &self,
        document: &str,
        password: &SecretString,
    ) -> Result<AuthToken, DsoError> {
        auth::authenticate(
            &self.inner.client,
            &self.url(AUTH_PATH),
            &self.inner.client_key,
            document,
            password,
        )
        .await
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Fetch the raw profile of the token's donor.
    ///
    /// # Errors
    ///
    /// Returns `DsoError::Unauthorized` when the token is no longer accepted.
    #[instrument(skip(self, token))]
    pub async fn get_profile(&self, token: &SecretString) -> Result<Value, DsoError> {
        self.send(self.request(Method::GET, PROFILE_PATH, token))
            .await
    }

    /// Update the token's donor profile.
    ///
    /// # Errors
    ///
    /// Returns `DsoError` on HTTP failure or a failure body.
    #[instrument(skip(self, token, update))]
    pub async fn update_profile(
        &self,
        token: &SecretString,
        update: &ProfileUpdate,
    ) -> Result<Value, DsoError> {
        let value = self
            .send(self.request(Method::PUT, PROFILE_PATH, token).json(update))
            .await?;
        if is_failure(&value) {
            let message = error_message(&value).unwrap_or_else(|| "update rejected".to_string());
            return Err(DsoError::Rejected(message));
        }
        Ok(value)
    }

    // =========================================================================
    // Sponsorship
    // =========================================================================

    /// List the donor's sponsored children.
    ///
    /// # Errors
    ///
    /// Returns `DsoError` on HTTP failure.
    #[instrument(skip(self, token))]
    pub async fn list_children(&self, token: &SecretString) -> Result<Value, DsoError> {
        self.send(self.request(Method::GET, CHILDREN_PATH, token))
            .await
    }

    /// List letters exchanged with sponsored children.
    ///
    /// # Errors
    ///
    /// Returns `DsoError` on HTTP failure.
    #[instrument(skip(self, token))]
    pub async fn list_letters(
        &self,
        token: &SecretString,
        query: &LetterQuery,
    ) -> Result<Value, DsoError> {
        self.send(self.request(Method::POST, LIST_LETTERS_PATH, token).json(query))
            .await
    }

    /// Send a letter to a sponsored child.
    ///
    /// # Errors
    ///
    /// Returns `DsoError` on HTTP failure or a failure body.
    #[instrument(skip(self, token, letter), fields(child_id = %letter.child_id))]
    pub async fn send_letter(
        &self,
        token: &SecretString,
        letter: &LetterRequest,
    ) -> Result<Value, DsoError> {
        self.send_action(SEND_LETTER_PATH, token, letter).await
    }

    /// Ask to visit a sponsored child.
    ///
    /// # Errors
    ///
    /// Returns `DsoError` on HTTP failure or a failure body.
    #[instrument(skip(self, token, visit), fields(child_id = %visit.child_id))]
    pub async fn schedule_visit(
        &self,
        token: &SecretString,
        visit: &VisitRequest,
    ) -> Result<Value, DsoError> {
        self.send_action(SCHEDULE_VISIT_PATH, token, visit).await
    }

    /// Send a gift to a sponsored child.
    ///
    /// # Errors
    ///
    /// Returns `DsoError` on HTTP failure or a failure body.
    #[instrument(skip(self, token, gift), fields(child_id = %gift.child_id, amount = %gift.amount))]
    pub async fn send_gift(
        &self,
        token: &SecretString,
        gift: &GiftRequest,
    ) -> Result<Value, DsoError> {
        self.send_action(SEND_GIFT_PATH, token, gift).await
    }

    // =========================================================================
    // Orders & payments
    // =========================================================================

    /// Fetch the donor's order history.
    ///
    /// The response shape varies; see [`crate::normalize::fields::collection`].
    ///
    /// # Errors
    ///
    /// Returns `DsoError` on HTTP failure.
    #[instrument(skip(self, token, query), fields(contact_id = %query.contact_id))]
    pub async fn order_history(
        &self,
        token: &SecretString,
        query: &OrderHistoryQuery,
    ) -> Result<Value, DsoError> {
        self.send(self.request(Method::POST, ORDER_HISTORY_PATH, token).json(query))
            .await
    }

    /// Create an order for a donation or sponsorship.
    ///
    /// # Errors
    ///
    /// Returns `DsoError` on HTTP failure or a failure body.
    #[instrument(skip(self, token, order), fields(product_id = %order.product_id, amount = %order.amount))]
    pub async fn generate_order(
        &self,
        token: &SecretString,
        order: &OrderRequest,
    ) -> Result<Value, DsoError> {
        self.send_action(GENERATE_ORDER_PATH, token, order).await
    }

    /// Charge a direct debit payment.
    ///
    /// # Errors
    ///
    /// Returns `DsoError` on HTTP failure or a failure body.
    #[instrument(skip(self, token, payment), fields(amount = %payment.amount))]
    pub async fn payment_debit(
        &self,
        token: &SecretString,
        payment: &DebitRequest,
    ) -> Result<Value, DsoError> {
        self.send_action(PAYMENT_DEBIT_PATH, token, payment).await
    }
}

impl std::fmt::Debug for DsoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsoClient")
            .field("base_url", &self.inner.base_url)
            .field("client_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = DsoConfig::for_base_url("http://localhost:9999/");
        let client = DsoClient::new(&config).expect("client");
        assert_eq!(client.base_url(), "http://localhost:9999");
        assert_eq!(client.url(PROFILE_PATH), "http://localhost:9999/api/v1/my-profile");
    }

    #[test]
    fn test_debug_redacts_client_key() {
        let config = DsoConfig::for_base_url("http://localhost:9999");
        let client = DsoClient::new(&config).expect("client");
        let debug = format!("{client:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(config.client_key.expose_secret()));
    }
}
