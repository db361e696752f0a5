//! Integration tests for the donor portal.
//!
//! Each test starts a [`MockDso`] (an in-process stand-in for the DSO CRM)
//! and a portal server pointed at it, both on ephemeral ports, then drives
//! the portal over HTTP with a cookie-keeping client like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p donor-portal-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Login, logout, session expiry and token renewal
//! - `account` - Profile, donations and payments

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use donor_portal::AppState;
use donor_portal::config::{DsoConfig, PortalConfig};

/// A CPF with valid check digits.
pub const DOCUMENT: &str = "529.982.247-25";

/// The only password the mock DSO accepts.
pub const PASSWORD: &str = "correct horse";

/// Donor id the mock DSO assigns.
pub const DONOR_ID: &str = "D-100";

#[derive(Debug)]
struct MockState {
    auth_calls: AtomicUsize,
    profile_calls: AtomicUsize,
    history_calls: AtomicUsize,
    /// Tokens issued before this generation are rejected with 401.
    first_valid_token: AtomicUsize,
    /// Authentications beyond this count fail.
    auth_limit: AtomicUsize,
}

/// In-process DSO stand-in.
///
/// Issues tokens `token-1`, `token-2`, ... in login order and counts the
/// calls it receives, so tests can assert how often the portal reached it.
#[derive(Debug, Clone)]
pub struct MockDso {
    url: String,
    state: Arc<MockState>,
}

impl MockDso {
    /// Start the mock on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            auth_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
            first_valid_token: AtomicUsize::new(0),
            auth_limit: AtomicUsize::new(usize::MAX),
        });

        let router = Router::new()
            .route("/api/v1/authentication", post(authenticate))
            .route("/api/v1/my-profile", get(profile))
            .route("/api/v1/user-order-generator", post(order_history))
            .route("/api/v1/childfund/payment/debit", post(debit))
            .route("/api/v1/childfund/list-children", get(children))
            .with_state(Arc::clone(&state));

        let url = serve(router).await;
        Self { url, state }
    }

    /// Base URL of the mock.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Reject every token issued so far, as if they had expired upstream.
    pub fn expire_tokens(&self) {
        let issued = self.state.auth_calls.load(Ordering::SeqCst);
        self.state
            .first_valid_token
            .store(issued + 1, Ordering::SeqCst);
    }

    /// Fail every authentication after the ones already made.
    pub fn refuse_logins(&self) {
        let made = self.state.auth_calls.load(Ordering::SeqCst);
        self.state.auth_limit.store(made, Ordering::SeqCst);
    }

    #[must_use]
    pub fn auth_calls(&self) -> usize {
        self.state.auth_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn profile_calls(&self) -> usize {
        self.state.profile_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn history_calls(&self) -> usize {
        self.state.history_calls.load(Ordering::SeqCst)
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
}

/// Check the bearer token against the current token generation.
fn token_valid(state: &MockState, headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer token-"))
        .and_then(|n| n.parse::<usize>().ok())
        .is_some_and(|n| n >= state.first_valid_token.load(Ordering::SeqCst))
}

async fn authenticate(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Response {
    let generation = state.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;

    if generation > state.auth_limit.load(Ordering::SeqCst)
        || body.get("password").and_then(Value::as_str) != Some(PASSWORD)
    {
        return unauthorized("Usuário ou senha inválidos");
    }

    Json(json!({
        "data": {
            "accessToken": format!("token-{generation}"),
            "user": {
                "contactId": DONOR_ID,
                "nome": "Maria da Silva",
                "cpf": "52998224725",
                "email": "MARIA@EXAMPLE.ORG",
                "tipoDoador": "padrinho",
            }
        }
    }))
    .into_response()
}

async fn profile(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.profile_calls.fetch_add(1, Ordering::SeqCst);
    if !token_valid(&state, &headers) {
        return unauthorized("Token expirado");
    }

    Json(json!({
        "data": {
            "contactId": DONOR_ID,
            "nome": "Maria da Silva",
            "cpf": "529.982.247-25",
            "email": "maria@example.org",
            "tipoDoador": "padrinho",
            "cidade": "SÃ£o Paulo",
            "endereco": { "logradouro": "Rua das Flores", "numero": "10", "uf": "sp" },
            "products": [
                {
                    "id": "ORD-1",
                    "name": "Apadrinhamento",
                    "value": "45,00",
                    "startDate": "10/01/2026",
                    "status": "ativo"
                },
                { "id": "PRD-9", "name": "Doação mensal", "value": 30 }
            ]
        }
    }))
    .into_response()
}

async fn order_history(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.history_calls.fetch_add(1, Ordering::SeqCst);
    if !token_valid(&state, &headers) {
        return unauthorized("Token expirado");
    }

    Json(json!({
        "data": {
            "orders": [
                {
                    "orderId": "ORD-1",
                    "description": "Apadrinhamento",
                    "amount": 45,
                    "paymentDate": "2026-01-10T12:00:00Z",
                    "paymentStatus": "PAGO"
                },
                {
                    "orderId": "ORD-2",
                    "description": "Doação única",
                    "amount": 100,
                    "paymentDate": "2026-02-20",
                    "paymentStatus": "pending"
                }
            ]
        }
    }))
    .into_response()
}

async fn debit(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !token_valid(&state, &headers) {
        return unauthorized("Token expirado");
    }
    Json(json!({ "success": true, "transactionId": "ORD-3", "status": "approved" }))
        .into_response()
}

async fn children(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !token_valid(&state, &headers) {
        return unauthorized("Token expirado");
    }
    Json(json!([
        { "childId": "C-1", "name": "Ana", "age": 8, "country": "Brasil" },
        { "name": "sem id" }
    ]))
    .into_response()
}

/// Serve `router` on an ephemeral local port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    format!("http://{addr}")
}

/// A running portal and a browser-like client for it.
pub struct TestPortal {
    pub url: String,
    pub client: reqwest::Client,
}

impl TestPortal {
    /// Start a portal against `dso` with default settings.
    pub async fn start(dso: &MockDso) -> Self {
        Self::with_config(PortalConfig::with_dso(DsoConfig::for_base_url(dso.url()))).await
    }

    /// Start a portal with an explicit configuration.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    pub async fn with_config(config: PortalConfig) -> Self {
        let state = AppState::new(config).expect("Failed to build app state");
        let url = serve(donor_portal::app(state)).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { url, client }
    }

    /// Full URL for a portal path.
    #[must_use]
    pub fn at(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    /// Sign in with the mock's credentials.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn login(&self) -> reqwest::Response {
        self.login_with(DOCUMENT, PASSWORD).await
    }

    /// Sign in with explicit credentials.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn login_with(&self, document: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.at("/api/auth/login"))
            .json(&json!({ "document": document, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET a portal path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.at(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// POST JSON to a portal path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.at(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }
}
