//! Login, logout, session expiry and silent token renewal.

use std::time::Duration;

use reqwest::{StatusCode, header::SET_COOKIE};
use serde_json::Value;

use donor_portal::config::{DsoConfig, PortalConfig};
use donor_portal_integration_tests::{DONOR_ID, MockDso, TestPortal};

fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(ToString::to_string)
        .collect()
}

#[tokio::test]
async fn test_login_returns_user_and_sets_token_cookie() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;

    let response = portal.login().await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert!(
        cookies.iter().any(|c| c.starts_with("dso_token=token-1")),
        "cookies: {cookies:?}"
    );
    assert!(cookies.iter().any(|c| c.starts_with("portal_session=")));

    let user: Value = response.json().await.expect("user json");
    assert_eq!(user["id"], DONOR_ID);
    assert_eq!(user["email"], "maria@example.org");
    assert_eq!(user["donorType"], "sponsor");
    assert_eq!(user["document"], "52998224725");

    let session: Value = portal.get("/api/auth/session").await.json().await.expect("session json");
    assert_eq!(session["user"]["id"], DONOR_ID);
    assert_eq!(session["isMock"], false);
    assert!(session["expiresAt"].is_string());
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;

    let response = portal.login_with("529.982.247-25", "wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("error json");
    assert!(body["error"].is_string());

    let session = portal.get("/api/auth/session").await;
    assert_eq!(session.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_document_never_reaches_backend() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;

    let response = portal.login_with("123.456.789-00", "whatever").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(dso.auth_calls(), 0);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;
    portal.login().await;

    let response = portal
        .client
        .post(portal.at("/api/auth/logout"))
        .send()
        .await
        .expect("logout request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let session = portal.get("/api/auth/session").await;
    assert_eq!(session.status(), StatusCode::UNAUTHORIZED);
    let profile = portal.get("/api/account/profile").await;
    assert_eq!(profile.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_renewed_exactly_once() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;
    portal.login().await;
    dso.expire_tokens();

    let response = portal.get("/api/account/profile").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("dso_token=token-2"))
    );

    let user: Value = response.json().await.expect("user json");
    assert_eq!(user["address"]["city"], "São Paulo");
    assert_eq!(user["address"]["state"], "SP");
    assert_eq!(user["address"]["address"], "Rua das Flores");

    // One login, one renewal; one rejected fetch, one retry
    assert_eq!(dso.auth_calls(), 2);
    assert_eq!(dso.profile_calls(), 2);

    let session = portal.get("/api/auth/session").await;
    assert_eq!(session.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_failed_renewal_signs_out() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;
    portal.login().await;
    dso.expire_tokens();
    dso.refuse_logins();

    let response = portal.get("/api/account/profile").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(dso.auth_calls(), 2);
    assert_eq!(dso.profile_calls(), 1);

    let session = portal.get("/api/auth/session").await;
    assert_eq!(session.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_fetches_are_throttled() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;
    portal.login().await;

    for _ in 0..3 {
        let response = portal.get("/api/account/profile").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(dso.profile_calls(), 1);
}

#[tokio::test]
async fn test_session_expires_after_ttl() {
    let dso = MockDso::start().await;
    let mut config = PortalConfig::with_dso(DsoConfig::for_base_url(dso.url()));
    config.session.ttl = Duration::from_secs(1);
    let portal = TestPortal::with_config(config).await;

    portal.login().await;
    assert_eq!(
        portal.get("/api/auth/session").await.status(),
        StatusCode::OK
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(
        portal.get("/api/auth/session").await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_mock_mode_login_skips_backend() {
    let mut dso_config = DsoConfig::for_base_url("http://127.0.0.1:9");
    dso_config.mock_mode = true;
    let portal = TestPortal::with_config(PortalConfig::with_dso(dso_config)).await;

    let response = portal.login_with("529.982.247-25", "anything").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("dso_token=token"))
    );

    let user: Value = response.json().await.expect("user json");
    assert_eq!(user["id"], "52998224725");

    let session: Value = portal.get("/api/auth/session").await.json().await.expect("session json");
    assert_eq!(session["isMock"], true);
}

#[tokio::test]
async fn test_rejected_token_without_credentials_is_not_retried() {
    use donor_portal::AppState;
    use donor_portal::models::User;
    use donor_portal::services::ProfileService;
    use donor_portal::session::MemoryStorage;
    use donor_portal_core::Document;
    use secrecy::SecretString;

    let dso = MockDso::start().await;
    dso.expire_tokens();
    let state = AppState::new(PortalConfig::with_dso(DsoConfig::for_base_url(dso.url())))
        .expect("state");

    let storage = MemoryStorage::new();
    let document = Document::parse("529.982.247-25").expect("valid cpf");
    state
        .sessions()
        .save(
            &storage,
            User::from_document(&document),
            Some(SecretString::from("token-0")),
            false,
            None,
        )
        .await;

    let profile = ProfileService::new(&state).fetch(&storage).await;
    assert!(profile.is_none());
    assert_eq!(dso.profile_calls(), 1);
    assert_eq!(dso.auth_calls(), 0);
    assert!(state.sessions().load(&storage).await.is_none());
}
