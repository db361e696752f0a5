//! Profile, donations, sponsorship and payments for a signed-in donor.

use reqwest::StatusCode;
use serde_json::{Value, json};

use donor_portal::config::{DsoConfig, PortalConfig};
use donor_portal_integration_tests::{MockDso, TestPortal};

fn ids(donations: &Value) -> Vec<&str> {
    donations
        .as_array()
        .expect("donation list")
        .iter()
        .filter_map(|d| d["id"].as_str())
        .collect()
}

#[tokio::test]
async fn test_account_routes_require_session() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;

    for path in ["/api/account/profile", "/api/account/donations", "/api/account/children"] {
        assert_eq!(
            portal.get(path).await.status(),
            StatusCode::UNAUTHORIZED,
            "{path}"
        );
    }
    assert_eq!(dso.profile_calls(), 0);
}

#[tokio::test]
async fn test_donations_merge_local_history_and_products() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;
    portal.login().await;

    let response = portal
        .post(
            "/api/account/payments/debit",
            &json!({ "amount": "25.00", "type": "once" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let paid: Value = response.json().await.expect("donation json");
    assert_eq!(paid["id"], "ORD-3");
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["source"], "local");
    assert_eq!(paid["description"], "Doação única");

    let donations: Value = portal
        .get("/api/account/donations")
        .await
        .json()
        .await
        .expect("donations json");

    // Newest first, undated last; ORD-1 from history wins over the product
    assert_eq!(ids(&donations), ["ORD-3", "ORD-2", "ORD-1", "PRD-9"]);

    let ord1 = &donations[2];
    assert_eq!(ord1["source"], "history");
    assert_eq!(ord1["status"], "paid");
    assert_eq!(ord1["type"], "sponsorship");

    let product = &donations[3];
    assert_eq!(product["source"], "server");
    assert_eq!(product["type"], "monthly");
    assert!(product["date"].is_null());

    assert_eq!(dso.history_calls(), 1);
}

#[tokio::test]
async fn test_donation_list_is_cached_until_payment() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;
    portal.login().await;

    portal.get("/api/account/donations").await;
    portal.get("/api/account/donations").await;
    assert_eq!(dso.history_calls(), 1);

    portal
        .post(
            "/api/account/payments/debit",
            &json!({ "amount": 10, "type": "monthly" }),
        )
        .await;
    let donations: Value = portal
        .get("/api/account/donations")
        .await
        .json()
        .await
        .expect("donations json");
    assert_eq!(dso.history_calls(), 2);
    assert_eq!(ids(&donations).first(), Some(&"ORD-3"));
}

#[tokio::test]
async fn test_zero_amount_debit_is_rejected() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;
    portal.login().await;

    let response = portal
        .post("/api/account/payments/debit", &json!({ "amount": 0 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_children_without_id_are_dropped() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;
    portal.login().await;

    let children: Value = portal
        .get("/api/account/children")
        .await
        .json()
        .await
        .expect("children json");
    let children = children.as_array().expect("child list");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["id"], "C-1");
    assert_eq!(children[0]["name"], "Ana");
}

#[tokio::test]
async fn test_mock_mode_keeps_payments_local() {
    let mut dso_config = DsoConfig::for_base_url("http://127.0.0.1:9");
    dso_config.mock_mode = true;
    let portal = TestPortal::with_config(PortalConfig::with_dso(dso_config)).await;
    portal.login().await;

    let donations: Value = portal
        .get("/api/account/donations")
        .await
        .json()
        .await
        .expect("donations json");
    assert_eq!(donations, json!([]));

    let order = portal
        .post(
            "/api/account/orders",
            &json!({ "productId": "P-1", "amount": 50, "type": "monthly" }),
        )
        .await;
    assert_eq!(order.status(), StatusCode::BAD_REQUEST);

    let debit = portal
        .post("/api/account/payments/debit", &json!({ "amount": 50 }))
        .await;
    assert_eq!(debit.status(), StatusCode::CREATED);
    let paid: Value = debit.json().await.expect("donation json");
    assert_eq!(paid["status"], "pending");
    assert!(paid["id"].as_str().is_some_and(|id| id.starts_with("local-")));

    let donations: Value = portal
        .get("/api/account/donations")
        .await
        .json()
        .await
        .expect("donations json");
    assert_eq!(ids(&donations).len(), 1);
}

#[tokio::test]
async fn test_donations_after_token_renewal_keep_history() {
    let dso = MockDso::start().await;
    let portal = TestPortal::start(&dso).await;
    portal.login().await;
    dso.expire_tokens();

    let donations: Value = portal
        .get("/api/account/donations")
        .await
        .json()
        .await
        .expect("donations json");
    assert_eq!(ids(&donations), ["ORD-2", "ORD-1", "PRD-9"]);
    assert_eq!(donations[1]["source"], "history");
    assert_eq!(dso.auth_calls(), 2);
    assert_eq!(dso.history_calls(), 1);

    let cached: Value = portal
        .get("/api/account/donations")
        .await
        .json()
        .await
        .expect("donations json");
    assert_eq!(cached, donations);
    assert_eq!(dso.history_calls(), 1);
}
