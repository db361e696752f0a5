//! DSO authentication.
//!
//! Exchanges a donor's document (CPF) and password for a bearer token.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use super::DsoError;

/// Authentication endpoint, relative to the DSO base URL.
pub const AUTH_PATH: &str = "/api/v1/authentication";

/// Where the token may appear in an authentication response, in order.
const TOKEN_POINTERS: &[&str] = &[
    "/token",
    "/accessToken",
    "/access_token",
    "/data/token",
    "/data/accessToken",
];

/// Where a user record may appear in an authentication response.
const USER_POINTERS: &[&str] = &["/user", "/data/user", "/profile"];

/// Token obtained from a successful authentication.
#[derive(Debug, Clone)]
pub struct AuthToken {
    /// Bearer token for API requests.
    pub access_token: SecretString,
    /// User record, when the DSO includes one in the response.
    pub user: Option<Value>,
}

/// Request body for DSO authentication.
#[derive(Serialize)]
struct AuthRequest<'a> {
    document: &'a str,
    password: &'a str,
}

/// Authenticate with the DSO using document and password.
///
/// # Errors
///
/// Returns `DsoError::AuthenticationFailed` if the credentials are rejected or
/// the response carries no token.
#[instrument(skip(client, password), fields(document = %mask_document(document)))]
pub async fn authenticate(
    client: &reqwest::Client,
    url: &str,
    client_key: &SecretString,
    document: &str,
    password: &SecretString,
) -> Result<AuthToken, DsoError> {
    let response = client
        .post(url)
        .header(crate::config::CLIENT_KEY_HEADER, client_key.expose_secret())
        .json(&AuthRequest {
            document,
            password: password.expose_secret(),
        })
        .send()
        .await?;

    let status = response.status();

    if status.is_success() {
        let body: Value = response.json().await?;
        parse_auth_response(&body)
    } else if status == reqwest::StatusCode::UNAUTHORIZED
        || status == reqwest::StatusCode::FORBIDDEN
        || status == reqwest::StatusCode::BAD_REQUEST
    {
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = error_message(&body).unwrap_or_else(|| "Invalid credentials".to_string());
        Err(DsoError::AuthenticationFailed(message))
    } else {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(DsoError::AuthenticationFailed(format!(
            "HTTP {status}: {error_text}"
        )))
    }
}

/// Pull the token and optional user record out of a 2xx response body.
fn parse_auth_response(body: &Value) -> Result<AuthToken, DsoError> {
    if crate::normalize::fields::is_failure(body) {
        let message = error_message(body).unwrap_or_else(|| "Invalid credentials".to_string());
        return Err(DsoError::AuthenticationFailed(message));
    }

    let token = TOKEN_POINTERS
        .iter()
        .find_map(|pointer| body.pointer(pointer).and_then(Value::as_str))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| DsoError::AuthenticationFailed("no token in response".to_string()))?;

    let user = USER_POINTERS
        .iter()
        .find_map(|pointer| body.pointer(pointer).filter(|v| v.is_object()))
        .cloned();

    Ok(AuthToken {
        access_token: SecretString::from(token.to_string()),
        user,
    })
}

/// The `message` or `error` text of an error body.
pub(crate) fn error_message(body: &Value) -> Option<String> {
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(ToString::to_string)
}

/// Keep only the last two digits of a document for logging.
#[must_use]
pub fn mask_document(document: &str) -> String {
    let digits: Vec<char> = document.chars().filter(char::is_ascii_digit).collect();
    let visible: String = digits.iter().rev().take(2).rev().collect();
    format!("***{visible}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_token_locations() {
        for body in [
            json!({ "token": "t1" }),
            json!({ "accessToken": "t1" }),
            json!({ "access_token": "t1" }),
            json!({ "data": { "token": "t1" } }),
        ] {
            let token = parse_auth_response(&body).expect("token");
            assert_eq!(token.access_token.expose_secret(), "t1");
        }
    }

    #[test]
    fn test_user_record_extracted() {
        let body = json!({ "token": "t1", "data": { "user": { "id": 5 } } });
        let token = parse_auth_response(&body).expect("token");
        assert_eq!(token.user, Some(json!({ "id": 5 })));
    }

    #[test]
    fn test_missing_token_fails() {
        let err = parse_auth_response(&json!({ "ok": true })).expect_err("no token");
        assert!(matches!(err, DsoError::AuthenticationFailed(_)));

        let err = parse_auth_response(&json!({ "token": "" })).expect_err("empty token");
        assert!(matches!(err, DsoError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_failure_body_fails_with_message() {
        let err = parse_auth_response(&json!({ "success": false, "message": "Senha inválida" }))
            .expect_err("failure");
        assert_eq!(err.to_string(), "Authentication failed: Senha inválida");
    }

    #[test]
    fn test_mask_document() {
        assert_eq!(mask_document("529.982.247-25"), "***25");
        assert_eq!(mask_document(""), "***");
    }
}
