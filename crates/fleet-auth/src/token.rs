//! Token refresh against the fleet API
//!
//! POSTs the stored refresh token to `/auth/refresh` and returns the new
//! pair. This call bypasses the retrying dispatcher on purpose: a failed
//! refresh ends the session rather than being retried.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::REFRESH_PATH;
use crate::error::{Error, Result};
use crate::store::Credentials;

/// Response from `/auth/refresh` (and the token part of `/auth/login`).
///
/// `expiresIn` is ignored: the backend encodes it inconsistently between
/// endpoints and expiry is discovered through 401 responses anyway.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenResponse {
    pub fn into_credentials(self) -> Credentials {
        Credentials::new(self.access_token, self.refresh_token)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Exchange a refresh token for a new access/refresh pair.
///
/// 401/403 from the endpoint means the refresh token is revoked or expired
/// and is reported as `InvalidCredentials`. `timeout` bounds the whole
/// exchange, body included; hitting it is an `Http` error.
pub async fn refresh_token(
    client: &reqwest::Client,
    base_url: &str,
    refresh: &str,
    timeout: Option<Duration>,
) -> Result<TokenResponse> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH);

    let mut request = client.post(&url).json(&RefreshRequest {
        refresh_token: refresh,
    });
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request
        .send()
        .await
        .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::InvalidCredentials(format!(
                "refresh token rejected ({status}): {body}"
            )));
        }

        return Err(Error::TokenExchange(format!(
            "refresh endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid refresh response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn token_response_deserializes_camel_case() {
        let json = r#"{"accessToken":"A2","refreshToken":"R2","expiresIn":900}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "A2");
        assert_eq!(token.refresh_token, "R2");
    }

    #[test]
    fn token_response_tolerates_long_shaped_expiry() {
        let json = r#"{"accessToken":"A","refreshToken":"R","expiresIn":{"low":900,"high":0,"unsigned":false}}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.into_credentials().access_token.expose(), "A");
    }

    #[tokio::test]
    async fn refresh_posts_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .and(body_json(serde_json::json!({"refreshToken": "R1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": "A2",
                "refreshToken": "R2",
                "expiresIn": 900
            })))
            .expect(1)
            .mount(&server)
            .await;

        let base = format!("{}/api", server.uri());
        let token = refresh_token(&reqwest::Client::new(), &base, "R1", None)
            .await
            .unwrap();
        assert_eq!(token.access_token, "A2");
        assert_eq!(token.refresh_token, "R2");
    }

    #[tokio::test]
    async fn rejected_refresh_is_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .mount(&server)
            .await;

        let err = refresh_token(&reqwest::Client::new(), &server.uri(), "R1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn server_error_is_token_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = refresh_token(&reqwest::Client::new(), &server.uri(), "R1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TokenExchange(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn malformed_success_body_is_token_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = refresh_token(&reqwest::Client::new(), &server.uri(), "R1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TokenExchange(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_http_error() {
        // Port 9 (discard) on localhost is not listening in test environments
        let err = refresh_token(&reqwest::Client::new(), "http://127.0.0.1:9", "R1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn slow_refresh_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"accessToken": "A2", "refreshToken": "R2"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        let err = refresh_token(
            &reqwest::Client::new(),
            &server.uri(),
            "R1",
            Some(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got: {err:?}");
        assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    }
}
