//! Session endpoints: login, logout and password reset
//!
//! Login and the reset endpoints skip bearer auth. Token refresh is not
//! exposed here; it is driven by the client's refresh coordinator through
//! `fleet_auth::refresh_token`.

use fleet_auth::{
    LOGIN_PATH, LOGOUT_PATH, REQUEST_RESET_PATH, RESET_PASSWORD_PATH, StoredUser, TokenResponse,
    decode_claims,
};
use fleet_client::{ApiClient, ApiError, ApiRequest, Result, RetryConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Minimum accepted length for a new password.
pub const MIN_PASSWORD_LEN: usize = 8;

const INVALID_TOKEN_MESSAGE: &str = "Invalid token received from server";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ResetRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    token: &'a str,
    new_password: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Log in and store the new session.
///
/// The profile comes from the access token payload, which is decoded
/// without signature verification. A token whose payload cannot be decoded
/// fails the login with status 500 and nothing is stored.
pub async fn login(client: &ApiClient, email: &str, password: &str) -> Result<StoredUser> {
    let request = ApiRequest::post(LOGIN_PATH)
        .skip_auth()
        .retry(RetryConfig::disabled())
        .json(&LoginRequest { email, password })?;
    let tokens: TokenResponse = client.call(request, "Invalid credentials").await?;

    let claims = decode_claims(&tokens.access_token).map_err(|e| {
        warn!(error = %e, "login returned an undecodable access token");
        ApiError::Http {
            message: INVALID_TOKEN_MESSAGE.to_string(),
            status: 500,
            body: None,
        }
    })?;
    let user = claims.into_user();

    if let Err(e) = client.store().set(&tokens.into_credentials(), &user).await {
        warn!(error = %e, "failed to persist session, continuing with in-memory session");
    }
    client.session_started();
    info!(user_id = %user.id, role = user.role.label(), "logged in");
    Ok(user)
}

/// End the session. The server call is best effort; local state is always
/// cleared.
pub async fn logout(client: &ApiClient) {
    if let Some(refresh) = client.store().refresh_token().await {
        match ApiRequest::post(LOGOUT_PATH).bearer(&refresh) {
            Ok(request) => match client.send(request.retry(RetryConfig::disabled())).await {
                Ok(response) if !response.is_success() => {
                    debug!(status = response.status().as_u16(), "server rejected logout");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "logout request failed"),
            },
            Err(e) => warn!(error = %e, "stored refresh token is not sendable"),
        }
    }

    if let Err(e) = client.store().clear().await {
        warn!(error = %e, "failed to clear persisted session");
    }
    client.session_ended();
    info!("logged out");
}

/// Profile of the stored session, if any.
pub async fn current_user(client: &ApiClient) -> Option<StoredUser> {
    client.store().user().await
}

/// Ask the server to email a reset link. Returns the server's message.
pub async fn request_password_reset(client: &ApiClient, email: &str) -> Result<Option<String>> {
    let request = ApiRequest::post(REQUEST_RESET_PATH)
        .skip_auth()
        .json(&ResetRequest { email })?;
    let response: Option<MessageResponse> = client
        .call(request, "Failed to send reset link")
        .await?;
    Ok(response.and_then(|r| r.message))
}

/// Set a new password using the token from a reset link.
pub async fn reset_password(
    client: &ApiClient,
    token: &str,
    new_password: &str,
) -> Result<Option<String>> {
    if token.is_empty() {
        return Err(ApiError::Request("reset token is required".into()));
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    let request = ApiRequest::post(RESET_PASSWORD_PATH)
        .skip_auth()
        .json(&ResetPasswordRequest {
            token,
            new_password,
        })?;
    let response: Option<MessageResponse> = client
        .call(request, "Failed to reset password")
        .await?;
    Ok(response.and_then(|r| r.message))
}
