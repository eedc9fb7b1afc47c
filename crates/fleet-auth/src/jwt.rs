//! Access token payload decoding
//!
//! The profile shown after login comes from the access token's payload
//! segment. The signature is NOT verified here: the server enforces every
//! authorization decision and the decoded claims are used for display and
//! role-gating only.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::store::{Role, StoredUser};

/// Claims carried in the access token payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub exp: Option<u64>,
}

impl Claims {
    /// Build the stored profile. The backend has no display name field, so
    /// the email local part stands in for it.
    pub fn into_user(self) -> StoredUser {
        let name = self
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();
        StoredUser {
            id: self.sub,
            email: self.email,
            name,
            role: self.role,
            driver_id: self.driver_id,
        }
    }
}

/// Decode the payload segment of a JWT without verifying its signature.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| Error::TokenDecode("token has no payload segment".into()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::TokenDecode(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| Error::TokenDecode(format!("payload is not a claims object: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn decodes_dispatcher_claims() {
        let token = token_with(serde_json::json!({
            "sub": "u-1",
            "email": "ana@fleet.io",
            "role": "DISPATCHER",
            "iat": 1_700_000_000u64,
            "exp": 1_700_000_900u64,
        }));

        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, Role::Dispatcher);
        assert_eq!(claims.exp, Some(1_700_000_900));
        assert!(claims.driver_id.is_none());
    }

    #[test]
    fn into_user_uses_email_local_part_as_name() {
        let token = token_with(serde_json::json!({
            "sub": "u-2",
            "email": "joe.driver@fleet.io",
            "role": "DRIVER",
            "driverId": "d-7",
        }));

        let user = decode_claims(&token).unwrap().into_user();
        assert_eq!(user.name, "joe.driver");
        assert_eq!(user.id, "u-2");
        assert_eq!(user.driver_id.as_deref(), Some("d-7"));
    }

    #[test]
    fn padded_payload_is_accepted() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let body = base64::engine::general_purpose::URL_SAFE
            .encode(r#"{"sub":"u","email":"a@b.c","role":"ADMIN"}"#);
        let token = format!("{header}.{body}.sig");
        assert_eq!(decode_claims(&token).unwrap().role, Role::Admin);
    }

    #[test]
    fn missing_payload_segment_is_rejected() {
        assert!(matches!(
            decode_claims("opaque-token"),
            Err(Error::TokenDecode(_))
        ));
        assert!(matches!(decode_claims("a..c"), Err(Error::TokenDecode(_))));
    }

    #[test]
    fn non_json_payload_is_rejected() {
        let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode("plain text"));
        assert!(matches!(decode_claims(&token), Err(Error::TokenDecode(_))));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let token = token_with(serde_json::json!({
            "sub": "u", "email": "a@b.c", "role": "MECHANIC"
        }));
        assert!(decode_claims(&token).is_err());
    }
}
