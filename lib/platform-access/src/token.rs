//! Token endpoint responses and identity token claims.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use gatehouse_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::AuthenticationError;

/// Tokens returned by the provider's token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token for provider APIs.
    pub access_token: String,
    /// Signed identity token (JWT) asserting the user's claims.
    pub id_token: String,
    /// Token lifetime in seconds, if the provider reports one.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Token type, usually "Bearer".
    #[serde(default)]
    pub token_type: Option<String>,
    /// Granted scopes, if the provider reports them.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Claims carried by an identity token.
///
/// Only the claims the session needs are typed; everything else is kept in
/// `other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject: the provider's stable user identifier.
    pub sub: String,
    /// User email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// User display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// URL of the user's profile picture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Remaining claims (iss, aud, exp, ...).
    #[serde(flatten)]
    pub other: Map<String, JsonValue>,
}

/// Decodes the payload of a JWT without verifying signature, issuer,
/// audience or expiry.
///
/// Only for tokens whose authenticity is established some other way, or for
/// development against a provider whose keys are not reachable.
///
/// # Errors
///
/// Returns [`AuthenticationError::MalformedToken`] if the token is not three
/// dot-separated segments, the payload is not base64url, or it is not a JSON
/// object; [`AuthenticationError::MissingClaim`] if `sub` is absent.
pub fn decode_unverified(token: &str) -> Result<IdentityClaims, AuthenticationError> {
    // JWT is base64url(header).base64url(payload).signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthenticationError::MalformedToken {
            reason: format!("expected 3 segments, found {}", parts.len()),
        }
        .into());
    }

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| AuthenticationError::MalformedToken {
            reason: format!("payload is not base64url: {e}"),
        })?;

    let payload: Map<String, JsonValue> =
        serde_json::from_slice(&payload_bytes).map_err(|e| AuthenticationError::MalformedToken {
            reason: format!("payload is not a JSON object: {e}"),
        })?;

    if !payload.get("sub").is_some_and(JsonValue::is_string) {
        return Err(AuthenticationError::MissingClaim {
            claim: "sub".to_string(),
        }
        .into());
    }

    serde_json::from_value(JsonValue::Object(payload)).map_err(|e| {
        AuthenticationError::MalformedToken {
            reason: format!("unexpected claim types: {e}"),
        }
        .into()
    })
}
