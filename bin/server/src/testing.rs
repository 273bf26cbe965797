//! Shared fixtures for the server's unit tests.

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use gatehouse_core::Result;
use gatehouse_kv::{KvError, KvStore, MemoryStore};
use gatehouse_platform_access::{ProviderConfig, TokenSet, TokenValidation};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::auth::{AppState, OidcClient};
use crate::config::SessionConfig;

/// Key ID the test provider publishes its signing key under.
pub const SIGNING_KEY_ID: &str = "test-key-1";

const SIGNING_KEY_PEM: &str = include_str!("../testdata/provider_signing_key.pem");

/// Base64url modulus of the public half of `SIGNING_KEY_PEM`.
const SIGNING_KEY_MODULUS: &str = "xGSP4DZeo8L8VL9x4ZwWHXudC18kYsSdRTRf5gHxuMoAv9Qg7RCIYQP9zG23SO0bm1_YK00iRoJT_XCeSehL6kd2giyK4NuoCey3K4e53d2l_OnL-JokKz65fn0d7HzIVaR6Efj6bFI9VJcinjzQmF8VI9EIZVM1_OUgo0MSAOZdmSvJieRJcXYArjRld7IM9ASQLuBycfkVZSSu3V3DQDJ0LIJVrBGUNn_sOplRXDXAL3CG5l23r1Zz62kQ_2pqHLsYA61Xh6XLoFKuRrmuVN2UgZMHnR785V_ec2ojjPaU0SOANkrwLRFniqQPm4FRYTPMcjzIXA1UI8QU5m6VxQ";

/// A store whose every operation fails.
pub struct FailingStore;

#[async_trait]
impl KvStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
        Err(unavailable().into())
    }

    async fn put(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), KvError> {
        Err(unavailable().into())
    }

    async fn delete(&self, _key: &str) -> Result<(), KvError> {
        Err(unavailable().into())
    }
}

/// A memory store that serves reads and deletes but rejects every write.
#[derive(Default)]
pub struct ReadOnlyStore(pub MemoryStore);

#[async_trait]
impl KvStore for ReadOnlyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        self.0.get(key).await
    }

    async fn put(&self, key: &str, _value: String, _ttl: Duration) -> Result<(), KvError> {
        Err(KvError::OperationFailed {
            operation: "put",
            key: key.to_string(),
            reason: "store is read-only".to_string(),
        }
        .into())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.0.delete(key).await
    }
}

fn unavailable() -> KvError {
    KvError::Unavailable {
        reason: "binding not initialized".to_string(),
    }
}

/// Provider settings pointing at `base` with the given validation mode.
pub fn provider_config(base: &str, mode: TokenValidation) -> ProviderConfig {
    ProviderConfig::builder(
        base.to_string(),
        "client-id".to_string(),
        "client-secret".to_string(),
        "https://app.example.com/auth".to_string(),
    )
    .token_validation(mode)
    .request_timeout_seconds(5)
    .build()
}

/// Provider settings pointing at `base` that skip token verification.
pub fn decode_only_provider(base: &str) -> ProviderConfig {
    provider_config(base, TokenValidation::DecodeOnly)
}

/// Application state over a fresh memory store, trusting unverified tokens.
pub fn test_state(provider_base: &str) -> (Arc<AppState>, Arc<MemoryStore>) {
    state_with_store(provider_base, Arc::new(MemoryStore::new()))
}

/// Application state over `store`, trusting unverified tokens.
pub fn state_with_store<S>(provider_base: &str, store: Arc<S>) -> (Arc<AppState>, Arc<S>)
where
    S: KvStore + 'static,
{
    let client = OidcClient::new(decode_only_provider(provider_base))
        .unwrap_or_else(|e| panic!("test client: {e}"));
    let state = AppState::new(client, store.clone(), SessionConfig::default());
    (Arc::new(state), store)
}

/// Application state over a fresh memory store, verifying tokens against the
/// provider's published key set.
pub fn verifying_state(provider_base: &str) -> (Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let client = OidcClient::new(provider_config(provider_base, TokenValidation::Verify))
        .unwrap_or_else(|e| panic!("test client: {e}"));
    let state = AppState::new(client, store.clone(), SessionConfig::default());
    (Arc::new(state), store)
}

/// Claims for alice from `issuer`, addressed to the test client and valid
/// for ten minutes.
pub fn fresh_claims(issuer: &str) -> JsonValue {
    json!({
        "sub": "auth0|alice",
        "email": "alice@example.com",
        "iss": issuer,
        "aud": "client-id",
        "exp": chrono::Utc::now().timestamp() + 600,
    })
}

/// An unsigned identity token carrying `sub` and optionally `email`.
pub fn id_token(sub: &str, email: Option<&str>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let mut claims = json!({ "sub": sub });
    if let Some(email) = email {
        claims["email"] = json!(email);
    }
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// Signs `claims` with the test provider key under `kid`.
pub fn sign_token(claims: &JsonValue, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY_PEM.as_bytes()).expect("signing key");
    jsonwebtoken::encode(&header, claims, &key).expect("sign")
}

/// The key set the test provider publishes.
pub fn jwks_body() -> JsonValue {
    json!({
        "keys": [{
            "kty": "RSA",
            "kid": SIGNING_KEY_ID,
            "use": "sig",
            "alg": "RS256",
            "n": SIGNING_KEY_MODULUS,
            "e": "AQAB"
        }]
    })
}

/// Token endpoint response tokens carrying `id_token`.
pub fn token_set(id_token: &str) -> TokenSet {
    TokenSet {
        access_token: "access-token".to_string(),
        id_token: id_token.to_string(),
        expires_in: Some(3600),
        token_type: Some("Bearer".to_string()),
        scope: Some("openid profile email".to_string()),
    }
}

/// Mounts a token endpoint on `server` that returns `id_token`.
pub async fn mount_token_endpoint(server: &MockServer, id_token: &str) {
    mount_token_endpoint_with_lifetime(server, id_token, 3600).await;
}

/// Mounts a token endpoint on `server` that returns `id_token` with the
/// given `expires_in`.
pub async fn mount_token_endpoint_with_lifetime(
    server: &MockServer,
    id_token: &str,
    expires_in: u64,
) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-token",
            "id_token": id_token,
            "expires_in": expires_in,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

/// Mounts the provider key set on `server`.
pub async fn mount_jwks(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .mount(server)
        .await;
}

/// Collects a response body as a string.
pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8")
}
