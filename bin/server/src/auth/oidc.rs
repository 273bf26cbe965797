//! Identity provider client.
//!
//! Talks to an Auth0-style tenant over plain HTTPS: the authorize redirect,
//! the JSON token endpoint, the published key set and the logout endpoint.

use gatehouse_core::Result;
use gatehouse_platform_access::{
    AuthenticationError, IdentityClaims, LoginState, ProviderConfig, TokenSet, TokenValidation,
    decode_unverified,
};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};
use url::Url;

/// OIDC-related errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OidcError {
    /// Configuration error (invalid URLs, etc.)
    Configuration { reason: String },
    /// The provider could not be reached.
    Transport { endpoint: String, reason: String },
    /// The token endpoint answered with a non-success status.
    UpstreamExchangeFailed { status: u16, body: String },
    /// The token endpoint answered success with a body that is not a token set.
    InvalidTokenResponse { reason: String },
    /// The provider's key set could not be fetched or parsed.
    JwksUnavailable { reason: String },
    /// The identity token is malformed or failed verification.
    Identity(AuthenticationError),
}

impl fmt::Display for OidcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { reason } => write!(f, "OIDC configuration error: {reason}"),
            Self::Transport { endpoint, reason } => {
                write!(f, "request to '{endpoint}' failed: {reason}")
            }
            Self::UpstreamExchangeFailed { status, body } => {
                write!(f, "token exchange failed with status {status}: {body}")
            }
            Self::InvalidTokenResponse { reason } => {
                write!(f, "token endpoint returned an invalid response: {reason}")
            }
            Self::JwksUnavailable { reason } => write!(f, "key set unavailable: {reason}"),
            Self::Identity(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for OidcError {}

/// JSON body posted to the token endpoint.
#[derive(Debug, Serialize)]
struct CodeExchangeRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// OIDC client for authenticating users.
pub struct OidcClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl OidcClient {
    /// Creates a client for the configured provider.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::Configuration`] if the callback URL or provider
    /// endpoints do not parse, or the HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self, OidcError> {
        Url::parse(config.callback_url()).map_err(|e| OidcError::Configuration {
            reason: format!("invalid callback URL: {e}"),
        })?;
        Url::parse(&config.authorize_endpoint()).map_err(|e| OidcError::Configuration {
            reason: format!("invalid provider domain: {e}"),
        })?;

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| OidcError::Configuration {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        if !config.token_validation().verifies() {
            warn!("identity tokens will NOT be verified; decode_only is for development only");
        }

        Ok(Self { config, http })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Builds the provider authorize URL carrying `state`.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::Configuration`] if the authorize endpoint does not
    /// parse.
    pub fn authorization_url(&self, state: &LoginState) -> Result<String, OidcError> {
        let scope = self.config.scope_param();
        let state = state.to_param();
        let url = Url::parse_with_params(
            &self.config.authorize_endpoint(),
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id()),
                ("redirect_uri", self.config.callback_url()),
                ("scope", scope.as_str()),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| OidcError::Configuration {
            reason: format!("invalid authorize endpoint: {e}"),
        })?;
        Ok(url.into())
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::Transport`] if the provider cannot be reached,
    /// [`OidcError::UpstreamExchangeFailed`] on a non-success status and
    /// [`OidcError::InvalidTokenResponse`] if the body is not a token set.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, OidcError> {
        let endpoint = self.config.token_endpoint();
        let request = CodeExchangeRequest {
            grant_type: "authorization_code",
            client_id: self.config.client_id(),
            client_secret: self.config.client_secret(),
            code,
            redirect_uri: self.config.callback_url(),
        };

        let response = self
            .http
            .post(&endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| OidcError::Transport {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OidcError::UpstreamExchangeFailed {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let tokens: TokenSet = response
            .json()
            .await
            .map_err(|e| OidcError::InvalidTokenResponse {
                reason: e.to_string(),
            })?;
        debug!(expires_in = ?tokens.expires_in, "exchanged authorization code");
        Ok(tokens)
    }

    /// Decodes the identity token payload without verifying it.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::Identity`] if the token does not decode.
    pub fn decode_identity(&self, id_token: &str) -> Result<IdentityClaims, OidcError> {
        decode_unverified(id_token)
            .map_err(|e| OidcError::Identity(e.current_context().clone()).into())
    }

    /// Verifies the identity token against the provider's published keys and
    /// returns its claims.
    ///
    /// Checks the signature, expiry, issuer (`{base}/`) and audience (the
    /// client ID).
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::JwksUnavailable`] if the key set cannot be
    /// fetched, and [`OidcError::Identity`] if the token fails any check.
    pub async fn verify_identity(&self, id_token: &str) -> Result<IdentityClaims, OidcError> {
        let header = jsonwebtoken::decode_header(id_token).map_err(|e| {
            OidcError::Identity(AuthenticationError::MalformedToken {
                reason: e.to_string(),
            })
        })?;

        if matches!(
            header.alg,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(invalid_token(format!(
                "symmetric algorithm {:?} is not accepted",
                header.alg
            ))
            .into());
        }

        let kid = header
            .kid
            .ok_or_else(|| invalid_token("token header has no key id".to_string()))?;

        let jwks = self.fetch_jwks().await?;
        let jwk = jwks
            .find(&kid)
            .ok_or_else(|| invalid_token(format!("no published key matches kid '{kid}'")))?;
        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| invalid_token(format!("unusable published key: {e}")))?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[self.config.issuer()]);
        validation.set_audience(&[self.config.client_id()]);

        let data = jsonwebtoken::decode::<IdentityClaims>(id_token, &key, &validation)
            .map_err(|e| invalid_token(e.to_string()))?;
        debug!(sub = %data.claims.sub, "verified identity token");
        Ok(data.claims)
    }

    /// Establishes the identity in `id_token` according to the configured
    /// validation mode.
    ///
    /// # Errors
    ///
    /// See [`verify_identity`](Self::verify_identity) and
    /// [`decode_identity`](Self::decode_identity).
    pub async fn identity(&self, id_token: &str) -> Result<IdentityClaims, OidcError> {
        match self.config.token_validation() {
            TokenValidation::Verify => self.verify_identity(id_token).await,
            TokenValidation::DecodeOnly => {
                warn!("accepting identity token without verification");
                self.decode_identity(id_token)
            }
        }
    }

    /// Builds the provider logout URL.
    ///
    /// `return_to` is where the provider sends the browser afterwards; it is
    /// omitted when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::Configuration`] if the logout endpoint does not
    /// parse.
    pub fn logout_url(&self, return_to: Option<&str>) -> Result<String, OidcError> {
        let mut url =
            Url::parse(&self.config.logout_endpoint()).map_err(|e| OidcError::Configuration {
                reason: format!("invalid logout endpoint: {e}"),
            })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", self.config.client_id());
            if let Some(return_to) = return_to {
                query.append_pair("returnTo", return_to);
            }
        }
        Ok(url.into())
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, OidcError> {
        let endpoint = self.config.jwks_endpoint();
        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| OidcError::JwksUnavailable {
                reason: format!("{endpoint}: {e}"),
            })?;

        let jwks = response
            .json::<JwkSet>()
            .await
            .map_err(|e| OidcError::JwksUnavailable {
                reason: format!("{endpoint}: {e}"),
            })?;
        debug!(keys = jwks.keys.len(), "fetched provider key set");
        Ok(jwks)
    }
}

fn invalid_token(reason: String) -> OidcError {
    OidcError::Identity(AuthenticationError::InvalidToken { reason })
}
