//! Identity provider configuration.
//!
//! This module provides configuration types for connecting to an external
//! Auth0-style identity provider: the tenant domain, client credentials, the
//! fixed callback URL, and how identity tokens are validated.

use serde::{Deserialize, Serialize};
use url::Url;

/// How identity tokens returned by the provider are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenValidation {
    /// Verify signature, expiry, issuer and audience against the provider's
    /// published key set.
    #[default]
    Verify,
    /// Decode the payload without any verification.
    ///
    /// Development and test mode only: anyone able to reach the callback
    /// with a forged token is trusted.
    DecodeOnly,
}

impl TokenValidation {
    /// Returns true if tokens are checked against the provider's keys.
    #[must_use]
    pub fn verifies(&self) -> bool {
        matches!(self, Self::Verify)
    }
}

/// Configuration for the identity provider.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The provider tenant domain (e.g., "example.us.auth0.com").
    ///
    /// A value that already carries a scheme ("http://127.0.0.1:9000") is
    /// used verbatim as the base URL.
    domain: String,
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// The fixed redirect URL for the authorization callback
    /// (e.g., "https://app.example.com/auth").
    callback_url: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,profile,email"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// How identity tokens are validated. Default: verify.
    #[serde(default)]
    token_validation: TokenValidation,
    /// Salt value carried for deployments that set it. Not consumed by any
    /// login or session operation.
    #[serde(default)]
    salt: Option<String>,
    /// Timeout for each request to the provider, in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    request_timeout_seconds: u64,
}

fn default_scopes() -> String {
    "openid,profile,email".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    10
}

impl ProviderConfig {
    /// Creates a new provider configuration with defaults for optional fields.
    #[must_use]
    pub fn new(
        domain: String,
        client_id: String,
        client_secret: String,
        callback_url: String,
    ) -> Self {
        Self {
            domain,
            client_id,
            client_secret,
            callback_url,
            scopes: default_scopes(),
            token_validation: TokenValidation::default(),
            salt: None,
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder(
        domain: String,
        client_id: String,
        client_secret: String,
        callback_url: String,
    ) -> ProviderConfigBuilder {
        ProviderConfigBuilder::new(domain, client_id, client_secret, callback_url)
    }

    /// Returns the configured provider domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the provider base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        }
    }

    /// Returns the issuer the provider puts in identity tokens.
    #[must_use]
    pub fn issuer(&self) -> String {
        format!("{}/", self.base_url())
    }

    /// Returns the authorization endpoint.
    #[must_use]
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/authorize", self.base_url())
    }

    /// Returns the token endpoint.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth/token", self.base_url())
    }

    /// Returns the published key set endpoint.
    #[must_use]
    pub fn jwks_endpoint(&self) -> String {
        format!("{}/.well-known/jwks.json", self.base_url())
    }

    /// Returns the provider logout endpoint.
    #[must_use]
    pub fn logout_endpoint(&self) -> String {
        format!("{}/v2/logout", self.base_url())
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the fixed callback URL.
    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Returns the origin of the callback URL, which is the application's
    /// public origin (e.g., "https://app.example.com").
    ///
    /// Returns `None` if the callback URL does not parse.
    #[must_use]
    pub fn app_origin(&self) -> Option<String> {
        let url = Url::parse(&self.callback_url).ok()?;
        let origin = url.origin();
        origin.is_tuple().then(|| origin.ascii_serialization())
    }

    /// Returns the OAuth2 scopes to request, parsed from comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns the scopes joined for the `scope` query parameter.
    #[must_use]
    pub fn scope_param(&self) -> String {
        self.scopes().join(" ")
    }

    /// Returns the identity token validation mode.
    #[must_use]
    pub fn token_validation(&self) -> TokenValidation {
        self.token_validation
    }

    /// Returns the configured salt, if any.
    #[must_use]
    pub fn salt(&self) -> Option<&str> {
        self.salt.as_deref()
    }

    /// Returns the per-request timeout for provider calls.
    #[must_use]
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Builder for `ProviderConfig`.
#[derive(Debug)]
pub struct ProviderConfigBuilder {
    config: ProviderConfig,
}

impl ProviderConfigBuilder {
    /// Creates a new builder with required fields.
    #[must_use]
    pub fn new(
        domain: String,
        client_id: String,
        client_secret: String,
        callback_url: String,
    ) -> Self {
        Self {
            config: ProviderConfig::new(domain, client_id, client_secret, callback_url),
        }
    }

    /// Sets the identity token validation mode.
    #[must_use]
    pub fn token_validation(mut self, mode: TokenValidation) -> Self {
        self.config.token_validation = mode;
        self
    }

    /// Sets the per-request timeout, in seconds.
    #[must_use]
    pub fn request_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.request_timeout_seconds = seconds;
        self
    }

    /// Builds the `ProviderConfig`.
    #[must_use]
    pub fn build(self) -> ProviderConfig {
        self.config
    }
}
