//! Authentication module for the gatehouse server.
//!
//! This module provides:
//! - The identity provider client (authorize URL, code exchange, token
//!   verification, logout URL)
//! - Key-value backed login state tokens and sessions
//! - Session cookie parsing and construction
//! - Authentication extractors for Axum routes
//! - The login, callback and logout handlers
//!
//! A session is created only after the callback has consumed a state token
//! issued by `/login` and the provider's identity token has been accepted.
//! The browser holds nothing but the session ID; the identity and provider
//! tokens stay in the store until logout or expiry.

pub mod cookies;
pub mod middleware;
pub mod oidc;
pub mod routes;
pub mod sessions;

use crate::config::SessionConfig;
use gatehouse_kv::KvStore;
use std::sync::Arc;

pub use cookies::{CookieMap, SESSION_COOKIE};
pub use middleware::{AuthRejection, OptionalAuth, RequireAuth};
pub use oidc::{OidcClient, OidcError};
pub use routes::{callback, login, logout};
pub use sessions::{SessionError, SessionManager};

/// Shared application state.
pub struct AppState {
    /// Identity provider client.
    pub oidc_client: OidcClient,
    /// State token and session operations over the key-value store.
    pub sessions: SessionManager,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        oidc_client: OidcClient,
        store: Arc<dyn KvStore>,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            oidc_client,
            sessions: SessionManager::new(store, &session_config),
            session_config,
        }
    }
}
