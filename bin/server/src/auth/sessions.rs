//! Login state tokens and session records in the key-value store.
//!
//! Keys are namespaced: `state-{token}` for anti-forgery tokens issued at
//! login, `session-{ulid}` for session records.

use gatehouse_core::{Result, SessionId};
use gatehouse_kv::KvStore;
use gatehouse_platform_access::{SessionGrant, SessionRecord, StateToken, TokenSet, UserIdentity};
use oauth2::CsrfToken;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::cookies::{CookieMap, SESSION_COOKIE};
use crate::config::SessionConfig;

/// Value stored under a state key; only the key's presence matters.
const STATE_MARKER: &str = "true";

/// Longest lifetime a session is stored for, whatever the provider reports.
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Errors from session and state token operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The key-value store failed.
    Store {
        operation: &'static str,
        reason: String,
    },
    /// A session record could not be encoded.
    Serialization { reason: String },
    /// The session expiry cannot be represented.
    Lifetime { seconds: u64 },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store { operation, reason } => {
                write!(f, "session store {operation} failed: {reason}")
            }
            Self::Serialization { reason } => {
                write!(f, "failed to encode session record: {reason}")
            }
            Self::Lifetime { seconds } => {
                write!(f, "session lifetime of {seconds}s is out of range")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Issues state tokens and creates, resolves and destroys sessions.
pub struct SessionManager {
    store: Arc<dyn KvStore>,
    default_ttl: Duration,
    state_ttl: Duration,
}

impl SessionManager {
    /// Creates a manager over `store`.
    pub fn new(store: Arc<dyn KvStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            default_ttl: config.default_ttl(),
            state_ttl: config.state_ttl(),
        }
    }

    /// Generates a fresh state token and records it in the store.
    pub async fn issue_state_token(&self) -> Result<StateToken, SessionError> {
        let token = StateToken::new(CsrfToken::new_random().secret().clone());
        self.store
            .put(&state_key(&token), STATE_MARKER.to_string(), self.state_ttl)
            .await
            .map_err(|e| SessionError::Store {
                operation: "put state",
                reason: e.current_context().to_string(),
            })?;
        debug!("issued login state token");
        Ok(token)
    }

    /// Checks that `token` was issued and not yet used, and consumes it.
    ///
    /// Returns `false` for unknown, expired or already consumed tokens.
    pub async fn consume_state_token(&self, token: &StateToken) -> Result<bool, SessionError> {
        let key = state_key(token);
        let found = self
            .store
            .get(&key)
            .await
            .map_err(|e| SessionError::Store {
                operation: "get state",
                reason: e.current_context().to_string(),
            })?
            .is_some();

        if found {
            self.store.delete(&key).await.map_err(|e| SessionError::Store {
                operation: "delete state",
                reason: e.current_context().to_string(),
            })?;
        }
        Ok(found)
    }

    /// Stores a session for `user` and returns its ID and expiry.
    ///
    /// `ttl_seconds` is the provider-reported token lifetime; when it is
    /// absent or zero the configured default applies. Lifetimes are capped at
    /// [`MAX_SESSION_TTL`].
    pub async fn create_session(
        &self,
        tokens: &TokenSet,
        user: UserIdentity,
        ttl_seconds: Option<u64>,
    ) -> Result<SessionGrant, SessionError> {
        let ttl = ttl_seconds
            .filter(|secs| *secs > 0)
            .map_or(self.default_ttl, Duration::from_secs)
            .min(MAX_SESSION_TTL);
        let id = SessionId::new();
        let record = SessionRecord::new(tokens, user);
        let expires_at = chrono::TimeDelta::from_std(ttl)
            .ok()
            .and_then(|lifetime| record.created_at.checked_add_signed(lifetime))
            .ok_or_else(|| SessionError::Lifetime {
                seconds: ttl.as_secs(),
            })?;

        let value = serde_json::to_string(&record).map_err(|e| SessionError::Serialization {
            reason: e.to_string(),
        })?;
        self.store
            .put(&session_key(&id), value, ttl)
            .await
            .map_err(|e| SessionError::Store {
                operation: "put session",
                reason: e.current_context().to_string(),
            })?;

        debug!(session_id = %id, sub = %record.user.sub, "created session");
        Ok(SessionGrant { id, expires_at })
    }

    /// Returns the user behind the session cookie in `cookie_header`.
    ///
    /// Any failure (no cookie, malformed ID, missing or unreadable record,
    /// store error) resolves to `None`.
    pub async fn resolve_session(&self, cookie_header: &str) -> Option<UserIdentity> {
        let id = session_id_from(cookie_header)?;
        let value = match self.store.get(&session_key(&id)).await {
            Ok(value) => value?,
            Err(e) => {
                warn!(session_id = %id, error = %e.current_context(), "session lookup failed");
                return None;
            }
        };

        match serde_json::from_str::<SessionRecord>(&value) {
            Ok(record) => Some(record.user),
            Err(e) => {
                warn!(session_id = %id, error = %e, "stored session record is unreadable");
                None
            }
        }
    }

    /// Deletes the session behind the cookie in `cookie_header`, if any.
    ///
    /// Best effort: store errors are logged and swallowed, and destroying an
    /// already destroyed session does nothing.
    pub async fn destroy_session(&self, cookie_header: &str) {
        let Some(id) = session_id_from(cookie_header) else {
            return;
        };
        match self.store.delete(&session_key(&id)).await {
            Ok(()) => debug!(session_id = %id, "destroyed session"),
            Err(e) => {
                warn!(session_id = %id, error = %e.current_context(), "failed to delete session");
            }
        }
    }
}

fn session_id_from(cookie_header: &str) -> Option<SessionId> {
    CookieMap::parse(cookie_header)
        .get(SESSION_COOKIE)
        .and_then(|value| value.parse().ok())
}

fn state_key(token: &StateToken) -> String {
    format!("state-{token}")
}

fn session_key(id: &SessionId) -> String {
    format!("session-{}", id.as_ulid())
}
