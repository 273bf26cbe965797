//! Session records for authenticated users.
//!
//! A session record is created after a successful callback and stored in
//! the key-value store under the session ID. It is never modified after
//! creation: logout deletes it, and the store's TTL expires it.

use chrono::{DateTime, Utc};
use gatehouse_core::SessionId;
use serde::{Deserialize, Serialize};

use crate::token::TokenSet;
use crate::user::UserIdentity;

/// The stored value of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Provider access token.
    pub access_token: String,
    /// Provider identity token the user was derived from.
    pub id_token: String,
    /// The authenticated user.
    pub user: UserIdentity,
    /// When the session was created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Creates a record from the provider's tokens and the derived user.
    #[must_use]
    pub fn new(tokens: &TokenSet, user: UserIdentity) -> Self {
        Self {
            access_token: tokens.access_token.clone(),
            id_token: tokens.id_token.clone(),
            user,
            created_at: Utc::now(),
        }
    }
}

/// A freshly created session, as handed back to the callback handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    /// The session ID to place in the cookie.
    pub id: SessionId,
    /// When the session (and its cookie) expire.
    pub expires_at: DateTime<Utc>,
}
