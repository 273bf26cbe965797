//! The authenticated user view.

use serde::{Deserialize, Serialize};

use crate::token::IdentityClaims;

/// The identity of the user behind a session.
///
/// This is what is stored in the session record and what handlers see after
/// a successful session lookup. It is also the object injected into rendered
/// pages, so absent fields are omitted rather than serialized as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Provider subject identifier.
    pub sub: String,
    /// Email address, if the provider shared it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name, if the provider shared it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Profile picture URL, if the provider shared it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl UserIdentity {
    /// Creates an identity with only the subject set.
    #[must_use]
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            email: None,
            name: None,
            picture: None,
        }
    }

    /// Sets the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the picture URL.
    #[must_use]
    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    /// Returns the best human-readable label: email, then name, then a
    /// generic fallback.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.email
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("authenticated user")
    }
}

impl From<&IdentityClaims> for UserIdentity {
    fn from(claims: &IdentityClaims) -> Self {
        Self {
            sub: claims.sub.clone(),
            email: claims.email.clone(),
            name: claims.name.clone(),
            picture: claims.picture.clone(),
        }
    }
}
