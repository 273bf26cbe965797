//! Error types for the platform-access crate.
//!
//! Errors are designed for layered context using rootcause: the server wraps
//! these in its own contexts as they propagate to the HTTP boundary.

use std::fmt;

/// Errors from authentication operations.
///
/// These errors represent failures in establishing a user's identity from
/// what the identity provider returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The identity token could not be decoded at all.
    MalformedToken { reason: String },
    /// The identity token decoded but failed verification.
    InvalidToken { reason: String },
    /// A claim the session needs is missing from the token.
    MissingClaim { claim: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedToken { reason } => {
                write!(f, "malformed identity token: {reason}")
            }
            Self::InvalidToken { reason } => {
                write!(f, "invalid identity token: {reason}")
            }
            Self::MissingClaim { claim } => {
                write!(f, "missing required claim: {claim}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}
