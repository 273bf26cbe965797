//! The login `state` parameter.
//!
//! The `state` sent to the provider binds the authorize request to its
//! callback and carries where to send the user afterwards:
//! `{token}|{urlencoded return path}`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the state token and the encoded return path.
const SEPARATOR: char = '|';

/// Where users land when no usable return path was carried.
pub const DEFAULT_RETURN_PATH: &str = "/";

/// Anti-forgery token issued at login and checked on callback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateToken(String);

impl StateToken {
    /// Wraps an already generated token value.
    #[must_use]
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The decoded `state` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginState {
    token: StateToken,
    return_path: String,
}

impl LoginState {
    /// Creates a login state. Non-local return paths are replaced with `/`.
    #[must_use]
    pub fn new(token: StateToken, return_path: &str) -> Self {
        Self {
            token,
            return_path: local_path_or_default(return_path),
        }
    }

    /// Parses a `state` value received on callback.
    ///
    /// Splits on the first `|`. A missing, empty, undecodable or non-local
    /// return path yields `/`.
    #[must_use]
    pub fn parse(param: &str) -> Self {
        let (token, encoded) = match param.split_once(SEPARATOR) {
            Some((token, encoded)) => (token, Some(encoded)),
            None => (param, None),
        };

        let return_path = encoded
            .filter(|e| !e.is_empty())
            .and_then(|e| urlencoding::decode(e).ok())
            .map(|p| local_path_or_default(&p))
            .unwrap_or_else(|| DEFAULT_RETURN_PATH.to_string());

        Self {
            token: StateToken::new(token.to_string()),
            return_path,
        }
    }

    /// Encodes the `state` value to send to the provider.
    #[must_use]
    pub fn to_param(&self) -> String {
        format!(
            "{}{SEPARATOR}{}",
            self.token,
            urlencoding::encode(&self.return_path)
        )
    }

    /// Returns the anti-forgery token.
    #[must_use]
    pub fn token(&self) -> &StateToken {
        &self.token
    }

    /// Returns the path to redirect to after login.
    #[must_use]
    pub fn return_path(&self) -> &str {
        &self.return_path
    }
}

/// Only same-origin absolute paths are followed after login; anything else
/// (absolute URLs, protocol-relative `//host`, backslash tricks) goes to `/`.
fn local_path_or_default(path: &str) -> String {
    let is_local = path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && !path.chars().any(char::is_control);
    if is_local {
        path.to_string()
    } else {
        DEFAULT_RETURN_PATH.to_string()
    }
}
