//! Session cookie parsing and construction.

use axum::http::{HeaderMap, header::COOKIE};
use axum_extra::extract::cookie::{Cookie, SameSite};
use gatehouse_platform_access::SessionGrant;
use std::collections::HashMap;
use time::OffsetDateTime;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "AUTH0_SESSION";

/// Cookies sent with a request, keyed by name.
///
/// A name that appears more than once is ambiguous and resolves to nothing,
/// as does an empty value. Segments that do not parse as `name=value` are
/// skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieMap {
    // None marks a duplicated name
    values: HashMap<String, Option<String>>,
}

impl CookieMap {
    /// Parses a `Cookie` header value.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let mut values: HashMap<String, Option<String>> = HashMap::new();
        for cookie in Cookie::split_parse(header).filter_map(Result::ok) {
            let (name, value) = (cookie.name(), cookie.value());
            if name.is_empty() {
                continue;
            }
            values
                .entry(name.to_string())
                .and_modify(|existing| *existing = None)
                .or_insert_with(|| Some(value.to_string()));
        }
        Self { values }
    }

    /// Parses every `Cookie` header on a request.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::parse(&cookie_header(headers))
    }

    /// Returns the value of the named cookie, if it is present exactly once
    /// and non-empty.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(Option::as_deref)
            .filter(|value| !value.is_empty())
    }
}

/// Joins every `Cookie` header on a request into one header value.
///
/// HTTP/2 clients may split cookies across several header fields.
#[must_use]
pub fn cookie_header(headers: &HeaderMap) -> String {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Builds the cookie carrying a new session's ID.
#[must_use]
pub fn session_cookie(grant: &SessionGrant, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, grant.id.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build();
    if let Ok(expires) = OffsetDateTime::from_unix_timestamp(grant.expires_at.timestamp()) {
        cookie.set_expires(expires);
    }
    cookie
}

/// Builds a cookie that clears the session cookie in the browser.
#[must_use]
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}
