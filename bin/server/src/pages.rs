//! The HTML shell and identity injection.
//!
//! The shell carries an empty JSON placeholder,
//! `<script id="edge_state" type="application/json">{}</script>`. On HTML
//! responses to a signed-in browser its content is replaced with the user's
//! identity so client script can read it without another round trip.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{
        StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use gatehouse_platform_access::UserIdentity;
use regex::{Captures, Regex};
use std::sync::{Arc, LazyLock};
use tracing::{error, warn};

use crate::auth::{AppState, cookies::cookie_header};
use crate::error::PageError;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Upper bound on a page body buffered for injection.
const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

static EDGE_STATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(<script id="edge_state" type="application/json">)[\s\S]*?(</script>)"#)
        .expect("edge_state pattern is valid")
});

/// Serves the HTML shell.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Answers every unmatched path.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Replaces the placeholder content in `html` with `user` as JSON.
///
/// `</` in the JSON is written as `<\/` so a value cannot close the script
/// element. Pages without the placeholder are returned unchanged.
///
/// # Errors
///
/// Returns an error if `user` cannot be serialized.
pub fn inject_user_data(html: &str, user: &UserIdentity) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(user)?.replace("</", "<\\/");
    Ok(EDGE_STATE
        .replace(html, |caps: &Captures<'_>| {
            format!("{}{}{}", &caps[1], json, &caps[2])
        })
        .into_owned())
}

/// Middleware that injects the signed-in user into HTML responses.
///
/// Non-HTML responses and requests without a resolvable session pass
/// through untouched.
pub async fn inject_identity(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let cookies = cookie_header(request.headers());
    let response = next.run(request).await;

    if cookies.is_empty() || !is_html(&response) {
        return response;
    }
    let Some(user) = state.sessions.resolve_session(&cookies).await else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_PAGE_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "failed to buffer page for identity injection");
            return PageError::internal("Failed to render page").into_response();
        }
    };
    let Ok(html) = std::str::from_utf8(&bytes) else {
        warn!("HTML response is not UTF-8; skipping identity injection");
        return Response::from_parts(parts, Body::from(bytes));
    };

    match inject_user_data(html, &user) {
        Ok(rendered) => {
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(rendered))
        }
        Err(e) => {
            error!(error = %e, "failed to serialize identity for injection");
            Response::from_parts(parts, Body::from(bytes))
        }
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/html"))
}
