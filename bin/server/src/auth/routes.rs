//! Authentication routes for login, callback, and logout.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use gatehouse_platform_access::{LoginState, UserIdentity, state::DEFAULT_RETURN_PATH};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{
    AppState,
    cookies::{CookieMap, SESSION_COOKIE, cookie_header, removal_cookie, session_cookie},
    oidc::OidcError,
};
use crate::error::PageError;

/// Query parameters for the login redirect.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "returnUrl")]
    return_url: Option<String>,
}

/// Query parameters for the OIDC callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

/// Responds with a 302 Found redirect.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Issues a state token and builds the provider authorize URL that returns
/// the user to `return_path`.
///
/// # Errors
///
/// Returns a 500 page if the state token cannot be stored or the URL cannot
/// be built.
pub async fn build_authorization_url(
    state: &AppState,
    return_path: &str,
) -> Result<String, PageError> {
    let token = state.sessions.issue_state_token().await.map_err(|e| {
        error!(error = %e.current_context(), "failed to issue state token");
        PageError::internal("Failed to initiate login")
    })?;

    let login_state = LoginState::new(token, return_path);
    state
        .oidc_client
        .authorization_url(&login_state)
        .map_err(|e| {
            error!(error = %e.current_context(), "failed to build authorization URL");
            PageError::internal("Failed to initiate login")
        })
}

/// Initiates the OIDC login flow by redirecting to the identity provider.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, PageError> {
    let return_path = query.return_url.as_deref().unwrap_or(DEFAULT_RETURN_PATH);
    let auth_url = build_authorization_url(&state, return_path).await?;
    Ok(found(&auth_url))
}

/// Handles the OIDC callback after the user authenticates with the identity provider.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, PageError> {
    let (Some(code), Some(state_param)) = (
        query.code.filter(|c| !c.is_empty()),
        query.state.filter(|s| !s.is_empty()),
    ) else {
        return Err(PageError::bad_request("Missing code or state"));
    };

    let login_state = LoginState::parse(&state_param);

    let valid = state
        .sessions
        .consume_state_token(login_state.token())
        .await
        .map_err(|e| {
            error!(error = %e.current_context(), "failed to check state token");
            PageError::internal("Error verifying state")
        })?;
    if !valid {
        warn!("callback with unknown or reused state token");
        return Err(PageError::forbidden("Invalid state parameter"));
    }

    let tokens = state.oidc_client.exchange_code(&code).await.map_err(|e| {
        error!(error = %e.current_context(), "authorization code exchange failed");
        PageError::internal("Authentication failed")
    })?;

    let claims = state
        .oidc_client
        .identity(&tokens.id_token)
        .await
        .map_err(|e| match e.current_context() {
            OidcError::Identity(reason) => {
                warn!(error = %reason, "rejected identity token");
                PageError::unauthorized("Invalid token")
            }
            other => {
                error!(error = %other, "could not validate identity token");
                PageError::internal("Authentication failed")
            }
        })?;

    let user = UserIdentity::from(&claims);
    let grant = state
        .sessions
        .create_session(&tokens, user, tokens.expires_in)
        .await
        .map_err(|e| {
            error!(error = %e.current_context(), "failed to store session");
            PageError::internal("Error storing session")
        })?;

    info!(session_id = %grant.id, sub = %claims.sub, "user logged in");

    let jar = CookieJar::new().add(session_cookie(
        &grant,
        state.session_config.secure_cookies,
    ));
    Ok((jar, found(login_state.return_path())))
}

/// Logs out the user by deleting their session.
///
/// With a session cookie the browser is sent through the provider's logout
/// endpoint; without one it simply goes home.
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let header = cookie_header(&headers);
    if CookieMap::parse(&header).get(SESSION_COOKIE).is_none() {
        return found(DEFAULT_RETURN_PATH);
    }

    state.sessions.destroy_session(&header).await;

    let return_to = state.oidc_client.config().app_origin();
    let location = state
        .oidc_client
        .logout_url(return_to.as_deref())
        .unwrap_or_else(|e| {
            error!(error = %e.current_context(), "failed to build provider logout URL");
            DEFAULT_RETURN_PATH.to_string()
        });

    let jar = CookieJar::new().add(removal_cookie(state.session_config.secure_cookies));
    (jar, found(&location)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::router;
    use crate::testing::{
        FailingStore, ReadOnlyStore, SIGNING_KEY_ID, body_string, fresh_claims, id_token,
        mount_jwks, mount_token_endpoint, mount_token_endpoint_with_lifetime, sign_token,
        state_with_store, test_state, verifying_state,
    };
    use axum::body::Body;
    use axum::http::{Request, header::SET_COOKIE};
    use gatehouse_kv::{KvStore, MemoryStore};
    use gatehouse_platform_access::StateToken;
    use std::collections::HashMap;
    use std::time::Duration;
    use tower::ServiceExt;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn get(app: axum::Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header("cookie", cookie);
        }
        app.oneshot(request.body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    fn location(response: &Response) -> String {
        response.headers()[LOCATION]
            .to_str()
            .expect("location")
            .to_string()
    }

    fn set_cookie(response: &Response) -> String {
        response.headers()[SET_COOKIE]
            .to_str()
            .expect("set-cookie")
            .to_string()
    }

    fn query_map(url: &str) -> HashMap<String, String> {
        Url::parse(url)
            .expect("url")
            .query_pairs()
            .into_owned()
            .collect()
    }

    /// Session cookie pair (`name=value`) from a Set-Cookie header.
    fn cookie_pair(set_cookie: &str) -> String {
        set_cookie
            .split(';')
            .next()
            .expect("pair")
            .trim()
            .to_string()
    }

    async fn issue_state(store: &MemoryStore, token: &str) {
        store
            .put(&format!("state-{token}"), "true".to_string(), Duration::from_secs(60))
            .await
            .expect("put");
    }

    #[tokio::test]
    async fn login_redirects_to_provider_with_return_path() {
        let (state, _store) = test_state("https://tenant.example.com");
        let response = get(router(state), "/login?returnUrl=%2Fdashboard", None).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        let url = location(&response);
        assert!(url.starts_with("https://tenant.example.com/authorize?"));

        let params = query_map(&url);
        let (token, encoded) = params["state"].split_once('|').expect("separator");
        assert!(!token.is_empty());
        assert_eq!(encoded, "%2Fdashboard");
        assert_eq!(LoginState::parse(&params["state"]).return_path(), "/dashboard");
    }

    #[tokio::test]
    async fn login_defaults_return_path_to_root() {
        let (state, _store) = test_state("https://tenant.example.com");
        let response = get(router(state), "/login", None).await;

        let params = query_map(&location(&response));
        assert_eq!(LoginState::parse(&params["state"]).return_path(), "/");
    }

    #[tokio::test]
    async fn login_stores_the_issued_state_token() {
        let (state, store) = test_state("https://tenant.example.com");
        let response = get(router(state.clone()), "/login", None).await;

        let params = query_map(&location(&response));
        let parsed = LoginState::parse(&params["state"]);
        assert_eq!(
            store
                .get(&format!("state-{}", parsed.token()))
                .await
                .expect("get")
                .as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn callback_requires_code_and_state() {
        let (state, _store) = test_state("https://tenant.example.com");
        for uri in ["/auth", "/auth?code=abc", "/auth?state=xyz", "/auth?code=&state=xyz"] {
            let response = get(router(state.clone()), uri, None).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert!(body_string(response).await.contains("Missing code or state"));
        }
    }

    #[tokio::test]
    async fn callback_rejects_unissued_state() {
        let (state, _store) = test_state("https://tenant.example.com");
        let response = get(router(state), "/auth?code=abc&state=forged%7C%252F", None).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(body_string(response).await.contains("Invalid state parameter"));
    }

    #[tokio::test]
    async fn callback_creates_session_and_redirects() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, &id_token("auth0|alice", Some("alice@example.com"))).await;
        let (state, store) = test_state(&server.uri());
        issue_state(&store, "tok").await;

        let response = get(
            router(state.clone()),
            "/auth?code=the-code&state=tok%7C%252Fdashboard",
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/dashboard");

        let cookie = set_cookie(&response);
        assert!(cookie.starts_with("AUTH0_SESSION="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Expires="));

        let user = state
            .sessions
            .resolve_session(&cookie_pair(&cookie))
            .await
            .expect("session");
        assert_eq!(user.sub, "auth0|alice");
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn callback_state_cannot_be_replayed() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, &id_token("auth0|alice", None)).await;
        let (state, store) = test_state(&server.uri());
        issue_state(&store, "tok").await;

        let uri = "/auth?code=the-code&state=tok%7C%252F";
        let first = get(router(state.clone()), uri, None).await;
        assert_eq!(first.status(), StatusCode::FOUND);

        let replay = get(router(state), uri, None).await;
        assert_eq!(replay.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn callback_ignores_external_return_path() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, &id_token("auth0|alice", None)).await;
        let (state, store) = test_state(&server.uri());
        issue_state(&store, "tok").await;

        let response = get(
            router(state),
            "/auth?code=c&state=tok%7Chttps%253A%252F%252Fevil.example.com",
            None,
        )
        .await;

        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn callback_maps_exchange_failure_to_500() {
        let server = MockServer::start().await;
        Mock::given(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("secret upstream detail"))
            .mount(&server)
            .await;
        let (state, store) = test_state(&server.uri());
        issue_state(&store, "tok").await;

        let response = get(router(state), "/auth?code=c&state=tok", None).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(body.contains("Authentication failed"));
        assert!(!body.contains("secret upstream detail"));
    }

    #[tokio::test]
    async fn callback_rejects_malformed_identity_token() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, "not-a-jwt").await;
        let (state, store) = test_state(&server.uri());
        issue_state(&store, "tok").await;

        let response = get(router(state), "/auth?code=c&state=tok", None).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("Invalid token"));
    }

    #[tokio::test]
    async fn login_fails_when_state_cannot_be_stored() {
        let (state, _store) = state_with_store("https://tenant.example.com", Arc::new(FailingStore));

        let response = get(router(state), "/login?returnUrl=%2Fdashboard", None).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(body.contains("Failed to initiate login"));
        assert!(!body.contains("binding not initialized"));
    }

    #[tokio::test]
    async fn callback_reports_state_lookup_failure() {
        let (state, _store) = state_with_store("https://tenant.example.com", Arc::new(FailingStore));

        let response = get(router(state), "/auth?code=c&state=tok%7C%252F", None).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.contains("Error verifying state"));
    }

    #[tokio::test]
    async fn callback_reports_session_write_failure() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, &id_token("auth0|alice", None)).await;
        let (state, store) = state_with_store(&server.uri(), Arc::new(ReadOnlyStore::default()));
        issue_state(&store.0, "tok").await;

        let response = get(router(state), "/auth?code=c&state=tok", None).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert!(body_string(response).await.contains("Error storing session"));
    }

    #[tokio::test]
    async fn callback_accepts_verified_token() {
        let server = MockServer::start().await;
        mount_jwks(&server).await;
        let token = sign_token(&fresh_claims(&format!("{}/", server.uri())), SIGNING_KEY_ID);
        mount_token_endpoint(&server, &token).await;
        let (state, store) = verifying_state(&server.uri());
        issue_state(&store, "tok").await;

        let response = get(router(state.clone()), "/auth?code=c&state=tok", None).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        let user = state
            .sessions
            .resolve_session(&cookie_pair(&set_cookie(&response)))
            .await
            .expect("session");
        assert_eq!(user.sub, "auth0|alice");
    }

    #[tokio::test]
    async fn callback_without_key_set_is_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let token = sign_token(&fresh_claims(&format!("{}/", server.uri())), SIGNING_KEY_ID);
        mount_token_endpoint(&server, &token).await;
        let (state, store) = verifying_state(&server.uri());
        issue_state(&store, "tok").await;

        let response = get(router(state), "/auth?code=c&state=tok", None).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.contains("Authentication failed"));
    }

    #[tokio::test]
    async fn callback_caps_oversized_token_lifetime() {
        let server = MockServer::start().await;
        mount_token_endpoint_with_lifetime(
            &server,
            &id_token("auth0|alice", None),
            10_000_000_000_000,
        )
        .await;
        let (state, store) = test_state(&server.uri());
        issue_state(&store, "tok").await;

        let response = get(router(state.clone()), "/auth?code=c&state=tok", None).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        let cookie = set_cookie(&response);
        assert!(cookie.contains("Expires="));
        assert!(
            state
                .sessions
                .resolve_session(&cookie_pair(&cookie))
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn logout_without_cookie_goes_home() {
        let (state, _store) = test_state("https://tenant.example.com");
        let response = get(router(state), "/logout", None).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/");
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn logout_destroys_session_and_redirects_to_provider() {
        let (state, _store) = test_state("https://tenant.example.com");
        let grant = state
            .sessions
            .create_session(
                &crate::testing::token_set("x"),
                UserIdentity::new("auth0|alice"),
                None,
            )
            .await
            .expect("create");
        let cookie = format!("AUTH0_SESSION={}", grant.id);

        let response = get(router(state.clone()), "/logout", Some(&cookie)).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        let url = location(&response);
        assert!(url.starts_with("https://tenant.example.com/v2/logout?"));
        let params = query_map(&url);
        assert_eq!(params["client_id"], "client-id");
        assert_eq!(params["returnTo"], "https://app.example.com");

        let cleared = set_cookie(&response);
        assert!(cleared.starts_with("AUTH0_SESSION=;"));
        assert!(cleared.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));

        assert!(state.sessions.resolve_session(&cookie).await.is_none());
    }

    #[tokio::test]
    async fn logout_twice_is_harmless() {
        let (state, _store) = test_state("https://tenant.example.com");
        let cookie = format!("AUTH0_SESSION={}", gatehouse_core::SessionId::new());

        for _ in 0..2 {
            let response = get(router(state.clone()), "/logout", Some(&cookie)).await;
            assert_eq!(response.status(), StatusCode::FOUND);
        }
    }

    #[test]
    fn found_is_a_302() {
        let response = found("/somewhere");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/somewhere");
    }

    #[tokio::test]
    async fn build_authorization_url_embeds_fresh_state() {
        let (state, _store) = test_state("https://tenant.example.com");
        let first = build_authorization_url(&state, "/a").await.expect("url");
        let second = build_authorization_url(&state, "/a").await.expect("url");
        assert_ne!(first, second);

        let token = LoginState::parse(&query_map(&first)["state"]).token().clone();
        assert_ne!(token, StateToken::new(String::new()));
    }
}
