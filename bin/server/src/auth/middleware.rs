//! Authentication extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use gatehouse_platform_access::UserIdentity;
use std::convert::Infallible;
use std::sync::Arc;

use super::{AppState, cookies::cookie_header};
use crate::error::ApiError;

/// Extractor for requiring an authenticated user.
///
/// If the request carries no resolvable session, the request is rejected
/// with 401 and a JSON error body.
pub struct RequireAuth(pub UserIdentity);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state)
            .await
            .unwrap_or(OptionalAuth(None));
        user.map(RequireAuth).ok_or(AuthRejection::NotAuthenticated)
    }
}

/// Extractor for optionally getting the authenticated user.
///
/// Returns None if the user is not authenticated.
pub struct OptionalAuth(pub Option<UserIdentity>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let header = cookie_header(&parts.headers);
        Ok(OptionalAuth(app_state.sessions.resolve_session(&header).await))
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => ApiError::unauthorized("Not authenticated").into_response(),
        }
    }
}
