//! The HTTP router.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::{api, mcp, pages};

/// Builds the application router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/index.html", get(pages::index))
        // Auth routes
        .route("/login", get(auth::login))
        .route("/auth", get(auth::callback))
        .route("/logout", get(auth::logout))
        // Data and tool routes
        .route("/api/data", get(api::data))
        .route("/mcp", post(mcp::call_tool))
        .route("/mcp-sse", get(mcp::tool_stream))
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            pages::inject_identity,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
