//! Tool endpoints: a JSON call endpoint and an event stream listing tools.

use axum::{
    Json,
    body::Bytes,
    response::sse::{Event, Sse},
};
use futures::stream::{self, Stream};
use gatehouse_tools::{Tool, ToolError, ToolOutcome};
use serde_json::json;
use std::convert::Infallible;
use tracing::{debug, error};

use crate::auth::{OptionalAuth, RequireAuth};
use crate::error::ApiError;

/// Runs the tool named in the request body.
///
/// Authentication is checked per tool: without a session the call still
/// succeeds at the transport level and the tool answers with an error.
pub async fn call_tool(
    OptionalAuth(user): OptionalAuth,
    body: Bytes,
) -> Result<Json<ToolOutcome>, ApiError> {
    let tool = Tool::from_request(&body).map_err(|e| match e.current_context() {
        ToolError::InvalidRequest { .. } => ApiError::bad_request("Invalid JSON in request"),
        ToolError::UnknownTool { .. } => ApiError::bad_request("Invalid tool specified"),
        other @ ToolError::ExecutionFailed { .. } => {
            ApiError::internal(format!("Failed to process MCP request: {other}"))
        }
    })?;

    let outcome = tool.invoke(user.as_ref()).map_err(|e| {
        error!(tool = %tool, error = %e.current_context(), "tool call failed");
        ApiError::internal(format!(
            "Failed to process MCP request: {}",
            e.current_context()
        ))
    })?;
    Ok(Json(outcome))
}

/// Streams the tool list to a signed-in client: an `open` event, one
/// `tools` message, then the stream ends.
///
/// The stream is dropped when the client disconnects.
pub async fn tool_stream(
    RequireAuth(user): RequireAuth,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(sub = %user.sub, "tool stream opened");

    let message = json!({ "type": "tools", "tools": Tool::definitions() });

    let events = [
        Event::default().event("open").data("connected"),
        Event::default().data(message.to_string()),
    ];
    Sse::new(stream::iter(events.into_iter().map(Ok)))
}
