//! The closed set of tool operations and their dispatch.

use gatehouse_core::Result;
use gatehouse_platform_access::UserIdentity;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::data::SampleData;
use crate::error::ToolError;

/// Message returned by a tool invoked without a session.
pub const NOT_AUTHENTICATED: &str = "Not authenticated. Please log in first.";

/// Every tool a client can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Returns the signed-in user's profile.
    GetProfile,
    /// Returns the sample data set.
    GetData,
}

/// Public description of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name clients pass in the `tool` field.
    pub name: String,
    /// Human-readable description.
    pub description: String,
}

/// What a tool returns: either `{"result": ...}` or `{"error": "..."}`.
///
/// Both are successful tool calls from the transport's point of view; the
/// `error` form reports conditions the caller can fix, such as logging in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolOutcome {
    Result(JsonValue),
    Error(String),
}

impl Tool {
    /// All tools, in the order they are advertised.
    pub const ALL: [Tool; 2] = [Tool::GetProfile, Tool::GetData];

    /// Returns the wire name of the tool.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetProfile => "get_profile",
            Self::GetData => "get_data",
        }
    }

    /// Returns the public definition of the tool.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        let description = match self {
            Self::GetProfile => "Fetch the signed-in user's profile",
            Self::GetData => "Fetch sample data for the signed-in user",
        };
        ToolDefinition {
            name: self.name().to_string(),
            description: description.to_string(),
        }
    }

    /// Returns the definitions of every tool.
    #[must_use]
    pub fn definitions() -> Vec<ToolDefinition> {
        Self::ALL.iter().map(Tool::definition).collect()
    }

    /// Parses a raw `/mcp` request body of the form `{"tool": "<name>", ...}`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidRequest`] if the body is not JSON and
    /// [`ToolError::UnknownTool`] if it names no tool or an unknown one.
    pub fn from_request(body: &[u8]) -> Result<Self, ToolError> {
        let request: JsonValue =
            serde_json::from_slice(body).map_err(|e| ToolError::InvalidRequest {
                reason: e.to_string(),
            })?;

        let name = request
            .get("tool")
            .and_then(JsonValue::as_str)
            .ok_or(ToolError::UnknownTool { name: None })?;

        Ok(name.parse::<Tool>()?)
    }

    /// Runs the tool for `user`.
    ///
    /// Without a user every tool answers with [`NOT_AUTHENTICATED`] as a
    /// tool-level error rather than failing.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::ExecutionFailed`] if the result cannot be built.
    pub fn invoke(&self, user: Option<&UserIdentity>) -> Result<ToolOutcome, ToolError> {
        let Some(user) = user else {
            debug!(tool = self.name(), "tool invoked without a session");
            return Ok(ToolOutcome::Error(NOT_AUTHENTICATED.to_string()));
        };

        let result = match self {
            Self::GetProfile => serde_json::to_value(user),
            Self::GetData => serde_json::to_value(SampleData::for_user(user)),
        }
        .map_err(|e| ToolError::ExecutionFailed {
            tool: self.name(),
            reason: e.to_string(),
        })?;

        debug!(tool = self.name(), sub = %user.sub, "tool invoked");
        Ok(ToolOutcome::Result(result))
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = ToolError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name() == s)
            .ok_or_else(|| ToolError::UnknownTool {
                name: Some(s.to_string()),
            })
    }
}
