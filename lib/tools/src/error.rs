//! Error types for tool operations.

use std::fmt;

/// Errors from parsing or running a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The request body is not valid JSON.
    InvalidRequest { reason: String },
    /// The request named no tool, or one that does not exist.
    UnknownTool { name: Option<String> },
    /// The tool ran but could not build its result.
    ExecutionFailed { tool: &'static str, reason: String },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest { reason } => write!(f, "invalid tool request: {reason}"),
            Self::UnknownTool { name: Some(name) } => write!(f, "unknown tool '{name}'"),
            Self::UnknownTool { name: None } => write!(f, "no tool specified"),
            Self::ExecutionFailed { tool, reason } => {
                write!(f, "tool '{tool}' failed: {reason}")
            }
        }
    }
}

impl std::error::Error for ToolError {}
