//! Tool operations for gatehouse.
//!
//! Tools are small operations a client invokes by name over the `/mcp`
//! endpoint. The set is closed: [`Tool`] enumerates every operation and
//! dispatch is an exhaustive match, so adding a tool is a compile-checked
//! change.

pub mod data;
pub mod error;
pub mod tool;

pub use data::{SampleData, SampleItem};
pub use error::ToolError;
pub use tool::{NOT_AUTHENTICATED, Tool, ToolDefinition, ToolOutcome};
