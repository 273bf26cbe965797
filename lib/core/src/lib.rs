//! Core domain types and utilities for gatehouse.
//!
//! This crate provides the foundational types and error handling shared by
//! the login, session, and tool crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, SessionId};
