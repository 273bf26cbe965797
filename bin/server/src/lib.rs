//! gatehouse web server.
//!
//! This crate provides the HTTP surface of gatehouse: the provider login
//! flow, key-value backed sessions, the data and tool endpoints, and the HTML
//! shell with identity injection.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod mcp;
pub mod pages;

#[cfg(test)]
mod testing;
