//! Error handling foundation for gatehouse.
//!
//! This module provides only the `Result` type alias using rootcause.
//! Each crate defines its own domain-specific error types in their own
//! error modules. A layer that calls into another maps the lower report's
//! context into its own error type at the boundary.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
///
/// The context type `C` is the domain error of the layer that produced it.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
