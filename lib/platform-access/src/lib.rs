//! Platform access types for gatehouse.
//!
//! This crate provides:
//! - Identity provider configuration (`ProviderConfig`, `TokenValidation`)
//! - Identity token claims and unverified payload decoding (`IdentityClaims`)
//! - The request-scoped user view (`UserIdentity`)
//! - Session records stored in the key-value store (`SessionRecord`, `SessionGrant`)
//! - The login `state` parameter codec (`StateToken`, `LoginState`)
//! - Authentication error types
//!
//! # Example
//!
//! ```
//! use gatehouse_platform_access::{LoginState, StateToken};
//!
//! let state = LoginState::new(StateToken::new("abc123".to_string()), "/dashboard");
//! let param = state.to_param();
//! assert_eq!(param, "abc123|%2Fdashboard");
//!
//! let parsed = LoginState::parse(&param);
//! assert_eq!(parsed.token().as_str(), "abc123");
//! assert_eq!(parsed.return_path(), "/dashboard");
//! ```

pub mod error;
pub mod oidc;
pub mod session;
pub mod state;
pub mod token;
pub mod user;

// Re-export main types at crate root
pub use error::AuthenticationError;
pub use oidc::{ProviderConfig, ProviderConfigBuilder, TokenValidation};
pub use session::{SessionGrant, SessionRecord};
pub use state::{LoginState, StateToken};
pub use token::{IdentityClaims, TokenSet, decode_unverified};
pub use user::UserIdentity;
