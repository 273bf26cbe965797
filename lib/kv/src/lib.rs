//! Key-value storage for gatehouse.
//!
//! Login state tokens and session records live in a key-value store with
//! per-item expiry. The store is addressed only through the [`KvStore`]
//! trait so the backing service can be swapped without touching the
//! session lifecycle.
//!
//! [`MemoryStore`] is the in-process implementation used for local runs
//! and tests.

mod error;
mod memory;
mod store;

pub use error::KvError;
pub use memory::MemoryStore;
pub use store::KvStore;
