//! The key-value store contract.

use async_trait::async_trait;
use gatehouse_core::Result;
use std::time::Duration;

use crate::error::KvError;

/// A string key-value store with per-item expiry.
///
/// Expired items must never be returned by [`get`](KvStore::get), whether
/// the backing store evicts them eagerly or lazily.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if it is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Stores `value` under `key`, replacing any previous value. The item
    /// expires after `ttl`.
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), KvError>;

    /// Removes `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), KvError>;
}

