//! # Key-Value Store Port
//!
//! The single shared mutable resource of the system: a string key-value
//! store with per-key TTLs, atomic set-if-absent, batched reads and
//! pipelined writes, and pattern listing.
//!
//! Writes are per-key; no multi-key transactions are assumed. The pipeline
//! tolerates brief windows of inconsistency between related keys (deposit
//! record vs reference index, reserved vs provisional quote) and relies on
//! short TTLs and idempotent consumers to self-heal.
//!
//! Adapters: [`MemoryStore`] for tests and single-process deployments,
//! [`RedisStore`] for production.

pub mod keys;
pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error raised by a store adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend rejected or dropped the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A stored value could not be serialized or deserialized.
    #[error("store serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Creates a backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// One entry of a pipelined multi-write.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// Target key.
    pub key: String,
    /// Value to store.
    pub value: String,
    /// Per-key TTL; `None` stores without expiry.
    pub ttl: Option<Duration>,
}

impl StoreEntry {
    /// Creates an entry with a TTL.
    #[must_use]
    pub fn with_ttl(key: impl Into<String>, value: impl Into<String>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ttl: Some(ttl),
        }
    }
}

/// String key-value store with per-key TTL.
///
/// Patterns passed to [`scan`](KeyValueStore::scan) use `*` as the only
/// wildcard, matching any run of characters.
#[async_trait]
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Reads a key. Expired keys read as absent.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes a key, replacing any prior value, with an optional TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Writes a key only if absent. Returns true when the write won.
    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<bool>;

    /// Deletes a key. Returns true when a live key was removed.
    async fn del(&self, key: &str) -> StoreResult<bool>;

    /// Reads many keys in one round trip, position-aligned with the input.
    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>>;

    /// Writes many keys in one pipelined round trip.
    async fn put_many(&self, entries: Vec<StoreEntry>) -> StoreResult<()>;

    /// Lists the live keys matching a `*` pattern.
    ///
    /// Adapters use non-blocking cursor iteration where the backend
    /// offers it and fall back to a full key listing otherwise.
    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_entry_with_ttl() {
        let entry = StoreEntry::with_ttl("k", "v", Duration::from_secs(5));
        assert_eq!(entry.key, "k");
        assert_eq!(entry.ttl, Some(Duration::from_secs(5)));
    }

    #[test]
    fn error_constructors() {
        assert!(StoreError::backend("down").to_string().contains("down"));
        assert!(
            StoreError::serialization("bad json")
                .to_string()
                .contains("bad json")
        );
    }
}
