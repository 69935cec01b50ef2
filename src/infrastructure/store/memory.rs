//! # In-Memory Store
//!
//! TTL-aware in-memory implementation of [`KeyValueStore`].
//!
//! Backs unit and scenario tests and single-process dev deployments.
//! Expiry is evaluated lazily against the injected clock on every read,
//! so tests drive it deterministically with a manual clock.

use crate::infrastructure::clock::Clock;
use crate::infrastructure::store::{KeyValueStore, StoreEntry, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at_ms: Option<i64>,
}

impl StoredValue {
    fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at_ms.is_none_or(|at| now_ms < at)
    }
}

/// In-memory [`KeyValueStore`] with lazy TTL eviction.
///
/// # Examples
///
/// ```ignore
/// let clock = Arc::new(ManualClock::at(0));
/// let store = MemoryStore::new(clock.clone());
/// store.set("k", "v", Some(Duration::from_secs(1))).await?;
/// clock.advance_millis(1_000);
/// assert!(store.get("k").await?.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, StoredValue>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Creates an empty store reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now_ms = self.clock.now().millis();
        self.entries
            .read()
            .await
            .values()
            .filter(|v| v.is_live(now_ms))
            .count()
    }

    /// Returns true when no live entries remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn stored(&self, value: &str, ttl: Option<Duration>) -> StoredValue {
        StoredValue {
            value: value.to_string(),
            expires_at_ms: ttl.map(|d| self.clock.now().millis() + d.as_millis() as i64),
        }
    }
}

/// Matches a key against a pattern where `*` spans any run of characters.
fn pattern_matches(pattern: &str, key: &str) -> bool {
    let Some((prefix, tail)) = pattern.split_once('*') else {
        return pattern == key;
    };
    if !key.starts_with(prefix) {
        return false;
    }
    let mut remaining = &key[prefix.len()..];
    let mut parts = tail.split('*').peekable();
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            // Final part anchors at the end of the key.
            return part.is_empty() || remaining.ends_with(part);
        }
        match remaining.find(part) {
            Some(idx) => remaining = &remaining[idx + part.len()..],
            None => return false,
        }
    }
    true
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now_ms = self.clock.now().millis();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|v| v.is_live(now_ms))
            .map(|v| v.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let stored = self.stored(value, ttl);
        self.entries.write().await.insert(key.to_string(), stored);
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<bool> {
        let now_ms = self.clock.now().millis();
        let stored = self.stored(value, ttl);
        let mut entries = self.entries.write().await;
        let occupied = entries.get(key).is_some_and(|v| v.is_live(now_ms));
        if occupied {
            return Ok(false);
        }
        entries.insert(key.to_string(), stored);
        Ok(true)
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        let now_ms = self.clock.now().millis();
        let mut entries = self.entries.write().await;
        match entries.remove(key) {
            Some(value) => Ok(value.is_live(now_ms)),
            None => Ok(false),
        }
    }

    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        let now_ms = self.clock.now().millis();
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .map(|key| {
                entries
                    .get(key)
                    .filter(|v| v.is_live(now_ms))
                    .map(|v| v.value.clone())
            })
            .collect())
    }

    async fn put_many(&self, batch: Vec<StoreEntry>) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        for entry in batch {
            let stored = self.stored(&entry.value, entry.ttl);
            entries.insert(entry.key, stored);
        }
        Ok(())
    }

    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let now_ms = self.clock.now().millis();
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(key, value)| value.is_live(now_ms) && pattern_matches(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::ManualClock;

    fn store() -> (Arc<ManualClock>, MemoryStore) {
        let clock = Arc::new(ManualClock::at(0));
        let store = MemoryStore::new(clock.clone());
        (clock, store)
    }

    mod basic_ops {
        use super::*;

        #[tokio::test]
        async fn set_get_del() {
            let (_, store) = store();
            store.set("k", "v", None).await.unwrap();
            assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
            assert!(store.del("k").await.unwrap());
            assert!(store.get("k").await.unwrap().is_none());
            assert!(!store.del("k").await.unwrap());
        }

        #[tokio::test]
        async fn set_overwrites() {
            let (_, store) = store();
            store.set("k", "v1", None).await.unwrap();
            store.set("k", "v2", None).await.unwrap();
            assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
        }

        #[tokio::test]
        async fn mget_aligns_with_input() {
            let (_, store) = store();
            store.set("a", "1", None).await.unwrap();
            store.set("c", "3", None).await.unwrap();
            let values = store
                .mget(&["a".to_string(), "b".to_string(), "c".to_string()])
                .await
                .unwrap();
            assert_eq!(
                values,
                vec![Some("1".to_string()), None, Some("3".to_string())]
            );
        }
    }

    mod ttl {
        use super::*;

        #[tokio::test]
        async fn key_dies_at_expiry() {
            let (clock, store) = store();
            store
                .set("k", "v", Some(Duration::from_secs(15)))
                .await
                .unwrap();
            clock.advance_millis(14_999);
            assert!(store.get("k").await.unwrap().is_some());
            clock.advance_millis(1);
            assert!(store.get("k").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn expired_key_does_not_count() {
            let (clock, store) = store();
            store
                .set("k", "v", Some(Duration::from_secs(1)))
                .await
                .unwrap();
            clock.advance_secs(2);
            assert!(store.is_empty().await);
        }
    }

    mod set_nx {
        use super::*;

        #[tokio::test]
        async fn first_write_wins() {
            let (_, store) = store();
            assert!(store.set_nx("k", "first", None).await.unwrap());
            assert!(!store.set_nx("k", "second", None).await.unwrap());
            assert_eq!(store.get("k").await.unwrap().as_deref(), Some("first"));
        }

        #[tokio::test]
        async fn expired_key_can_be_rewritten() {
            let (clock, store) = store();
            store
                .set_nx("k", "old", Some(Duration::from_secs(1)))
                .await
                .unwrap();
            clock.advance_secs(2);
            assert!(store.set_nx("k", "new", None).await.unwrap());
        }
    }

    mod batch {
        use super::*;

        #[tokio::test]
        async fn put_many_writes_all() {
            let (_, store) = store();
            store
                .put_many(vec![
                    StoreEntry::with_ttl("a", "1", Duration::from_secs(5)),
                    StoreEntry::with_ttl("b", "2", Duration::from_secs(5)),
                ])
                .await
                .unwrap();
            assert_eq!(store.len().await, 2);
        }
    }

    mod scan {
        use super::*;

        #[tokio::test]
        async fn prefix_wildcard_matches() {
            let (_, store) = store();
            store
                .set("otc:quotes:BRL:USDC:otc:a", "1", None)
                .await
                .unwrap();
            store
                .set("otc:quotes:BRL:USDC:otc:b", "2", None)
                .await
                .unwrap();
            store
                .set("otc:quotes:BRL:EUR:otc:a", "3", None)
                .await
                .unwrap();
            let keys = store.scan("otc:quotes:BRL:USDC:*").await.unwrap();
            assert_eq!(keys.len(), 2);
            assert!(keys.iter().all(|k| k.contains("BRL:USDC")));
        }

        #[tokio::test]
        async fn scan_skips_expired_keys() {
            let (clock, store) = store();
            store
                .set("routing:edge:solana:USDC:EURC:dex:a", "1", Some(Duration::from_secs(1)))
                .await
                .unwrap();
            clock.advance_secs(2);
            let keys = store.scan("routing:edge:solana:*").await.unwrap();
            assert!(keys.is_empty());
        }

        #[tokio::test]
        async fn exact_pattern_matches_exactly() {
            let (_, store) = store();
            store.set("abc", "1", None).await.unwrap();
            store.set("abcd", "2", None).await.unwrap();
            assert_eq!(store.scan("abc").await.unwrap(), vec!["abc".to_string()]);
        }
    }

    mod pattern {
        use super::*;

        #[test]
        fn star_spans_any_run() {
            assert!(pattern_matches("a:*:c", "a:b:c"));
            assert!(pattern_matches("a:*", "a:anything:else"));
            assert!(pattern_matches("*", "anything"));
            assert!(pattern_matches("a*b*c", "a-x-b-y-c"));
            assert!(!pattern_matches("a:*:c", "a:b:d"));
            assert!(!pattern_matches("a:*:c", "a:b:cx"));
            assert!(!pattern_matches("b:*", "a:b"));
        }

        #[test]
        fn no_star_requires_equality() {
            assert!(pattern_matches("abc", "abc"));
            assert!(!pattern_matches("abc", "abcd"));
        }
    }
}
