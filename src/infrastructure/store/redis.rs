//! # Redis Store
//!
//! Redis-backed implementation of [`KeyValueStore`] over a multiplexed
//! async connection.
//!
//! TTLs map to `PX` millisecond expiries, set-if-absent to `SET ... NX`,
//! batched writes to a pipelined sequence of `SET` commands, and pattern
//! listing to cursor-based `SCAN MATCH` with a `KEYS` fallback for
//! backends that reject `SCAN`.

use crate::infrastructure::store::{KeyValueStore, StoreEntry, StoreError, StoreResult};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Keys fetched per SCAN round trip.
const SCAN_COUNT: u64 = 100;

/// Redis-backed [`KeyValueStore`].
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    /// Connects to a Redis instance.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the URL is invalid or the connection
    /// cannot be established.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::backend(e.to_string()))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(Self { connection })
    }

    fn set_command(key: &str, value: &str, ttl: Option<Duration>) -> redis::Cmd {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl.as_millis() as u64);
        }
        cmd
    }
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.connection.clone();
        conn.get(key)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        Self::set_command(key, value, ttl)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<bool> {
        let mut conn = self.connection.clone();
        let mut cmd = Self::set_command(key, value, ttl);
        cmd.arg("NX");
        // SET ... NX answers OK on success and nil when the key exists.
        let reply: Option<String> = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(reply.is_some())
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.connection.clone();
        let removed: u64 = conn
            .del(key)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(removed > 0)
    }

    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.connection.clone();
        let mut cmd = redis::cmd("MGET");
        for key in keys {
            cmd.arg(key);
        }
        cmd.query_async(&mut conn)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))
    }

    async fn put_many(&self, entries: Vec<StoreEntry>) -> StoreResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection.clone();
        let mut pipe = redis::pipe();
        for entry in &entries {
            pipe.add_command(Self::set_command(&entry.key, &entry.value, entry.ttl))
                .ignore();
        }
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))
    }

    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.connection.clone();
        let scanned: Result<Vec<String>, redis::RedisError> = async {
            let mut keys = Vec::new();
            let mut cursor: u64 = 0;
            loop {
                let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                    .cursor_arg(cursor)
                    .arg("MATCH")
                    .arg(pattern)
                    .arg("COUNT")
                    .arg(SCAN_COUNT)
                    .query_async(&mut conn)
                    .await?;
                keys.extend(batch);
                if next == 0 {
                    break;
                }
                cursor = next;
            }
            Ok(keys)
        }
        .await;

        match scanned {
            Ok(keys) => Ok(keys),
            Err(e) => {
                // Some managed backends disable SCAN; degrade to KEYS.
                warn!(pattern, error = %e, "SCAN failed, falling back to KEYS");
                let mut conn = self.connection.clone();
                conn.keys(pattern)
                    .await
                    .map_err(|e| StoreError::backend(e.to_string()))
            }
        }
    }
}
