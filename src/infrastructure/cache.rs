//! # Edge Cache
//!
//! Uniform store of per-edge quotes with per-quote TTL.
//!
//! Quotes live under two key families the router scans:
//! `otc:quotes:{from}:{to}:{venue}` for OTC and FX edges and
//! `routing:edge:solana:{from}:{to}:{venue}` for DEX edges. TTLs are
//! bounded below at one second so a nearly expired quote still lands and
//! dies on its own expiry.
//!
//! Reads are resilient: a record that fails to parse is dropped with a
//! warning and never propagates an error into the router.

use crate::domain::entities::{EdgeQuote, VenueKind};
use crate::domain::value_objects::Token;
use crate::infrastructure::clock::Clock;
use crate::infrastructure::store::{KeyValueStore, StoreEntry, StoreError, StoreResult, keys};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Lower bound on a cached quote's TTL.
const MIN_TTL: Duration = Duration::from_secs(1);

/// TTL'd cache of edge quotes over the key-value store.
#[derive(Debug, Clone)]
pub struct EdgeCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl EdgeCache {
    /// Creates a cache over `store` reading time from `clock`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn key_for(quote: &EdgeQuote) -> String {
        match quote.venue_kind {
            VenueKind::Dex => keys::dex_edge(&quote.from_token, &quote.to_token, &quote.venue_id),
            VenueKind::Otc | VenueKind::Fx => {
                keys::otc_edge(&quote.from_token, &quote.to_token, &quote.venue_id)
            }
        }
    }

    fn ttl_for(&self, quote: &EdgeQuote) -> Duration {
        let remaining_ms = self.clock.now().millis_until(quote.expiry_ts);
        if remaining_ms <= MIN_TTL.as_millis() as i64 {
            MIN_TTL
        } else {
            Duration::from_millis(remaining_ms as u64)
        }
    }

    /// Writes one quote with TTL `max(1s, expiry - now)`.
    ///
    /// # Errors
    ///
    /// Returns a store error when the write or serialization fails.
    pub async fn put_quote(&self, quote: &EdgeQuote) -> StoreResult<()> {
        let value = serde_json::to_string(quote)
            .map_err(|e| StoreError::serialization(e.to_string()))?;
        self.store
            .set(&Self::key_for(quote), &value, Some(self.ttl_for(quote)))
            .await
    }

    /// Writes a batch of quotes in one pipelined round trip.
    ///
    /// # Errors
    ///
    /// Returns a store error when the write or serialization fails.
    pub async fn put_quote_batch(&self, quotes: &[EdgeQuote]) -> StoreResult<()> {
        if quotes.is_empty() {
            return Ok(());
        }
        let mut entries = Vec::with_capacity(quotes.len());
        for quote in quotes {
            let value = serde_json::to_string(quote)
                .map_err(|e| StoreError::serialization(e.to_string()))?;
            entries.push(StoreEntry::with_ttl(
                Self::key_for(quote),
                value,
                self.ttl_for(quote),
            ));
        }
        self.store.put_many(entries).await
    }

    /// Lists every cached key for a pair across both edge families.
    ///
    /// # Errors
    ///
    /// Returns a store error when the scan fails.
    pub async fn scan_by_pair(&self, from: &Token, to: &Token) -> StoreResult<Vec<String>> {
        let mut keys = self.store.scan(&keys::otc_pair_pattern(from, to)).await?;
        keys.extend(self.store.scan(&keys::dex_pair_pattern(from, to)).await?);
        Ok(keys)
    }

    /// Returns the live parsed quotes for a pair.
    ///
    /// Records that fail to parse are dropped with a warning; expired
    /// records are dropped silently.
    ///
    /// # Errors
    ///
    /// Returns a store error when the scan or batched read fails.
    pub async fn get_cached_by_pair(&self, from: &Token, to: &Token) -> StoreResult<Vec<EdgeQuote>> {
        let keys = self.scan_by_pair(from, to).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let values = self.store.mget(&keys).await?;
        let now = self.clock.now();

        let mut quotes = Vec::with_capacity(values.len());
        for (key, value) in keys.iter().zip(values) {
            let Some(value) = value else { continue };
            match serde_json::from_str::<EdgeQuote>(&value) {
                Ok(quote) if quote.is_live(now, 0) => quotes.push(quote),
                Ok(_) => {}
                Err(e) => {
                    warn!(key, error = %e, "dropping unparseable cached quote");
                }
            }
        }
        Ok(quotes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Amount;
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::store::MemoryStore;

    fn token(s: &str) -> Token {
        Token::new(s).unwrap()
    }

    fn quote(venue: &str, kind: VenueKind, from: &str, to: &str, expiry_ms: i64) -> EdgeQuote {
        EdgeQuote::builder(venue, kind, from, to)
            .unwrap()
            .amounts(Amount::new(1000.0).unwrap(), Amount::new(920.0).unwrap())
            .timestamps(crate::domain::value_objects::Timestamp::from_millis(0), expiry_ms.into())
            .build()
            .unwrap()
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        store: Arc<MemoryStore>,
        cache: EdgeCache,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::at(0));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let cache = EdgeCache::new(store.clone(), clock.clone());
        Fixture {
            clock,
            store,
            cache,
        }
    }

    #[tokio::test]
    async fn put_and_read_back_by_pair() {
        let f = fixture();
        let q = quote("otc:x", VenueKind::Otc, "USDC", "EUR", 30_000);
        f.cache.put_quote(&q).await.unwrap();

        let cached = f
            .cache
            .get_cached_by_pair(&token("USDC"), &token("EUR"))
            .await
            .unwrap();
        assert_eq!(cached, vec![q]);
    }

    #[tokio::test]
    async fn dex_quotes_land_in_their_own_family() {
        let f = fixture();
        let q = quote("dex:orca", VenueKind::Dex, "USDC", "EURC", 5_000);
        f.cache.put_quote(&q).await.unwrap();

        let keys = f
            .cache
            .scan_by_pair(&token("USDC"), &token("EURC"))
            .await
            .unwrap();
        assert_eq!(keys, vec!["routing:edge:solana:USDC:EURC:dex:orca".to_string()]);
    }

    #[tokio::test]
    async fn both_families_scanned_together() {
        let f = fixture();
        f.cache
            .put_quote_batch(&[
                quote("otc:x", VenueKind::Otc, "USDC", "EURC", 30_000),
                quote("dex:orca", VenueKind::Dex, "USDC", "EURC", 5_000),
            ])
            .await
            .unwrap();

        let cached = f
            .cache
            .get_cached_by_pair(&token("USDC"), &token("EURC"))
            .await
            .unwrap();
        assert_eq!(cached.len(), 2);
    }

    #[tokio::test]
    async fn quote_evicted_at_expiry() {
        let f = fixture();
        f.cache
            .put_quote(&quote("otc:x", VenueKind::Otc, "USDC", "EUR", 30_000))
            .await
            .unwrap();

        f.clock.advance_millis(30_000);
        let cached = f
            .cache
            .get_cached_by_pair(&token("USDC"), &token("EUR"))
            .await
            .unwrap();
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn near_expired_quote_still_gets_min_ttl() {
        let f = fixture();
        // Expires in 200ms; the store TTL floors at 1s so the write lands.
        f.cache
            .put_quote(&quote("otc:x", VenueKind::Otc, "USDC", "EUR", 200))
            .await
            .unwrap();
        let keys = f
            .cache
            .scan_by_pair(&token("USDC"), &token("EUR"))
            .await
            .unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[tokio::test]
    async fn unparseable_record_dropped_not_fatal() {
        let f = fixture();
        f.store
            .set("otc:quotes:USDC:EUR:otc:bad", "{not json", None)
            .await
            .unwrap();
        f.cache
            .put_quote(&quote("otc:x", VenueKind::Otc, "USDC", "EUR", 30_000))
            .await
            .unwrap();

        let cached = f
            .cache
            .get_cached_by_pair(&token("USDC"), &token("EUR"))
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].venue_id.as_str(), "otc:x");
    }

    #[tokio::test]
    async fn unknown_pair_reads_empty() {
        let f = fixture();
        let cached = f
            .cache
            .get_cached_by_pair(&token("NGN"), &token("MXN"))
            .await
            .unwrap();
        assert!(cached.is_empty());
    }
}
