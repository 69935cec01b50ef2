//! # Prefetch Orchestrator
//!
//! Drives the providers on two independent cadences and writes their
//! snapshots through the edge cache.
//!
//! Fast tier (default 30 s): static books and DEX-shaped feeds. Slow
//! tier (default 60 s, floored at 58 s): rate-limited HTTP FX feeds,
//! each respecting its own internal pacing. All providers within a tier
//! fetch concurrently; a provider failure is logged and never cancels
//! its siblings. A cycle waits for in-flight fetches at the period
//! boundary rather than cancelling them.
//!
//! On startup the orchestrator runs one eager slow-tier cycle so the
//! cache is warm before the first routing request.

use crate::domain::entities::EdgeQuote;
use crate::infrastructure::cache::EdgeCache;
use crate::infrastructure::providers::{ProviderTier, QuoteProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Floor on the slow-tier period.
pub const MIN_SLOW_PERIOD_SECS: u64 = 58;

/// Cadence configuration for the two tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefetchConfig {
    /// Fast-tier period in seconds.
    #[serde(default = "default_fast_period")]
    pub fast_period_secs: u64,
    /// Slow-tier period in seconds; values under 58 are raised to 58.
    #[serde(default = "default_slow_period")]
    pub slow_period_secs: u64,
}

fn default_fast_period() -> u64 {
    30
}

fn default_slow_period() -> u64 {
    60
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            fast_period_secs: default_fast_period(),
            slow_period_secs: default_slow_period(),
        }
    }
}

impl PrefetchConfig {
    /// Effective slow period after applying the floor.
    #[must_use]
    pub fn slow_period(&self) -> Duration {
        Duration::from_secs(self.slow_period_secs.max(MIN_SLOW_PERIOD_SECS))
    }

    /// Fast-tier period.
    #[must_use]
    pub fn fast_period(&self) -> Duration {
        Duration::from_secs(self.fast_period_secs)
    }
}

/// Periodic provider driver.
pub struct PrefetchOrchestrator {
    cache: Arc<EdgeCache>,
    providers: Vec<Arc<dyn QuoteProvider>>,
    config: PrefetchConfig,
}

impl PrefetchOrchestrator {
    /// Creates an orchestrator over the given providers.
    #[must_use]
    pub fn new(
        cache: Arc<EdgeCache>,
        providers: Vec<Arc<dyn QuoteProvider>>,
        config: PrefetchConfig,
    ) -> Self {
        Self {
            cache,
            providers,
            config,
        }
    }

    fn tier_providers(&self, tier: ProviderTier) -> Vec<Arc<dyn QuoteProvider>> {
        self.providers
            .iter()
            .filter(|p| p.tier() == tier)
            .cloned()
            .collect()
    }

    /// Runs one cycle of a tier: all providers concurrently, results
    /// written through the cache, failures logged per provider.
    pub async fn run_cycle(&self, tier: ProviderTier) {
        let providers = self.tier_providers(tier);
        if providers.is_empty() {
            return;
        }

        let mut handles = Vec::with_capacity(providers.len());
        for provider in providers {
            let handle: JoinHandle<(String, Option<Vec<EdgeQuote>>)> =
                tokio::spawn(async move {
                    let venue = provider.venue_id().to_string();
                    match provider.fetch_quotes().await {
                        Ok(quotes) => (venue, Some(quotes)),
                        Err(e) => {
                            warn!(venue = %venue, error = %e, "provider fetch failed");
                            (venue, None)
                        }
                    }
                });
            handles.push(handle);
        }

        for handle in handles {
            match handle.await {
                Ok((venue, Some(quotes))) => {
                    debug!(venue = %venue, count = quotes.len(), "writing provider snapshot");
                    if let Err(e) = self.cache.put_quote_batch(&quotes).await {
                        warn!(venue = %venue, error = %e, "snapshot write failed");
                    }
                }
                Ok((_, None)) => {}
                Err(e) => {
                    warn!(error = %e, "provider task panicked");
                }
            }
        }
    }

    /// Spawns the two tier loops and returns their handles.
    ///
    /// The slow tier runs one eager cycle before entering its period so
    /// the cache is warm before the first routing request. Each loop
    /// awaits its cycle before sleeping again, so an overlong cycle
    /// delays the next tick instead of overlapping it.
    #[must_use]
    pub fn spawn(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        info!(
            fast_secs = self.config.fast_period().as_secs(),
            slow_secs = self.config.slow_period().as_secs(),
            providers = self.providers.len(),
            "starting prefetch tiers"
        );

        let fast = {
            let orchestrator = self.clone();
            tokio::spawn(async move {
                let mut ticker = interval(orchestrator.config.fast_period());
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    orchestrator.run_cycle(ProviderTier::Fast).await;
                }
            })
        };

        let slow = {
            let orchestrator = self.clone();
            tokio::spawn(async move {
                // Eager warm-up fetch.
                orchestrator.run_cycle(ProviderTier::Slow).await;
                let mut ticker = interval(orchestrator.config.slow_period());
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    orchestrator.run_cycle(ProviderTier::Slow).await;
                }
            })
        };

        vec![fast, slow]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::VenueKind;
    use crate::domain::value_objects::{Amount, Timestamp, Token, VenueId};
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::providers::{ProviderError, ProviderResult};
    use crate::infrastructure::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct ScriptedProvider {
        venue_id: VenueId,
        tier: ProviderTier,
        fail: bool,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(venue: &str, tier: ProviderTier, fail: bool) -> Self {
            Self {
                venue_id: VenueId::new(venue),
                tier,
                fail,
                calls: AtomicUsize::new(0),
            }
        }

        fn quote(&self) -> EdgeQuote {
            EdgeQuote::builder(
                self.venue_id.clone(),
                VenueKind::Otc,
                "USDC",
                "EUR",
            )
            .unwrap()
            .amounts(Amount::new(1000.0).unwrap(), Amount::new(920.0).unwrap())
            .timestamps(Timestamp::from_millis(0), Timestamp::from_millis(60_000))
            .build()
            .unwrap()
        }
    }

    #[async_trait]
    impl QuoteProvider for ScriptedProvider {
        fn venue_id(&self) -> &VenueId {
            &self.venue_id
        }

        fn tier(&self) -> ProviderTier {
            self.tier
        }

        async fn fetch_quotes(&self) -> ProviderResult<Vec<EdgeQuote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::http("scripted outage"));
            }
            Ok(vec![self.quote()])
        }
    }

    struct Fixture {
        cache: Arc<EdgeCache>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::at(0));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        Fixture {
            cache: Arc::new(EdgeCache::new(store, clock)),
        }
    }

    #[tokio::test]
    async fn cycle_writes_snapshots_through_the_cache() {
        let f = fixture();
        let provider = Arc::new(ScriptedProvider::new("otc:a", ProviderTier::Fast, false));
        let orchestrator = PrefetchOrchestrator::new(
            f.cache.clone(),
            vec![provider.clone()],
            PrefetchConfig::default(),
        );

        orchestrator.run_cycle(ProviderTier::Fast).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        let cached = f
            .cache
            .get_cached_by_pair(&Token::new("USDC").unwrap(), &Token::new("EUR").unwrap())
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn failing_provider_does_not_cancel_siblings() {
        let f = fixture();
        let good = Arc::new(ScriptedProvider::new("otc:good", ProviderTier::Fast, false));
        let bad = Arc::new(ScriptedProvider::new("otc:bad", ProviderTier::Fast, true));
        let orchestrator = PrefetchOrchestrator::new(
            f.cache.clone(),
            vec![bad.clone(), good.clone()],
            PrefetchConfig::default(),
        );

        orchestrator.run_cycle(ProviderTier::Fast).await;

        assert_eq!(good.calls.load(Ordering::SeqCst), 1);
        assert_eq!(bad.calls.load(Ordering::SeqCst), 1);
        let cached = f
            .cache
            .get_cached_by_pair(&Token::new("USDC").unwrap(), &Token::new("EUR").unwrap())
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn cycles_respect_tier_membership() {
        let f = fixture();
        let fast = Arc::new(ScriptedProvider::new("otc:fast", ProviderTier::Fast, false));
        let slow = Arc::new(ScriptedProvider::new("fx:slow", ProviderTier::Slow, false));
        let orchestrator = PrefetchOrchestrator::new(
            f.cache.clone(),
            vec![fast.clone(), slow.clone()],
            PrefetchConfig::default(),
        );

        orchestrator.run_cycle(ProviderTier::Fast).await;
        assert_eq!(fast.calls.load(Ordering::SeqCst), 1);
        assert_eq!(slow.calls.load(Ordering::SeqCst), 0);

        orchestrator.run_cycle(ProviderTier::Slow).await;
        assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn spawned_slow_tier_warms_up_eagerly() {
        let f = fixture();
        let slow = Arc::new(ScriptedProvider::new("fx:slow", ProviderTier::Slow, false));
        let orchestrator = Arc::new(PrefetchOrchestrator::new(
            f.cache.clone(),
            vec![slow.clone()],
            PrefetchConfig {
                fast_period_secs: 3_600,
                slow_period_secs: 3_600,
            },
        ));

        let handles = orchestrator.spawn();
        // Give the eager warm-up a moment without waiting for a period.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
        for handle in handles {
            handle.abort();
        }
    }

    #[test]
    fn slow_period_floors_at_58_seconds() {
        let config = PrefetchConfig {
            fast_period_secs: 30,
            slow_period_secs: 10,
        };
        assert_eq!(config.slow_period(), Duration::from_secs(58));
    }
}
