//! # Single-Pair FX Provider
//!
//! HTTP FX feed fetched one pair per request under a strict upstream
//! rate limit.
//!
//! Within a fetch cycle the provider pauses at least 1.2 s between
//! consecutive pair requests. A failing pair is logged and skipped
//! without aborting the cycle; whatever succeeded merges over the
//! last-known-good snapshot. Each fetched pair also synthesises its
//! inverse edge unless the inverse is separately configured.

use crate::domain::entities::EdgeQuote;
use crate::domain::value_objects::VenueId;
use crate::infrastructure::clock::Clock;
use crate::infrastructure::providers::fx::{
    FxPair, FxRate, LastKnownGood, quote_from_rate, synthesize_inverse,
};
use crate::infrastructure::providers::http_client::{DEFAULT_TIMEOUT, HttpClient};
use crate::infrastructure::providers::{ProviderResult, ProviderTier, QuoteProvider};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Minimum pause between consecutive pair requests.
pub const MIN_PACE: Duration = Duration::from_millis(1_200);

/// Wire format of the single-pair rate endpoint.
#[derive(Debug, Deserialize)]
struct RateResponse {
    ask: rust_decimal::Decimal,
    bid: rust_decimal::Decimal,
    mid: rust_decimal::Decimal,
}

/// Configuration for [`SinglePairFxProvider`].
#[derive(Debug, Clone)]
pub struct SinglePairFxConfig {
    venue_id: VenueId,
    base_url: String,
    pairs: Vec<FxPair>,
    pace: Duration,
    timeout: Duration,
    synthesize_inverses: bool,
}

impl SinglePairFxConfig {
    /// Creates a configuration for a feed at `base_url`.
    #[must_use]
    pub fn new(venue_id: impl Into<VenueId>, base_url: impl Into<String>) -> Self {
        Self {
            venue_id: venue_id.into(),
            base_url: base_url.into(),
            pairs: Vec::new(),
            pace: MIN_PACE,
            timeout: DEFAULT_TIMEOUT,
            synthesize_inverses: true,
        }
    }

    /// Adds a pair to fetch each cycle.
    #[must_use]
    pub fn with_pair(mut self, pair: FxPair) -> Self {
        self.pairs.push(pair);
        self
    }

    /// Sets the pairs to fetch each cycle.
    #[must_use]
    pub fn with_pairs(mut self, pairs: Vec<FxPair>) -> Self {
        self.pairs = pairs;
        self
    }

    /// Sets the pause between pair requests. Clamped to at least 1.2 s.
    #[must_use]
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace.max(MIN_PACE);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables inverse-edge synthesis.
    #[must_use]
    pub fn without_inverse_synthesis(mut self) -> Self {
        self.synthesize_inverses = false;
        self
    }

    /// Returns the configured pairs.
    #[inline]
    #[must_use]
    pub fn pairs(&self) -> &[FxPair] {
        &self.pairs
    }

    /// Returns the inter-request pace.
    #[inline]
    #[must_use]
    pub fn pace(&self) -> Duration {
        self.pace
    }

    fn rate_url(&self) -> String {
        format!("{}/rate", self.base_url)
    }
}

/// Rate-limited single-pair-per-request FX provider.
pub struct SinglePairFxProvider {
    config: SinglePairFxConfig,
    http: HttpClient,
    clock: Arc<dyn Clock>,
    last_known_good: LastKnownGood,
}

impl SinglePairFxProvider {
    /// Creates the provider.
    ///
    /// # Errors
    ///
    /// Returns a provider error when the HTTP client cannot be built.
    pub fn new(config: SinglePairFxConfig, clock: Arc<dyn Clock>) -> ProviderResult<Self> {
        let http = HttpClient::new(config.timeout)?;
        Ok(Self {
            config,
            http,
            clock,
            last_known_good: LastKnownGood::new(),
        })
    }

    /// Seeds the last-known-good cache, for tests and warm restarts.
    pub async fn seed_last_known_good(&self, quotes: Vec<EdgeQuote>) {
        self.last_known_good.seed(quotes).await;
    }

    async fn fetch_pair(&self, pair: &FxPair) -> ProviderResult<Vec<EdgeQuote>> {
        let response: RateResponse = self
            .http
            .get_json(
                &self.config.rate_url(),
                &[
                    ("base", pair.base.as_str()),
                    ("quote", pair.quote.as_str()),
                ],
            )
            .await?;
        let rate = FxRate {
            ask: response.ask,
            bid: response.bid,
            mid: response.mid,
        };

        let now = self.clock.now();
        let mut quotes = vec![quote_from_rate(&self.config.venue_id, pair, &rate, now)?];
        if self.config.synthesize_inverses && !self.has_configured_inverse(pair) {
            quotes.push(synthesize_inverse(&self.config.venue_id, pair, &rate, now)?);
        }
        Ok(quotes)
    }

    fn has_configured_inverse(&self, pair: &FxPair) -> bool {
        self.config
            .pairs
            .iter()
            .any(|p| p.base == pair.quote && p.quote == pair.base)
    }
}

impl fmt::Debug for SinglePairFxProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinglePairFxProvider")
            .field("venue_id", &self.config.venue_id)
            .field("pairs", &self.config.pairs.len())
            .field("pace_ms", &self.config.pace.as_millis())
            .finish()
    }
}

#[async_trait]
impl QuoteProvider for SinglePairFxProvider {
    fn venue_id(&self) -> &VenueId {
        &self.config.venue_id
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Slow
    }

    async fn fetch_quotes(&self) -> ProviderResult<Vec<EdgeQuote>> {
        let mut fresh = Vec::new();
        for (idx, pair) in self.config.pairs.iter().enumerate() {
            if idx > 0 {
                sleep(self.config.pace).await;
            }
            match self.fetch_pair(pair).await {
                Ok(quotes) => fresh.extend(quotes),
                Err(e) => {
                    warn!(venue = %self.config.venue_id, pair = %pair, error = %e, "pair fetch failed");
                }
            }
        }
        Ok(self
            .last_known_good
            .merge_cycle(&self.config.venue_id, fresh)
            .await)
    }
}
