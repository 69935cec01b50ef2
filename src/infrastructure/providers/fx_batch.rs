//! # Batched FX Provider
//!
//! HTTP FX feed that returns every configured pair in one request.
//!
//! Pairs missing from the response are treated as failed for the cycle
//! and degrade to the last-known-good snapshot; inverse edges are
//! synthesised the same way as the single-pair provider.

use crate::domain::entities::EdgeQuote;
use crate::domain::value_objects::VenueId;
use crate::infrastructure::clock::Clock;
use crate::infrastructure::providers::fx::{
    FxPair, FxRate, LastKnownGood, quote_from_rate, synthesize_inverse,
};
use crate::infrastructure::providers::http_client::{DEFAULT_TIMEOUT, HttpClient};
use crate::infrastructure::providers::{ProviderResult, ProviderTier, QuoteProvider};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// One row of the batched rates endpoint.
#[derive(Debug, Deserialize)]
struct RateRow {
    base: String,
    quote: String,
    ask: Decimal,
    bid: Decimal,
    mid: Decimal,
}

/// Wire format of the batched rates endpoint.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: Vec<RateRow>,
}

/// Configuration for [`BatchFxProvider`].
#[derive(Debug, Clone)]
pub struct BatchFxConfig {
    venue_id: VenueId,
    base_url: String,
    pairs: Vec<FxPair>,
    timeout: Duration,
    synthesize_inverses: bool,
}

impl BatchFxConfig {
    /// Creates a configuration for a feed at `base_url`.
    #[must_use]
    pub fn new(venue_id: impl Into<VenueId>, base_url: impl Into<String>) -> Self {
        Self {
            venue_id: venue_id.into(),
            base_url: base_url.into(),
            pairs: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            synthesize_inverses: true,
        }
    }

    /// Sets the pairs to request each cycle.
    #[must_use]
    pub fn with_pairs(mut self, pairs: Vec<FxPair>) -> Self {
        self.pairs = pairs;
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

    fn rates_url(&self) -> String {
        format!("{}/rates", self.base_url)
    }

    fn pairs_param(&self) -> String {
        self.pairs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Multi-pair-per-request FX provider.
pub struct BatchFxProvider {
    config: BatchFxConfig,
    http: HttpClient,
    clock: Arc<dyn Clock>,
    last_known_good: LastKnownGood,
}

impl BatchFxProvider {
    /// Creates the provider.
    ///
    /// # Errors
    ///
    /// Returns a provider error when the HTTP client cannot be built.
    pub fn new(config: BatchFxConfig, clock: Arc<dyn Clock>) -> ProviderResult<Self> {
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

    fn has_configured_inverse(&self, pair: &FxPair) -> bool {
        self.config
            .pairs
            .iter()
            .any(|p| p.base == pair.quote && p.quote == pair.base)
    }

    fn quotes_from_response(&self, response: RatesResponse) -> Vec<EdgeQuote> {
        let now = self.clock.now();
        let mut fresh = Vec::new();
        for row in response.rates {
            let Ok(pair) = FxPair::new(&row.base, &row.quote) else {
                warn!(venue = %self.config.venue_id, base = row.base, quote = row.quote, "skipping malformed pair");
                continue;
            };
            if !self.config.pairs.contains(&pair) {
                continue;
            }
            let rate = FxRate {
                ask: row.ask,
                bid: row.bid,
                mid: row.mid,
            };
            match quote_from_rate(&self.config.venue_id, &pair, &rate, now) {
                Ok(quote) => fresh.push(quote),
                Err(e) => {
                    warn!(venue = %self.config.venue_id, pair = %pair, error = %e, "skipping unusable rate");
                    continue;
                }
            }
            if self.config.synthesize_inverses && !self.has_configured_inverse(&pair) {
                match synthesize_inverse(&self.config.venue_id, &pair, &rate, now) {
                    Ok(quote) => fresh.push(quote),
                    Err(e) => {
                        warn!(venue = %self.config.venue_id, pair = %pair, error = %e, "inverse synthesis failed");
                    }
                }
            }
        }
        fresh
    }
}

impl fmt::Debug for BatchFxProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchFxProvider")
            .field("venue_id", &self.config.venue_id)
            .field("pairs", &self.config.pairs.len())
            .finish()
    }
}

#[async_trait]
impl QuoteProvider for BatchFxProvider {
    fn venue_id(&self) -> &VenueId {
        &self.config.venue_id
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Slow
    }

    async fn fetch_quotes(&self) -> ProviderResult<Vec<EdgeQuote>> {
        let pairs_param = self.config.pairs_param();
        let fresh = match self
            .http
            .get_json::<RatesResponse>(&self.config.rates_url(), &[("pairs", &pairs_param)])
            .await
        {
            Ok(response) => self.quotes_from_response(response),
            Err(e) => {
                warn!(venue = %self.config.venue_id, error = %e, "batched rate fetch failed");
                Vec::new()
            }
        };
        Ok(self
            .last_known_good
            .merge_cycle(&self.config.venue_id, fresh)
            .await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::ManualClock;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pair(base: &str, quote: &str) -> FxPair {
        FxPair::new(base, quote).unwrap()
    }

    fn provider(server_uri: &str, pairs: Vec<FxPair>) -> BatchFxProvider {
        let config = BatchFxConfig::new("fx:bulkrates", server_uri)
            .with_pairs(pairs)
            .with_timeout(Duration::from_secs(1));
        BatchFxProvider::new(config, Arc::new(ManualClock::at(0))).unwrap()
    }

    fn row(base: &str, quote: &str, ask: f64) -> serde_json::Value {
        serde_json::json!({ "base": base, "quote": quote, "ask": ask, "bid": ask, "mid": ask })
    }

    #[tokio::test]
    async fn one_request_covers_all_pairs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates"))
            .and(query_param("pairs", "EUR/USD,USD/BRL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rates": [row("EUR", "USD", 1.08), row("USD", "BRL", 5.01)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server.uri(), vec![pair("EUR", "USD"), pair("USD", "BRL")]);
        let quotes = provider.fetch_quotes().await.unwrap();
        // Two pairs, each with a synthesised inverse.
        assert_eq!(quotes.len(), 4);
    }

    #[tokio::test]
    async fn unrequested_rows_are_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rates": [row("EUR", "USD", 1.08), row("GBP", "JPY", 190.0)]
            })))
            .mount(&server)
            .await;

        let provider = provider(&server.uri(), vec![pair("EUR", "USD")]);
        let quotes = provider.fetch_quotes().await.unwrap();
        assert!(quotes.iter().all(|q| q.from_token.as_str() != "GBP"));
    }

    #[tokio::test]
    async fn missing_pair_falls_back_to_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rates": [row("EUR", "USD", 1.09)]
            })))
            .mount(&server)
            .await;

        let provider = provider(&server.uri(), vec![pair("EUR", "USD"), pair("USD", "BRL")]);
        provider
            .seed_last_known_good(vec![
                quote_from_rate(
                    &VenueId::new("fx:bulkrates"),
                    &pair("USD", "BRL"),
                    &FxRate {
                        ask: dec!(5.0),
                        bid: dec!(5.0),
                        mid: dec!(5.0),
                    },
                    crate::domain::value_objects::Timestamp::from_millis(0),
                )
                .unwrap(),
            ])
            .await;

        let quotes = provider.fetch_quotes().await.unwrap();
        assert!(
            quotes
                .iter()
                .any(|q| q.from_token.as_str() == "USD" && q.to_token.as_str() == "BRL")
        );
        let eur_usd = quotes
            .iter()
            .find(|q| q.from_token.as_str() == "EUR")
            .unwrap();
        assert_eq!(eur_usd.amount_out.get(), dec!(1.09));
    }

    #[tokio::test]
    async fn upstream_failure_serves_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let provider = provider(&server.uri(), vec![pair("EUR", "USD")]);
        provider
            .seed_last_known_good(vec![
                quote_from_rate(
                    &VenueId::new("fx:bulkrates"),
                    &pair("EUR", "USD"),
                    &FxRate {
                        ask: dec!(1.08),
                        bid: dec!(1.08),
                        mid: dec!(1.08),
                    },
                    crate::domain::value_objects::Timestamp::from_millis(0),
                )
                .unwrap(),
            ])
            .await;

        let quotes = provider.fetch_quotes().await.unwrap();
        assert_eq!(quotes.len(), 1);
    }
}
