//! # FX Quote Construction
//!
//! Shared machinery of the HTTP FX providers: turning an ask/bid/mid rate
//! into an edge quote, synthesising the inverse edge from the same rate,
//! deriving settlement metadata from the token classes, and the
//! last-known-good merge that carries a provider through partial upstream
//! outages.

use crate::domain::entities::{EdgeQuote, SettlementMeta, VenueKind};
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::{Amount, FeeBps, PaymentMethod, Timestamp, Token, VenueId};
use crate::infrastructure::providers::{ProviderError, ProviderResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::Mutex;
use tracing::warn;

/// Validity window of an FX quote.
pub const FX_QUOTE_TTL_SECS: i64 = 60;

/// A directed currency pair an FX provider is configured for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FxPair {
    /// Base (source) token.
    pub base: Token,
    /// Quote (destination) token.
    pub quote: Token,
}

impl FxPair {
    /// Creates a pair from two symbols.
    ///
    /// # Errors
    ///
    /// Returns a domain error when either symbol fails validation.
    pub fn new(base: impl AsRef<str>, quote: impl AsRef<str>) -> DomainResult<Self> {
        Ok(Self {
            base: Token::new(base)?,
            quote: Token::new(quote)?,
        })
    }
}

impl fmt::Display for FxPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// An ask/bid/mid rate snapshot for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FxRate {
    /// Price to buy the quote token.
    pub ask: Decimal,
    /// Price to sell the quote token.
    pub bid: Decimal,
    /// Midpoint reference.
    pub mid: Decimal,
}

impl FxRate {
    /// Spread in basis points: `(ask - bid) / mid * 10000`.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive mids or inverted markets.
    pub fn spread_bps(&self) -> ProviderResult<Decimal> {
        if self.mid <= Decimal::ZERO {
            return Err(ProviderError::invalid_quote("mid must be positive"));
        }
        if self.bid > self.ask {
            return Err(ProviderError::invalid_quote("bid above ask"));
        }
        Ok((self.ask - self.bid) / self.mid * dec!(10000))
    }

    /// The same market seen from the other side: `inverse_ask = 1/bid`,
    /// `inverse_bid = 1/ask`.
    ///
    /// # Errors
    ///
    /// Returns an error when either side is non-positive.
    pub fn inverse(&self) -> ProviderResult<Self> {
        if self.ask <= Decimal::ZERO || self.bid <= Decimal::ZERO || self.mid <= Decimal::ZERO {
            return Err(ProviderError::invalid_quote(
                "cannot invert a non-positive rate",
            ));
        }
        Ok(Self {
            ask: Decimal::ONE / self.bid,
            bid: Decimal::ONE / self.ask,
            mid: Decimal::ONE / self.mid,
        })
    }
}

/// Settlement metadata an FX quote carries, derived from token classes.
///
/// Stablecoin legs settle in half a day at minimal counterparty risk;
/// BRL/MXN/NGN legs take a full day on local rails; everything else sits
/// in between.
#[must_use]
pub fn settlement_meta_for(from: &Token, to: &Token) -> SettlementMeta {
    let (days, risk) = if from.is_stablecoin() || to.is_stablecoin() {
        (dec!(0.5), dec!(0.0001))
    } else if from.is_slow_rail_fiat() || to.is_slow_rail_fiat() {
        (dec!(1), dec!(0.001))
    } else {
        (dec!(0.5), dec!(0.0005))
    };
    SettlementMeta {
        settlement_days: days,
        counterparty_risk: risk,
        supports_reservation: false,
        payment_methods: vec![PaymentMethod::BankTransfer],
    }
}

/// Builds the edge quote for a pair from its rate snapshot.
///
/// `amount_in = 1`, `amount_out = ask`, `fee_bps = round(spread / 2)`,
/// expiry 60 s out.
///
/// # Errors
///
/// Returns a provider error when the rate is unusable.
pub fn quote_from_rate(
    venue_id: &VenueId,
    pair: &FxPair,
    rate: &FxRate,
    now: Timestamp,
) -> ProviderResult<EdgeQuote> {
    if rate.ask <= Decimal::ZERO {
        return Err(ProviderError::invalid_quote("ask must be positive"));
    }
    let half_spread = rate.spread_bps()? / dec!(2);
    let fee = FeeBps::from_rounded(half_spread)
        .map_err(|e| ProviderError::invalid_quote(e.to_string()))?;
    let amount_out = Amount::from_decimal(rate.ask)
        .map_err(|e| ProviderError::invalid_quote(e.to_string()))?;

    let built: DomainResult<EdgeQuote> = (|| {
        EdgeQuote::builder(
            venue_id.clone(),
            VenueKind::Fx,
            pair.base.as_str(),
            pair.quote.as_str(),
        )?
        .amounts(Amount::ONE, amount_out)
        .fee_bps(fee.get())?
        .timestamps(now, now.add_secs(FX_QUOTE_TTL_SECS))
        .settlement(settlement_meta_for(&pair.base, &pair.quote))
        .build()
    })();
    built.map_err(|e| ProviderError::invalid_quote(e.to_string()))
}

/// Synthesises the inverse edge for a pair from the same rate snapshot.
///
/// # Errors
///
/// Returns a provider error when the rate cannot be inverted.
pub fn synthesize_inverse(
    venue_id: &VenueId,
    pair: &FxPair,
    rate: &FxRate,
    now: Timestamp,
) -> ProviderResult<EdgeQuote> {
    let inverse_pair = FxPair {
        base: pair.quote.clone(),
        quote: pair.base.clone(),
    };
    let inverse_rate = rate.inverse()?;
    quote_from_rate(venue_id, &inverse_pair, &inverse_rate, now)
}

/// Process-local cache of the most recent successful quotes per pair.
///
/// After a fetch cycle the provider merges freshly fetched pairs over
/// this cache, so pairs that failed this cycle degrade to their previous
/// snapshot. A total failure with a non-empty cache returns the cache
/// with a warning; with an empty cache it returns the empty snapshot.
///
/// Single-writer: only the provider's fetch loop mutates it.
#[derive(Debug, Default)]
pub struct LastKnownGood {
    quotes: Mutex<HashMap<(Token, Token), EdgeQuote>>,
}

impl LastKnownGood {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the cache, for tests and warm restarts.
    pub async fn seed(&self, quotes: Vec<EdgeQuote>) {
        let mut cached = self.quotes.lock().await;
        for quote in quotes {
            cached.insert((quote.from_token.clone(), quote.to_token.clone()), quote);
        }
    }

    /// Number of cached pairs.
    pub async fn len(&self) -> usize {
        self.quotes.lock().await.len()
    }

    /// Returns true when nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.quotes.lock().await.is_empty()
    }

    /// Merges a cycle's fresh quotes over the cache and returns the full
    /// merged snapshot.
    ///
    /// `venue_id` only labels the warning on a total failure.
    pub async fn merge_cycle(&self, venue_id: &VenueId, fresh: Vec<EdgeQuote>) -> Vec<EdgeQuote> {
        let mut cached = self.quotes.lock().await;
        if fresh.is_empty() {
            if cached.is_empty() {
                return Vec::new();
            }
            warn!(
                venue = %venue_id,
                pairs = cached.len(),
                "fetch cycle produced nothing, serving last-known-good snapshot"
            );
            return cached.values().cloned().collect();
        }
        for quote in fresh {
            cached.insert((quote.from_token.clone(), quote.to_token.clone()), quote);
        }
        cached.values().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Amount;

    fn pair(base: &str, quote: &str) -> FxPair {
        FxPair::new(base, quote).unwrap()
    }

    fn rate(ask: &str, bid: &str, mid: &str) -> FxRate {
        FxRate {
            ask: ask.parse().unwrap(),
            bid: bid.parse().unwrap(),
            mid: mid.parse().unwrap(),
        }
    }

    mod spread {
        use super::*;

        #[test]
        fn spread_bps_formula() {
            // (1.002 - 0.998) / 1.0 * 10000 = 40 bps
            let r = rate("1.002", "0.998", "1.0");
            assert_eq!(r.spread_bps().unwrap(), dec!(40));
        }

        #[test]
        fn inverted_market_rejected() {
            let r = rate("0.99", "1.01", "1.0");
            assert!(r.spread_bps().is_err());
        }

        #[test]
        fn zero_mid_rejected() {
            let r = rate("1.0", "1.0", "0");
            assert!(r.spread_bps().is_err());
        }
    }

    mod quote_construction {
        use super::*;

        #[test]
        fn unit_sized_quote_with_half_spread_fee() {
            let venue = VenueId::new("fx:openrates");
            let q = quote_from_rate(
                &venue,
                &pair("EUR", "USD"),
                &rate("1.002", "0.998", "1.0"),
                Timestamp::from_millis(0),
            )
            .unwrap();

            assert_eq!(q.amount_in, Amount::ONE);
            assert_eq!(q.amount_out.get(), dec!(1.002));
            // half of 40 bps
            assert_eq!(q.fee_bps.unwrap().get(), 20);
            assert_eq!(q.expiry_ts.millis(), 60_000);
            assert_eq!(q.venue_kind, VenueKind::Fx);
            assert!(q.settlement.is_some());
        }

        #[test]
        fn fee_rounds_to_nearest_bp() {
            // spread = 25 bps, half = 12.5 -> rounds to 13
            let q = quote_from_rate(
                &VenueId::new("fx:x"),
                &pair("EUR", "USD"),
                &rate("1.00125", "0.99875", "1.0"),
                Timestamp::from_millis(0),
            )
            .unwrap();
            assert_eq!(q.fee_bps.unwrap().get(), 13);
        }
    }

    mod inverse_synthesis {
        use super::*;

        #[test]
        fn inverse_swaps_and_reciprocates() {
            let venue = VenueId::new("fx:x");
            let p = pair("EUR", "USD");
            let r = rate("1.25", "1.25", "1.25");
            let inv = synthesize_inverse(&venue, &p, &r, Timestamp::from_millis(0)).unwrap();

            assert_eq!(inv.from_token.as_str(), "USD");
            assert_eq!(inv.to_token.as_str(), "EUR");
            assert_eq!(inv.amount_out.get(), dec!(0.8));
            assert_eq!(inv.fee_bps.unwrap().get(), 0);
        }

        #[test]
        fn inverse_round_trips_within_tolerance() {
            let r = rate("1.0832", "1.0828", "1.0830");
            let inv = r.inverse().unwrap();
            let back = inv.inverse().unwrap();
            let ask_drift = (back.ask - r.ask).abs();
            let bid_drift = (back.bid - r.bid).abs();
            assert!(ask_drift < dec!(0.0000001), "ask drift {ask_drift}");
            assert!(bid_drift < dec!(0.0000001), "bid drift {bid_drift}");
        }

        #[test]
        fn zero_rate_cannot_invert() {
            assert!(rate("0", "0", "0").inverse().is_err());
        }
    }

    mod settlement_rule {
        use super::*;

        fn token(s: &str) -> Token {
            Token::new(s).unwrap()
        }

        #[test]
        fn stablecoin_leg_is_fast_and_safe() {
            let meta = settlement_meta_for(&token("BRL"), &token("USDC"));
            assert_eq!(meta.settlement_days, dec!(0.5));
            assert_eq!(meta.counterparty_risk, dec!(0.0001));
        }

        #[test]
        fn slow_rail_fiat_leg_takes_a_day() {
            let meta = settlement_meta_for(&token("BRL"), &token("EUR"));
            assert_eq!(meta.settlement_days, dec!(1));
            assert_eq!(meta.counterparty_risk, dec!(0.001));
        }

        #[test]
        fn other_fiat_sits_between() {
            let meta = settlement_meta_for(&token("USD"), &token("EUR"));
            assert_eq!(meta.settlement_days, dec!(0.5));
            assert_eq!(meta.counterparty_risk, dec!(0.0005));
        }
    }

    mod last_known_good {
        use super::*;

        fn fx_quote(from: &str, to: &str, ask: &str) -> EdgeQuote {
            quote_from_rate(
                &VenueId::new("fx:x"),
                &pair(from, to),
                &rate(ask, ask, ask),
                Timestamp::from_millis(0),
            )
            .unwrap()
        }

        #[tokio::test]
        async fn fresh_pairs_merge_over_cached() {
            let lkg = LastKnownGood::new();
            lkg.seed(vec![
                fx_quote("EUR", "USD", "1.08"),
                fx_quote("USD", "BRL", "5.01"),
                fx_quote("USD", "MXN", "17.1"),
            ])
            .await;

            let merged = lkg
                .merge_cycle(&VenueId::new("fx:x"), vec![fx_quote("EUR", "USD", "1.09")])
                .await;

            assert_eq!(merged.len(), 3);
            let eur_usd = merged
                .iter()
                .find(|q| q.from_token.as_str() == "EUR")
                .unwrap();
            assert_eq!(eur_usd.amount_out.get(), dec!(1.09));
        }

        #[tokio::test]
        async fn total_failure_with_cache_serves_cache() {
            let lkg = LastKnownGood::new();
            lkg.seed(vec![fx_quote("EUR", "USD", "1.08")]).await;
            let merged = lkg.merge_cycle(&VenueId::new("fx:x"), vec![]).await;
            assert_eq!(merged.len(), 1);
        }

        #[tokio::test]
        async fn total_failure_with_empty_cache_is_empty() {
            let lkg = LastKnownGood::new();
            let merged = lkg.merge_cycle(&VenueId::new("fx:x"), vec![]).await;
            assert!(merged.is_empty());
        }
    }
}
