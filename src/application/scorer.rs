//! # Settlement Scorer
//!
//! Transforms a candidate route's gross output into a net output by
//! discounting for settlement-delay FX exposure and counterparty risk.
//!
//! The time penalty scales with the square root of the settlement delay
//! (Brownian-motion-style growth of exposure over a holding period):
//! `gross * daily_vol * sqrt(days) * risk_factor`. The counterparty
//! discount is a straight fraction of gross. Both tables are injected
//! configuration, not code.

use crate::domain::entities::{EdgeQuote, ScoringMeta, VenueKind};
use crate::domain::value_objects::{Amount, Token};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fallback daily volatility for pairs missing from the table.
pub const DEFAULT_DAILY_VOL: Decimal = dec!(0.005);

/// Fallback counterparty risk for quotes and venues without one.
pub const DEFAULT_COUNTERPARTY_RISK: Decimal = dec!(0.001);

/// Injectable scoring tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Daily volatility per `FROM/TO` pair code.
    #[serde(default)]
    pub volatility: HashMap<String, Decimal>,
    /// Daily volatility for unrecognized pairs.
    #[serde(default = "default_daily_vol")]
    pub default_daily_vol: Decimal,
    /// Counterparty risk per venue id, used when a quote carries none.
    #[serde(default)]
    pub venue_counterparty_risk: HashMap<String, Decimal>,
    /// Counterparty risk of last resort.
    #[serde(default = "default_counterparty_risk")]
    pub default_counterparty_risk: Decimal,
    /// Multiplier on the time penalty.
    #[serde(default = "default_risk_factor")]
    pub risk_factor: Decimal,
}

fn default_daily_vol() -> Decimal {
    DEFAULT_DAILY_VOL
}

fn default_counterparty_risk() -> Decimal {
    DEFAULT_COUNTERPARTY_RISK
}

fn default_risk_factor() -> Decimal {
    Decimal::ONE
}

impl Default for ScoringConfig {
    fn default() -> Self {
        // The corridors the platform actually trades; everything else
        // falls back to default_daily_vol.
        let volatility = [
            ("BRL/USDC", dec!(0.012)),
            ("USDC/BRL", dec!(0.012)),
            ("BRL/EUR", dec!(0.011)),
            ("EUR/BRL", dec!(0.011)),
            ("MXN/USDC", dec!(0.009)),
            ("USDC/MXN", dec!(0.009)),
            ("NGN/USDT", dec!(0.025)),
            ("USDT/NGN", dec!(0.025)),
            ("EUR/USDC", dec!(0.004)),
            ("USDC/EUR", dec!(0.004)),
            ("EUR/USD", dec!(0.004)),
            ("USD/EUR", dec!(0.004)),
            ("USDC/EURC", dec!(0.001)),
            ("EURC/EUR", dec!(0.0005)),
        ]
        .into_iter()
        .map(|(pair, vol)| (pair.to_string(), vol))
        .collect();

        Self {
            volatility,
            default_daily_vol: default_daily_vol(),
            venue_counterparty_risk: HashMap::new(),
            default_counterparty_risk: default_counterparty_risk(),
            risk_factor: default_risk_factor(),
        }
    }
}

impl ScoringConfig {
    /// Daily volatility for a pair.
    #[must_use]
    pub fn daily_vol(&self, from: &Token, to: &Token) -> Decimal {
        self.volatility
            .get(&from.pair_code(to))
            .copied()
            .unwrap_or(self.default_daily_vol)
    }

    fn risk_for(&self, quote: &EdgeQuote) -> Decimal {
        if let Some(settlement) = &quote.settlement {
            return settlement.counterparty_risk;
        }
        self.venue_counterparty_risk
            .get(quote.venue_id.as_str())
            .copied()
            .unwrap_or(self.default_counterparty_risk)
    }
}

/// A scored output with its metadata record.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredOutput {
    /// `max(0, gross - time_penalty - counterparty_discount)`.
    pub net_output: Amount,
    /// The inputs and penalty behind the net figure.
    pub meta: ScoringMeta,
}

/// Settlement-aware route scorer.
#[derive(Debug, Clone, Default)]
pub struct SettlementScorer {
    config: ScoringConfig,
}

impl SettlementScorer {
    /// Creates a scorer over the given tables.
    #[must_use]
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Scores a gross output against the off-chain quotes participating
    /// in the route.
    ///
    /// DEX hops settle atomically and contribute neither settlement delay
    /// nor counterparty exposure; only OTC and FX quotes enter the
    /// penalty terms.
    #[must_use]
    pub fn score(
        &self,
        gross_output: Amount,
        from: &Token,
        to: &Token,
        route_quotes: &[EdgeQuote],
    ) -> ScoredOutput {
        let off_chain: Vec<&EdgeQuote> = route_quotes
            .iter()
            .filter(|q| q.venue_kind != VenueKind::Dex)
            .collect();

        let settlement_days = off_chain
            .iter()
            .map(|q| {
                q.settlement
                    .as_ref()
                    .map_or(Decimal::ZERO, |s| s.settlement_days)
            })
            .max()
            .unwrap_or(Decimal::ZERO);

        let avg_counterparty_risk = if off_chain.is_empty() {
            self.config.default_counterparty_risk
        } else {
            let sum: Decimal = off_chain.iter().map(|q| self.config.risk_for(q)).sum();
            sum / Decimal::from(off_chain.len())
        };

        let daily_vol = self.config.daily_vol(from, to);
        let sqrt_days = settlement_days.sqrt().unwrap_or(Decimal::ZERO);
        let penalty_fraction = daily_vol * sqrt_days * self.config.risk_factor;

        let time_penalty = gross_output
            .safe_mul(penalty_fraction)
            .unwrap_or(Amount::ZERO);
        let counterparty_discount = gross_output
            .safe_mul(avg_counterparty_risk)
            .unwrap_or(Amount::ZERO);

        let net_output = gross_output
            .saturating_sub(time_penalty)
            .saturating_sub(counterparty_discount);

        let confidence = (Decimal::ONE
            - settlement_days * dec!(0.1)
            - avg_counterparty_risk * dec!(10))
        .clamp(dec!(0.5), Decimal::ONE);

        ScoredOutput {
            net_output,
            meta: ScoringMeta {
                settlement_days,
                counterparty_risk: avg_counterparty_risk,
                time_penalty,
                confidence,
            },
        }
    }
}
