//! # Route Entity
//!
//! An ordered list of 1-3 hops converting a source token into a
//! destination token.
//!
//! # Invariants
//!
//! - `steps[0].from_token` is the route's source
//! - `steps[last].to_token` is the route's destination
//! - every adjacent pair chains: `steps[i].to_token == steps[i+1].from_token`
//!   and `steps[i+1].amount_in == steps[i].amount_out`

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Amount, FeeBps, Timestamp, Token, VenueId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Chain id assigned to steps executed on a DEX.
pub const DEX_CHAIN_ID: u64 = 101;

/// Estimated duration of a DEX step in milliseconds.
pub const DEX_STEP_DURATION_MS: u64 = 30_000;

/// One hop of a route through a single venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    /// Source token of this hop.
    pub from_token: Token,
    /// Destination token of this hop.
    pub to_token: Token,
    /// The venue executing the hop.
    pub venue_id: VenueId,
    /// Chain the hop settles on; 0 for off-chain venues.
    pub chain_id: u64,
    /// Amount entering the hop.
    pub amount_in: Amount,
    /// Net amount leaving the hop, after the venue fee.
    pub amount_out: Amount,
    /// The venue fee applied within the hop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_bps: Option<FeeBps>,
    /// Estimated hop duration in milliseconds.
    pub estimated_duration_ms: u64,
}

impl RouteStep {
    /// Creates a step, deriving `chain_id` and `estimated_duration_ms`
    /// from the venue id (`dex:` venues settle on-chain).
    #[must_use]
    pub fn new(
        from_token: Token,
        to_token: Token,
        venue_id: VenueId,
        amount_in: Amount,
        amount_out: Amount,
        fee_bps: Option<FeeBps>,
    ) -> Self {
        let (chain_id, estimated_duration_ms) = if venue_id.is_dex() {
            (DEX_CHAIN_ID, DEX_STEP_DURATION_MS)
        } else {
            (0, 0)
        };
        Self {
            from_token,
            to_token,
            venue_id,
            chain_id,
            amount_in,
            amount_out,
            fee_bps,
            estimated_duration_ms,
        }
    }
}

/// A complete conversion path with its aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// The ordered hops, 1 to 3 of them.
    pub steps: Vec<RouteStep>,
    /// Amount entering the first hop.
    pub total_in: Amount,
    /// Net amount leaving the last hop.
    pub total_out: Amount,
    /// `total_out / total_in`.
    pub effective_rate: Decimal,
    /// Sum of step fees. A telemetry lower bound, never re-applied to
    /// output.
    pub total_fees_bps: FeeBps,
    /// Construction instant.
    pub timestamp: Timestamp,
}

impl Route {
    /// Maximum number of hops in a route.
    pub const MAX_HOPS: usize = 3;

    /// Validates the chaining invariants and builds the route with its
    /// aggregates.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRoute` when the step list is empty,
    /// too long, or breaks token/amount chaining.
    pub fn from_steps(steps: Vec<RouteStep>, timestamp: Timestamp) -> DomainResult<Self> {
        if steps.is_empty() {
            return Err(DomainError::invalid_route("route has no steps"));
        }
        if steps.len() > Self::MAX_HOPS {
            return Err(DomainError::invalid_route(format!(
                "route has {} steps, maximum is {}",
                steps.len(),
                Self::MAX_HOPS
            )));
        }
        for pair in steps.windows(2) {
            if pair[0].to_token != pair[1].from_token {
                return Err(DomainError::invalid_route(format!(
                    "step tokens do not chain: {} -> {}",
                    pair[0].to_token, pair[1].from_token
                )));
            }
            if pair[0].amount_out != pair[1].amount_in {
                return Err(DomainError::invalid_route(format!(
                    "step amounts do not chain: {} -> {}",
                    pair[0].amount_out, pair[1].amount_in
                )));
            }
        }

        let total_in = steps[0].amount_in;
        let total_out = steps[steps.len() - 1].amount_out;
        let effective_rate = total_out.ratio_to(total_in)?;
        let total_fees_bps = steps
            .iter()
            .filter_map(|s| s.fee_bps)
            .fold(FeeBps::ZERO, FeeBps::saturating_add);

        Ok(Self {
            steps,
            total_in,
            total_out,
            effective_rate,
            total_fees_bps,
            timestamp,
        })
    }

    /// Source token of the route.
    #[must_use]
    pub fn from_token(&self) -> &Token {
        &self.steps[0].from_token
    }

    /// Destination token of the route.
    #[must_use]
    pub fn to_token(&self) -> &Token {
        &self.steps[self.steps.len() - 1].to_token
    }

    /// Number of hops.
    #[must_use]
    pub fn hop_count(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if any hop executes on a DEX.
    #[must_use]
    pub fn has_dex_step(&self) -> bool {
        self.steps.iter().any(|s| s.venue_id.is_dex())
    }

    /// Returns true if any hop executes off-chain (OTC or FX venue).
    #[must_use]
    pub fn has_otc_step(&self) -> bool {
        self.steps.iter().any(|s| !s.venue_id.is_dex())
    }
}
