//! # Quote Lifecycle Entities
//!
//! The two pre-execution states of a priced route.
//!
//! A [`ProvisionalQuote`] is a scored route made addressable for a short
//! window (15 s). A [`ReservedQuote`] is a provisional promoted by client
//! intent (300 s), which becomes the source of truth for deposit and
//! execution. Both live in the key-value store under `quote:prov:{id}` and
//! `quote:reserved:{id}`; the reserved record wins when both exist.

use crate::domain::entities::Route;
use crate::domain::value_objects::{
    Amount, ClientId, FeeBps, QuoteId, ReservationId, Timestamp, Token,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default provisional quote time-to-live.
pub const PROVISIONAL_TTL_SECS: i64 = 15;

/// Default reservation time-to-live.
pub const RESERVATION_TTL_SECS: i64 = 300;

/// Venue composition of a quoted route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteKind {
    /// All hops through OTC or FX venues.
    #[serde(rename = "OTC")]
    Otc,
    /// All hops through DEXes.
    #[serde(rename = "DEX")]
    Dex,
    /// Mixed off-chain and on-chain hops.
    #[serde(rename = "OTC+DEX")]
    OtcDex,
}

impl QuoteKind {
    /// Classifies a route by its venue composition.
    #[must_use]
    pub fn of(route: &Route) -> Self {
        match (route.has_otc_step(), route.has_dex_step()) {
            (true, true) => Self::OtcDex,
            (false, true) => Self::Dex,
            _ => Self::Otc,
        }
    }

    /// Returns true when the quote involves an OTC leg, which requires a
    /// desk-side reservation.
    #[must_use]
    pub const fn involves_otc(self) -> bool {
        matches!(self, Self::Otc | Self::OtcDex)
    }
}

/// Scoring metadata attached to a quote by the settlement scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringMeta {
    /// Worst-case settlement delay across the route's quotes, in days.
    pub settlement_days: Decimal,
    /// Mean counterparty risk across the route's quotes.
    pub counterparty_risk: Decimal,
    /// Absolute output discount for settlement-delay FX exposure.
    pub time_penalty: Amount,
    /// Scorer confidence in `[0.5, 1.0]`.
    pub confidence: Decimal,
}

/// A scored route, addressable until its short TTL lapses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionalQuote {
    /// Opaque quote identifier.
    pub quote_id: QuoteId,
    /// The priced route; `None` models an explicit no-route answer.
    pub route: Option<Route>,
    /// Second-best route, carried as the execution fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_route: Option<Route>,
    /// Requested source token.
    pub from_token: Token,
    /// Requested destination token.
    pub to_token: Token,
    /// Requested input amount.
    pub amount_in: Amount,
    /// Gross route output before scoring discounts.
    pub amount_out: Amount,
    /// Output net of time penalty and counterparty discount.
    pub net_amount_out: Amount,
    /// Sum of step fees.
    pub fee_bps: FeeBps,
    /// Instant after which the quote is gone.
    pub expiry_ts: Timestamp,
    /// Creation instant.
    pub created_ts: Timestamp,
    /// Venue composition.
    pub kind: QuoteKind,
    /// Scorer output.
    pub scoring: ScoringMeta,
}

impl ProvisionalQuote {
    /// Returns true once `now` has passed the quote's expiry.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expiry_ts
    }
}

/// Desk-side reservation details for OTC legs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtcReservationMeta {
    /// Reservation id issued by the desk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otc_reservation_id: Option<String>,
    /// Deposit address issued by the desk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_address: Option<String>,
    /// Free-form instructions from the desk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_instructions: Option<String>,
}

/// A provisional quote promoted by a client's intent to execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservedQuote {
    /// The underlying quote, as priced at reservation time.
    #[serde(flatten)]
    pub quote: ProvisionalQuote,
    /// Reservation identifier.
    pub reservation_id: ReservationId,
    /// The reserving client.
    pub reserved_by: ClientId,
    /// Instant the reservation lapses.
    pub reserved_until_ts: Timestamp,
    /// Desk-side reservation details for OTC legs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otc: Option<OtcReservationMeta>,
}

impl ReservedQuote {
    /// Promotes a provisional quote into a reservation.
    #[must_use]
    pub fn promote(
        quote: ProvisionalQuote,
        client: ClientId,
        now: Timestamp,
        otc: Option<OtcReservationMeta>,
    ) -> Self {
        Self {
            quote,
            reservation_id: ReservationId::new_v4(),
            reserved_by: client,
            reserved_until_ts: now.add_secs(RESERVATION_TTL_SECS),
            otc,
        }
    }

    /// Returns true once `now` has passed the reservation window.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.reserved_until_ts
    }
}
