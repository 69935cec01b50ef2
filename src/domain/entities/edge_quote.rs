//! # Edge Quote Entity
//!
//! A unit of pricing information from one venue for one directed token
//! pair.
//!
//! Edge quotes are produced by providers, written to the edge cache with a
//! TTL bounded by their expiry, and consumed by the router as the edges of
//! the implicit routing graph.
//!
//! # Invariants
//!
//! - `amount_in > 0` and `amount_out > 0`
//! - `expiry_ts > last_updated_ts`
//! - `fee_bps`, when present, lies in `[0, 10000]` (enforced by [`FeeBps`])
//!
//! # Examples
//!
//! ```
//! use corridor::domain::entities::{EdgeQuote, VenueKind};
//! use corridor::domain::value_objects::{Amount, Timestamp};
//!
//! let quote = EdgeQuote::builder("otc:transfero", VenueKind::Otc, "BRL", "USDC")
//!     .unwrap()
//!     .amounts(Amount::new(10_000.0).unwrap(), Amount::new(2_000.0).unwrap())
//!     .fee_bps(40)
//!     .unwrap()
//!     .timestamps(Timestamp::from_millis(0), Timestamp::from_millis(30_000))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(quote.rate().unwrap().to_string(), "0.2");
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Amount, FeeBps, PaymentMethod, Timestamp, Token, VenueId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kind of venue an edge quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VenueKind {
    /// Over-the-counter desk quoting fiat/stablecoin conversions.
    Otc,
    /// On-chain decentralized exchange.
    Dex,
    /// Real-time FX rate feed.
    Fx,
}

/// Settlement characteristics attached to OTC and FX quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementMeta {
    /// Expected delay in days between commitment and delivery.
    pub settlement_days: Decimal,
    /// Probability-weighted counterparty default discount, in `[0, 1]`.
    pub counterparty_risk: Decimal,
    /// Whether the venue supports reserving this quote.
    pub supports_reservation: bool,
    /// Payment methods the venue accepts for the deposit leg.
    pub payment_methods: Vec<PaymentMethod>,
}

impl SettlementMeta {
    /// Creates settlement metadata.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuote` if `counterparty_risk` is
    /// outside `[0, 1]` or `settlement_days` is negative.
    pub fn new(
        settlement_days: Decimal,
        counterparty_risk: Decimal,
        supports_reservation: bool,
        payment_methods: Vec<PaymentMethod>,
    ) -> DomainResult<Self> {
        if settlement_days.is_sign_negative() {
            return Err(DomainError::invalid_quote("settlementDays cannot be negative"));
        }
        if counterparty_risk.is_sign_negative() || counterparty_risk > Decimal::ONE {
            return Err(DomainError::invalid_quote(
                "counterpartyRisk must lie in [0, 1]",
            ));
        }
        Ok(Self {
            settlement_days,
            counterparty_risk,
            supports_reservation,
            payment_methods,
        })
    }
}

/// A per-venue price quote for one directed token pair.
///
/// The `(amount_in, amount_out)` pair fixes a reference size and its
/// output; the derived rate reprices other sizes linearly, subject to
/// `max_amount_in`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeQuote {
    /// The quoting venue.
    pub venue_id: VenueId,
    /// The kind of venue.
    pub venue_kind: VenueKind,
    /// Source token of the directed edge.
    pub from_token: Token,
    /// Destination token of the directed edge.
    pub to_token: Token,
    /// Reference input size.
    pub amount_in: Amount,
    /// Output at the reference input size.
    pub amount_out: Amount,
    /// Largest input the venue accepts, when bounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount_in: Option<Amount>,
    /// Venue fee, deducted from the gross output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_bps: Option<FeeBps>,
    /// Instant after which the quote is dead.
    pub expiry_ts: Timestamp,
    /// Instant the venue last refreshed this price.
    pub last_updated_ts: Timestamp,
    /// On-chain deposit address, for venues that settle on-chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_address: Option<String>,
    /// Settlement characteristics, absent on pure DEX quotes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementMeta>,
}

impl EdgeQuote {
    /// Starts building an edge quote.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidToken` if either symbol fails
    /// validation.
    pub fn builder(
        venue_id: impl Into<VenueId>,
        venue_kind: VenueKind,
        from_token: impl AsRef<str>,
        to_token: impl AsRef<str>,
    ) -> DomainResult<EdgeQuoteBuilder> {
        Ok(EdgeQuoteBuilder {
            venue_id: venue_id.into(),
            venue_kind,
            from_token: Token::new(from_token)?,
            to_token: Token::new(to_token)?,
            amount_in: Amount::ZERO,
            amount_out: Amount::ZERO,
            max_amount_in: None,
            fee_bps: None,
            expiry_ts: Timestamp::default(),
            last_updated_ts: Timestamp::default(),
            deposit_address: None,
            settlement: None,
        })
    }

    /// Returns the derived rate `amount_out / amount_in`.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error when `amount_in` is zero, which a
    /// validated quote never has.
    pub fn rate(&self) -> DomainResult<Decimal> {
        Ok(self.amount_out.ratio_to(self.amount_in)?)
    }

    /// Computes the net output for `input` through this quote:
    /// `input * rate`, minus the fee when one is present.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error on overflow or a zero reference size.
    pub fn output_for(&self, input: Amount) -> DomainResult<Amount> {
        let gross = input.safe_mul(self.rate()?)?;
        match self.fee_bps {
            Some(fee) => Ok(fee.apply(gross)?),
            None => Ok(gross),
        }
    }

    /// Returns true if the quote is live at `now` with at least
    /// `min_expiry_ms` of validity left.
    #[must_use]
    pub fn is_live(&self, now: Timestamp, min_expiry_ms: i64) -> bool {
        self.expiry_ts > now.add_millis(min_expiry_ms)
    }

    /// Returns true if `input` fits under the venue's `max_amount_in`.
    #[must_use]
    pub fn accepts(&self, input: Amount) -> bool {
        self.max_amount_in.is_none_or(|max| input <= max)
    }
}

/// Builder for [`EdgeQuote`] with validation at `build`.
#[derive(Debug, Clone)]
pub struct EdgeQuoteBuilder {
    venue_id: VenueId,
    venue_kind: VenueKind,
    from_token: Token,
    to_token: Token,
    amount_in: Amount,
    amount_out: Amount,
    max_amount_in: Option<Amount>,
    fee_bps: Option<FeeBps>,
    expiry_ts: Timestamp,
    last_updated_ts: Timestamp,
    deposit_address: Option<String>,
    settlement: Option<SettlementMeta>,
}

impl EdgeQuoteBuilder {
    /// Sets the reference input size and its output.
    #[must_use]
    pub fn amounts(mut self, amount_in: Amount, amount_out: Amount) -> Self {
        self.amount_in = amount_in;
        self.amount_out = amount_out;
        self
    }

    /// Sets the largest input the venue accepts.
    #[must_use]
    pub fn max_amount_in(mut self, max: Amount) -> Self {
        self.max_amount_in = Some(max);
        self
    }

    /// Sets the venue fee in basis points.
    ///
    /// # Errors
    ///
    /// Returns an error if `bps > 10000`.
    pub fn fee_bps(mut self, bps: u32) -> DomainResult<Self> {
        self.fee_bps = Some(FeeBps::new(bps)?);
        Ok(self)
    }

    /// Sets the last-updated and expiry instants.
    #[must_use]
    pub fn timestamps(mut self, last_updated: Timestamp, expiry: Timestamp) -> Self {
        self.last_updated_ts = last_updated;
        self.expiry_ts = expiry;
        self
    }

    /// Sets the on-chain deposit address.
    #[must_use]
    pub fn deposit_address(mut self, address: impl Into<String>) -> Self {
        self.deposit_address = Some(address.into());
        self
    }

    /// Attaches settlement metadata.
    #[must_use]
    pub fn settlement(mut self, settlement: SettlementMeta) -> Self {
        self.settlement = Some(settlement);
        self
    }

    /// Validates and builds the quote.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuote` when an invariant fails.
    pub fn build(self) -> DomainResult<EdgeQuote> {
        if !self.amount_in.is_positive() {
            return Err(DomainError::invalid_quote("amountIn must be positive"));
        }
        if !self.amount_out.is_positive() {
            return Err(DomainError::invalid_quote("amountOut must be positive"));
        }
        if self.expiry_ts <= self.last_updated_ts {
            return Err(DomainError::invalid_quote(
                "expiryTs must be after lastUpdatedTs",
            ));
        }
        Ok(EdgeQuote {
            venue_id: self.venue_id,
            venue_kind: self.venue_kind,
            from_token: self.from_token,
            to_token: self.to_token,
            amount_in: self.amount_in,
            amount_out: self.amount_out,
            max_amount_in: self.max_amount_in,
            fee_bps: self.fee_bps,
            expiry_ts: self.expiry_ts,
            last_updated_ts: self.last_updated_ts,
            deposit_address: self.deposit_address,
            settlement: self.settlement,
        })
    }
}
