//! # Static Book Provider
//!
//! Hand-curated snapshot of OTC and DEX quotes.
//!
//! Serves two roles: the in-process liquidity book for venues quoted out
//! of band (desk spreadsheets, negotiated corridors), and a deterministic
//! quote source for development and tests. OTC entries get a 30 s expiry
//! per snapshot, DEX entries 5 s, matching how quickly each side of the
//! market goes stale.

use crate::domain::entities::{EdgeQuote, SettlementMeta, VenueKind};
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::{Amount, PaymentMethod, Timestamp, VenueId};
use crate::infrastructure::clock::Clock;
use crate::infrastructure::providers::{ProviderResult, ProviderTier, QuoteProvider};
use rust_decimal_macros::dec;
use std::fmt;
use std::sync::Arc;

/// Expiry window stamped on OTC entries.
pub const OTC_ENTRY_TTL_SECS: i64 = 30;

/// Expiry window stamped on DEX entries.
pub const DEX_ENTRY_TTL_SECS: i64 = 5;

/// One configured entry of the static book.
#[derive(Debug, Clone)]
pub struct BookEntry {
    venue_id: VenueId,
    venue_kind: VenueKind,
    from_token: String,
    to_token: String,
    amount_in: Amount,
    amount_out: Amount,
    fee_bps: Option<u32>,
    max_amount_in: Option<Amount>,
    settlement: Option<SettlementMeta>,
    deposit_address: Option<String>,
}

impl BookEntry {
    /// Creates an OTC entry.
    #[must_use]
    pub fn otc(
        venue_id: impl Into<VenueId>,
        from_token: impl Into<String>,
        to_token: impl Into<String>,
        amount_in: Amount,
        amount_out: Amount,
    ) -> Self {
        Self {
            venue_id: venue_id.into(),
            venue_kind: VenueKind::Otc,
            from_token: from_token.into(),
            to_token: to_token.into(),
            amount_in,
            amount_out,
            fee_bps: None,
            max_amount_in: None,
            settlement: None,
            deposit_address: None,
        }
    }

    /// Creates a DEX entry.
    #[must_use]
    pub fn dex(
        venue_id: impl Into<VenueId>,
        from_token: impl Into<String>,
        to_token: impl Into<String>,
        amount_in: Amount,
        amount_out: Amount,
    ) -> Self {
        Self {
            venue_id: venue_id.into(),
            venue_kind: VenueKind::Dex,
            from_token: from_token.into(),
            to_token: to_token.into(),
            amount_in,
            amount_out,
            fee_bps: None,
            max_amount_in: None,
            settlement: None,
            deposit_address: None,
        }
    }

    /// Sets the venue fee.
    #[must_use]
    pub fn with_fee_bps(mut self, bps: u32) -> Self {
        self.fee_bps = Some(bps);
        self
    }

    /// Sets the acceptance cap.
    #[must_use]
    pub fn with_max_amount_in(mut self, max: Amount) -> Self {
        self.max_amount_in = Some(max);
        self
    }

    /// Attaches settlement metadata.
    #[must_use]
    pub fn with_settlement(mut self, settlement: SettlementMeta) -> Self {
        self.settlement = Some(settlement);
        self
    }

    /// Sets the on-chain deposit address.
    #[must_use]
    pub fn with_deposit_address(mut self, address: impl Into<String>) -> Self {
        self.deposit_address = Some(address.into());
        self
    }

    fn ttl_secs(&self) -> i64 {
        match self.venue_kind {
            VenueKind::Dex => DEX_ENTRY_TTL_SECS,
            VenueKind::Otc | VenueKind::Fx => OTC_ENTRY_TTL_SECS,
        }
    }

    fn to_quote(&self, now: Timestamp) -> DomainResult<EdgeQuote> {
        let mut builder = EdgeQuote::builder(
            self.venue_id.clone(),
            self.venue_kind,
            &self.from_token,
            &self.to_token,
        )?
        .amounts(self.amount_in, self.amount_out)
        .timestamps(now, now.add_secs(self.ttl_secs()));
        if let Some(bps) = self.fee_bps {
            builder = builder.fee_bps(bps)?;
        }
        if let Some(max) = self.max_amount_in {
            builder = builder.max_amount_in(max);
        }
        if let Some(settlement) = self.settlement.clone() {
            builder = builder.settlement(settlement);
        }
        if let Some(address) = self.deposit_address.clone() {
            builder = builder.deposit_address(address);
        }
        builder.build()
    }
}

/// Static snapshot provider over a configured book.
pub struct StaticBookProvider {
    venue_id: VenueId,
    entries: Vec<BookEntry>,
    clock: Arc<dyn Clock>,
}

impl StaticBookProvider {
    /// Creates a provider over the given entries.
    #[must_use]
    pub fn new(
        venue_id: impl Into<VenueId>,
        entries: Vec<BookEntry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            venue_id: venue_id.into(),
            entries,
            clock,
        }
    }

    /// The default development book: a BRL corridor desk, a EUR corridor
    /// desk and two stablecoin DEX pools.
    #[must_use]
    pub fn with_default_book(clock: Arc<dyn Clock>) -> Self {
        let brl_settlement = SettlementMeta {
            settlement_days: dec!(1),
            counterparty_risk: dec!(0.001),
            supports_reservation: true,
            payment_methods: vec![PaymentMethod::Pix],
        };
        let eur_settlement = SettlementMeta {
            settlement_days: dec!(0.5),
            counterparty_risk: dec!(0.0005),
            supports_reservation: true,
            payment_methods: vec![PaymentMethod::BankTransfer],
        };
        let entries = vec![
            BookEntry::otc(
                "otc:transfero",
                "BRL",
                "USDC",
                Amount::new(10_000.0).unwrap_or_default(),
                Amount::new(2_000.0).unwrap_or_default(),
            )
            .with_fee_bps(40)
            .with_max_amount_in(Amount::new(500_000.0).unwrap_or_default())
            .with_settlement(brl_settlement.clone()),
            BookEntry::otc(
                "otc:transfero",
                "USDC",
                "BRL",
                Amount::new(2_000.0).unwrap_or_default(),
                Amount::new(9_900.0).unwrap_or_default(),
            )
            .with_fee_bps(40)
            .with_settlement(brl_settlement),
            BookEntry::otc(
                "otc:bitso",
                "USDC",
                "EUR",
                Amount::new(2_000.0).unwrap_or_default(),
                Amount::new(1_840.0).unwrap_or_default(),
            )
            .with_fee_bps(30)
            .with_settlement(eur_settlement),
            BookEntry::dex(
                "dex:orca",
                "USDC",
                "EURC",
                Amount::new(1_000.0).unwrap_or_default(),
                Amount::new(920.0).unwrap_or_default(),
            )
            .with_fee_bps(20)
            .with_deposit_address("9wFFyRfZBsuAha4YcuxcXLKwMxJR43S7fPfQLusDBzvT"),
            BookEntry::dex(
                "dex:orca",
                "USDC",
                "USDT",
                Amount::new(1_000.0).unwrap_or_default(),
                Amount::new(999.5).unwrap_or_default(),
            )
            .with_fee_bps(4)
            .with_deposit_address("9wFFyRfZBsuAha4YcuxcXLKwMxJR43S7fPfQLusDBzvT"),
        ];
        Self::new("book:static", entries, clock)
    }
}

impl fmt::Debug for StaticBookProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticBookProvider")
            .field("venue_id", &self.venue_id)
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[async_trait::async_trait]
impl QuoteProvider for StaticBookProvider {
    fn venue_id(&self) -> &VenueId {
        &self.venue_id
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Fast
    }

    async fn fetch_quotes(&self) -> ProviderResult<Vec<EdgeQuote>> {
        let now = self.clock.now();
        let mut quotes = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            match entry.to_quote(now) {
                Ok(quote) => quotes.push(quote),
                Err(e) => {
                    tracing::warn!(venue = %entry.venue_id, error = %e, "skipping invalid book entry");
                }
            }
        }
        Ok(quotes)
    }
}
