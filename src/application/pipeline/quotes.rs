//! # Provisional Quote Registry and Reservation
//!
//! Stores scored routes as addressable provisional quotes (TTL 15 s) and
//! promotes them to reservations (TTL 300 s) on client intent.
//!
//! Reservation ordering: the reserved key is written first with a
//! set-if-absent so a racing second reserve loses, then the provisional
//! key is deleted. In the brief window where both keys exist the
//! reserved record is the source of truth; readers prefer it.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::scorer::ScoredOutput;
use crate::domain::entities::{
    OtcReservationMeta, PROVISIONAL_TTL_SECS, ProvisionalQuote, QuoteKind, RESERVATION_TTL_SECS,
    ReservedQuote, Route,
};
use crate::domain::value_objects::{Amount, ClientId, QuoteId, Token};
use crate::infrastructure::clock::Clock;
use crate::infrastructure::store::{KeyValueStore, keys};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Desk-side reservation port for OTC legs.
///
/// The engine asks the desk for a reservation id and deposit address
/// when a quote with an OTC leg is reserved. Desk trouble degrades the
/// reservation (no desk metadata) rather than failing it.
#[async_trait]
pub trait OtcDesk: Send + Sync + fmt::Debug {
    /// Reserves the OTC side of a quote.
    ///
    /// # Errors
    ///
    /// Returns a message describing why the desk declined.
    async fn reserve(&self, quote: &ProvisionalQuote) -> Result<OtcReservationMeta, String>;
}

/// Desk simulator issuing deterministic-shape reservation ids.
#[derive(Debug, Default)]
pub struct SimulatedOtcDesk;

#[async_trait]
impl OtcDesk for SimulatedOtcDesk {
    async fn reserve(&self, quote: &ProvisionalQuote) -> Result<OtcReservationMeta, String> {
        Ok(OtcReservationMeta {
            otc_reservation_id: Some(format!("otc-{}", quote.quote_id.short())),
            deposit_address: None,
            deposit_instructions: Some("Settle within the reservation window".to_string()),
        })
    }
}

/// Provisional and reserved quote registry over the store.
#[derive(Debug, Clone)]
pub struct QuoteService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl QuoteService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Stores a scored route as a provisional quote with a 15 s TTL.
    ///
    /// # Errors
    ///
    /// Returns a store or serialization error.
    pub async fn store_provisional(
        &self,
        route: Option<Route>,
        fallback_route: Option<Route>,
        from: Token,
        to: Token,
        amount_in: Amount,
        gross_out: Amount,
        scored: ScoredOutput,
    ) -> ApplicationResult<ProvisionalQuote> {
        let now = self.clock.now();
        let kind = route
            .as_ref()
            .map_or(QuoteKind::Otc, QuoteKind::of);
        let fee_bps = route
            .as_ref()
            .map(|r| r.total_fees_bps)
            .unwrap_or_default();

        let quote = ProvisionalQuote {
            quote_id: QuoteId::new_v4(),
            route,
            fallback_route,
            from_token: from,
            to_token: to,
            amount_in,
            amount_out: gross_out,
            net_amount_out: scored.net_output,
            fee_bps,
            expiry_ts: now.add_secs(PROVISIONAL_TTL_SECS),
            created_ts: now,
            kind,
            scoring: scored.meta,
        };

        let value = serde_json::to_string(&quote)
            .map_err(|e| ApplicationError::serialization(e.to_string()))?;
        self.store
            .set(
                &keys::provisional_quote(&quote.quote_id),
                &value,
                Some(Duration::from_secs(PROVISIONAL_TTL_SECS as u64)),
            )
            .await?;
        Ok(quote)
    }

    /// Reads a provisional quote; expired or missing records read as
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns a store or serialization error.
    pub async fn get_provisional(
        &self,
        quote_id: &QuoteId,
    ) -> ApplicationResult<Option<ProvisionalQuote>> {
        let Some(value) = self.store.get(&keys::provisional_quote(quote_id)).await? else {
            return Ok(None);
        };
        let quote: ProvisionalQuote = serde_json::from_str(&value)
            .map_err(|e| ApplicationError::serialization(e.to_string()))?;
        if quote.is_expired(self.clock.now()) {
            return Ok(None);
        }
        Ok(Some(quote))
    }

    /// Reads a reserved quote; expired or missing records read as absent.
    ///
    /// # Errors
    ///
    /// Returns a store or serialization error.
    pub async fn get_reserved(
        &self,
        quote_id: &QuoteId,
    ) -> ApplicationResult<Option<ReservedQuote>> {
        let Some(value) = self.store.get(&keys::reserved_quote(quote_id)).await? else {
            return Ok(None);
        };
        let reserved: ReservedQuote = serde_json::from_str(&value)
            .map_err(|e| ApplicationError::serialization(e.to_string()))?;
        if reserved.is_expired(self.clock.now()) {
            return Ok(None);
        }
        Ok(Some(reserved))
    }

    /// Promotes a provisional quote to a reservation.
    ///
    /// The first reserve wins: the reserved key is written with
    /// set-if-absent, so a racing call fails NotFound (its provisional
    /// has been consumed). OTC-typed quotes additionally ask the desk for
    /// reservation metadata; desk failures degrade with a warning.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the provisional is absent, expired or
    /// already reserved, and store errors otherwise.
    pub async fn reserve(
        &self,
        quote_id: &QuoteId,
        client: ClientId,
        desk: &dyn OtcDesk,
    ) -> ApplicationResult<ReservedQuote> {
        let provisional = self
            .get_provisional(quote_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(format!("quote {}", quote_id)))?;

        let otc = if provisional.kind.involves_otc() {
            match desk.reserve(&provisional).await {
                Ok(meta) => Some(meta),
                Err(e) => {
                    warn!(quote_id = %quote_id, error = %e, "OTC desk reservation failed, reserving without desk metadata");
                    None
                }
            }
        } else {
            None
        };

        let reserved = ReservedQuote::promote(provisional, client, self.clock.now(), otc);
        let value = serde_json::to_string(&reserved)
            .map_err(|e| ApplicationError::serialization(e.to_string()))?;

        let won = self
            .store
            .set_nx(
                &keys::reserved_quote(quote_id),
                &value,
                Some(Duration::from_secs(RESERVATION_TTL_SECS as u64)),
            )
            .await?;
        if !won {
            return Err(ApplicationError::not_found(format!(
                "quote {} already reserved",
                quote_id
            )));
        }

        // Delete after the reserved write; consumers prefer the reserved
        // key during the overlap window.
        self.store.del(&keys::provisional_quote(quote_id)).await?;
        Ok(reserved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::scorer::{ScoringConfig, SettlementScorer};
    use crate::domain::entities::RouteStep;
    use crate::domain::value_objects::{FeeBps, Timestamp, VenueId};
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::store::MemoryStore;

    struct Fixture {
        clock: Arc<ManualClock>,
        service: QuoteService,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::at(0));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let service = QuoteService::new(store, clock.clone());
        Fixture { clock, service }
    }

    fn otc_route() -> Route {
        Route::from_steps(
            vec![RouteStep::new(
                Token::new("BRL").unwrap(),
                Token::new("USDC").unwrap(),
                VenueId::new("otc:transfero"),
                Amount::new(10_000.0).unwrap(),
                Amount::new(1_992.0).unwrap(),
                Some(FeeBps::new(40).unwrap()),
            )],
            Timestamp::from_millis(0),
        )
        .unwrap()
    }

    fn scored(gross: f64) -> ScoredOutput {
        let scorer = SettlementScorer::new(ScoringConfig::default());
        scorer.score(
            Amount::new(gross).unwrap(),
            &Token::new("BRL").unwrap(),
            &Token::new("USDC").unwrap(),
            &[],
        )
    }

    async fn store_quote(f: &Fixture) -> ProvisionalQuote {
        f.service
            .store_provisional(
                Some(otc_route()),
                None,
                Token::new("BRL").unwrap(),
                Token::new("USDC").unwrap(),
                Amount::new(10_000.0).unwrap(),
                Amount::new(1_992.0).unwrap(),
                scored(1_992.0),
            )
            .await
            .unwrap()
    }

    mod provisional {
        use super::*;

        #[tokio::test]
        async fn stored_quote_reads_back() {
            let f = fixture();
            let quote = store_quote(&f).await;
            let read = f
                .service
                .get_provisional(&quote.quote_id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(read, quote);
            assert_eq!(read.kind, QuoteKind::Otc);
        }

        #[tokio::test]
        async fn expired_quote_reads_absent() {
            let f = fixture();
            let quote = store_quote(&f).await;
            f.clock.advance_secs(15);
            assert!(
                f.service
                    .get_provisional(&quote.quote_id)
                    .await
                    .unwrap()
                    .is_none()
            );
        }

        #[tokio::test]
        async fn net_never_exceeds_gross() {
            let f = fixture();
            let quote = store_quote(&f).await;
            assert!(quote.net_amount_out <= quote.amount_out);
        }
    }

    mod reservation {
        use super::*;

        #[tokio::test]
        async fn reserve_promotes_and_deletes_provisional() {
            let f = fixture();
            let quote = store_quote(&f).await;

            let reserved = f
                .service
                .reserve(&quote.quote_id, ClientId::new("c1"), &SimulatedOtcDesk)
                .await
                .unwrap();

            assert_eq!(reserved.quote.quote_id, quote.quote_id);
            assert_eq!(reserved.reserved_by.as_str(), "c1");
            assert_eq!(reserved.reserved_until_ts.millis(), 300_000);
            assert!(reserved.otc.is_some());
            // The provisional is gone within the same operation window.
            assert!(
                f.service
                    .get_provisional(&quote.quote_id)
                    .await
                    .unwrap()
                    .is_none()
            );
            // The reservation reads back.
            assert!(
                f.service
                    .get_reserved(&quote.quote_id)
                    .await
                    .unwrap()
                    .is_some()
            );
        }

        #[tokio::test]
        async fn second_reserve_fails_not_found() {
            let f = fixture();
            let quote = store_quote(&f).await;

            f.service
                .reserve(&quote.quote_id, ClientId::new("c1"), &SimulatedOtcDesk)
                .await
                .unwrap();
            let second = f
                .service
                .reserve(&quote.quote_id, ClientId::new("c2"), &SimulatedOtcDesk)
                .await;
            assert!(matches!(second, Err(ApplicationError::NotFound(_))));
        }

        #[tokio::test]
        async fn reserve_of_expired_quote_fails_not_found() {
            let f = fixture();
            let quote = store_quote(&f).await;
            f.clock.advance_secs(15);

            let result = f
                .service
                .reserve(&quote.quote_id, ClientId::new("c1"), &SimulatedOtcDesk)
                .await;
            assert!(matches!(result, Err(ApplicationError::NotFound(_))));
        }

        #[tokio::test]
        async fn reserve_of_unknown_quote_fails_not_found() {
            let f = fixture();
            let result = f
                .service
                .reserve(&QuoteId::new_v4(), ClientId::new("c1"), &SimulatedOtcDesk)
                .await;
            assert!(matches!(result, Err(ApplicationError::NotFound(_))));
        }

        #[tokio::test]
        async fn desk_failure_degrades_to_no_metadata() {
            #[derive(Debug)]
            struct DownDesk;

            #[async_trait]
            impl OtcDesk for DownDesk {
                async fn reserve(
                    &self,
                    _quote: &ProvisionalQuote,
                ) -> Result<OtcReservationMeta, String> {
                    Err("desk offline".to_string())
                }
            }

            let f = fixture();
            let quote = store_quote(&f).await;
            let reserved = f
                .service
                .reserve(&quote.quote_id, ClientId::new("c1"), &DownDesk)
                .await
                .unwrap();
            assert!(reserved.otc.is_none());
        }

        #[tokio::test]
        async fn reservation_expires_after_window() {
            let f = fixture();
            let quote = store_quote(&f).await;
            f.service
                .reserve(&quote.quote_id, ClientId::new("c1"), &SimulatedOtcDesk)
                .await
                .unwrap();

            f.clock.advance_secs(300);
            assert!(
                f.service
                    .get_reserved(&quote.quote_id)
                    .await
                    .unwrap()
                    .is_none()
            );
        }
    }

    #[tokio::test]
    async fn routeless_quote_can_be_stored() {
        let f = fixture();
        let quote = f
            .service
            .store_provisional(
                None,
                None,
                Token::new("NGN").unwrap(),
                Token::new("MXN").unwrap(),
                Amount::new(100.0).unwrap(),
                Amount::ZERO,
                scored(0.0),
            )
            .await
            .unwrap();
        assert!(quote.route.is_none());
        assert_eq!(quote.amount_out, Amount::ZERO);
    }
}
