//! Property tests for the pricing laws: per-leg output computation and
//! FX inverse-edge synthesis.

use corridor::domain::entities::{EdgeQuote, VenueKind};
use corridor::domain::value_objects::{Amount, Timestamp, VenueId};
use corridor::infrastructure::providers::fx::{FxPair, FxRate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

fn quote(amount_in: f64, amount_out: f64, fee_bps: u32) -> EdgeQuote {
    EdgeQuote::builder("otc:prop", VenueKind::Otc, "USDC", "EUR")
        .unwrap()
        .amounts(
            Amount::new(amount_in).unwrap(),
            Amount::new(amount_out).unwrap(),
        )
        .fee_bps(fee_bps)
        .unwrap()
        .timestamps(Timestamp::from_millis(0), Timestamp::from_millis(60_000))
        .build()
        .unwrap()
}

proptest! {
    /// computeOutput(x, q) = x * (b0/a0) * (1 - f/10000)
    #[test]
    fn per_leg_output_matches_the_closed_form(
        amount_in in 1.0f64..1e6,
        amount_out in 1.0f64..1e6,
        fee_bps in 0u32..10_000,
        x in 0.01f64..1e6,
    ) {
        let q = quote(amount_in, amount_out, fee_bps);
        let output = q.output_for(Amount::new(x).unwrap()).unwrap();

        let expected = x * (amount_out / amount_in) * (1.0 - f64::from(fee_bps) / 10_000.0);
        let actual = output.to_f64();
        // Decimal vs f64 drift stays tiny for these magnitudes.
        prop_assert!(
            (actual - expected).abs() <= expected.abs() * 1e-9 + 1e-9,
            "x={} expected={} actual={}", x, expected, actual
        );
    }

    /// Output scales linearly in the input.
    #[test]
    fn per_leg_output_is_linear(
        amount_in in 1.0f64..1e6,
        amount_out in 1.0f64..1e6,
        fee_bps in 0u32..10_000,
        x in 0.01f64..1e5,
    ) {
        let q = quote(amount_in, amount_out, fee_bps);
        let single = q.output_for(Amount::new(x).unwrap()).unwrap().to_f64();
        let double = q.output_for(Amount::new(2.0 * x).unwrap()).unwrap().to_f64();
        prop_assert!((double - 2.0 * single).abs() <= double.abs() * 1e-9 + 1e-9);
    }

    /// Inverting an inverted rate re-derives the original ask and bid
    /// within floating-point tolerance.
    #[test]
    fn inverse_synthesis_round_trips(
        bid_milli in 100u32..100_000,
        spread_milli in 0u32..1_000,
    ) {
        let bid = Decimal::from(bid_milli) / Decimal::from(1_000);
        let ask = bid + Decimal::from(spread_milli) / Decimal::from(1_000);
        let mid = (ask + bid) / Decimal::from(2);
        let rate = FxRate { ask, bid, mid };

        let inverse = rate.inverse().unwrap();
        let back = inverse.inverse().unwrap();

        let ask_drift = ((back.ask - ask) / ask).abs().to_f64().unwrap();
        let bid_drift = ((back.bid - bid) / bid).abs().to_f64().unwrap();
        prop_assert!(ask_drift < 1e-15, "ask drift {}", ask_drift);
        prop_assert!(bid_drift < 1e-15, "bid drift {}", bid_drift);
    }

    /// The synthesised inverse edge prices the reciprocal market: its
    /// output rate is 1/bid of the direct market.
    #[test]
    fn synthesised_inverse_edge_prices_one_over_bid(
        bid_milli in 100u32..100_000,
        spread_milli in 0u32..1_000,
    ) {
        let bid = Decimal::from(bid_milli) / Decimal::from(1_000);
        let ask = bid + Decimal::from(spread_milli) / Decimal::from(1_000);
        let mid = (ask + bid) / Decimal::from(2);
        let rate = FxRate { ask, bid, mid };

        let venue = VenueId::new("fx:prop");
        let pair = FxPair::new("EUR", "USD").unwrap();
        let inverse = corridor::infrastructure::providers::fx::synthesize_inverse(
            &venue,
            &pair,
            &rate,
            Timestamp::from_millis(0),
        )
        .unwrap();

        prop_assert_eq!(inverse.from_token.as_str(), "USD");
        prop_assert_eq!(inverse.to_token.as_str(), "EUR");
        let expected = (Decimal::ONE / bid).to_f64().unwrap();
        let actual = inverse.amount_out.get().to_f64().unwrap();
        prop_assert!(
            (actual - expected).abs() <= expected.abs() * 1e-12,
            "expected {} actual {}", expected, actual
        );
    }
}
