//! # Keyspace Layout
//!
//! Structured key builders for every family the engine persists.
//!
//! Two edge families matter to the router: OTC edges under
//! `otc:quotes:{from}:{to}:{venue}` and DEX edges under
//! `routing:edge:solana:{from}:{to}:{venue}`. The `solana` literal is a
//! design-time namespace, kept fixed.

use crate::domain::value_objects::{DepositId, ExecutionId, QuoteId, Token, VenueId};

/// Prefix of the OTC edge family.
pub const OTC_EDGE_PREFIX: &str = "otc:quotes";

/// Prefix of the DEX edge family.
pub const DEX_EDGE_PREFIX: &str = "routing:edge:solana";

/// Key of an OTC/FX edge quote.
#[must_use]
pub fn otc_edge(from: &Token, to: &Token, venue: &VenueId) -> String {
    format!("{}:{}:{}:{}", OTC_EDGE_PREFIX, from, to, venue)
}

/// Key of a DEX edge quote.
#[must_use]
pub fn dex_edge(from: &Token, to: &Token, venue: &VenueId) -> String {
    format!("{}:{}:{}:{}", DEX_EDGE_PREFIX, from, to, venue)
}

/// Scan pattern covering every OTC edge for a pair.
#[must_use]
pub fn otc_pair_pattern(from: &Token, to: &Token) -> String {
    format!("{}:{}:{}:*", OTC_EDGE_PREFIX, from, to)
}

/// Scan pattern covering every DEX edge for a pair.
#[must_use]
pub fn dex_pair_pattern(from: &Token, to: &Token) -> String {
    format!("{}:{}:{}:*", DEX_EDGE_PREFIX, from, to)
}

/// Key of a provisional quote.
#[must_use]
pub fn provisional_quote(quote_id: &QuoteId) -> String {
    format!("quote:prov:{}", quote_id)
}

/// Key of a reserved quote.
#[must_use]
pub fn reserved_quote(quote_id: &QuoteId) -> String {
    format!("quote:reserved:{}", quote_id)
}

/// Key of a deposit record.
#[must_use]
pub fn deposit(deposit_id: &DepositId) -> String {
    format!("deposit:{}", deposit_id)
}

/// Key of the payment-reference index pointing at a deposit id.
#[must_use]
pub fn deposit_reference(payment_reference: &str) -> String {
    format!("deposit:ref:{}", payment_reference)
}

/// Key of an execution record.
#[must_use]
pub fn execution(execution_id: &ExecutionId) -> String {
    format!("exec:{}", execution_id)
}

/// Key of the quote-to-execution index.
#[must_use]
pub fn execution_by_quote(quote_id: &QuoteId) -> String {
    format!("execution:quote:{}", quote_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token(s: &str) -> Token {
        Token::new(s).unwrap()
    }

    #[test]
    fn edge_keys_follow_the_two_families() {
        let venue = VenueId::new("otc:transfero");
        assert_eq!(
            otc_edge(&token("BRL"), &token("USDC"), &venue),
            "otc:quotes:BRL:USDC:otc:transfero"
        );
        let dex = VenueId::new("dex:orca");
        assert_eq!(
            dex_edge(&token("USDC"), &token("EURC"), &dex),
            "routing:edge:solana:USDC:EURC:dex:orca"
        );
    }

    #[test]
    fn pair_patterns_end_in_wildcard() {
        assert_eq!(
            otc_pair_pattern(&token("BRL"), &token("USDC")),
            "otc:quotes:BRL:USDC:*"
        );
        assert_eq!(
            dex_pair_pattern(&token("USDC"), &token("EURC")),
            "routing:edge:solana:USDC:EURC:*"
        );
    }

    #[test]
    fn lifecycle_keys_carry_their_ids() {
        let quote_id = QuoteId::new_v4();
        assert_eq!(
            provisional_quote(&quote_id),
            format!("quote:prov:{}", quote_id)
        );
        assert_eq!(
            reserved_quote(&quote_id),
            format!("quote:reserved:{}", quote_id)
        );
        assert_eq!(
            execution_by_quote(&quote_id),
            format!("execution:quote:{}", quote_id)
        );
        assert_eq!(
            deposit_reference("r1a2b3c4d-c1"),
            "deposit:ref:r1a2b3c4d-c1"
        );
    }
}
