//! # Token Value Object
//!
//! Validated token symbol with classification helpers.
//!
//! A token is either a fiat currency (BRL, MXN, NGN, USD, EUR, ...) or an
//! on-chain stablecoin (USDC, USDT, EURC). Classification drives the
//! settlement-meta defaults attached to FX quotes and the payment method
//! offered for the deposit leg.

use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Off-chain or on-chain payment rail used for a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Brazilian instant payments rail.
    Pix,
    /// Mexican interbank rail.
    Spei,
    /// Domestic bank transfer.
    BankTransfer,
    /// International wire.
    WireTransfer,
    /// On-chain transfer to a deposit address.
    OnChain,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pix => "PIX",
            Self::Spei => "SPEI",
            Self::BankTransfer => "bank_transfer",
            Self::WireTransfer => "wire_transfer",
            Self::OnChain => "on_chain",
        };
        write!(f, "{}", s)
    }
}

/// A validated token symbol.
///
/// Symbols are stored uppercase; 2-10 ASCII alphanumeric characters.
///
/// # Examples
///
/// ```
/// use corridor::domain::value_objects::Token;
///
/// let usdc = Token::new("usdc").unwrap();
/// assert_eq!(usdc.as_str(), "USDC");
/// assert!(usdc.is_stablecoin());
///
/// let brl = Token::new("BRL").unwrap();
/// assert!(!brl.is_stablecoin());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token(String);

/// Stablecoins usable as routing intermediates.
const STABLECOINS: [&str; 3] = ["USDC", "USDT", "EURC"];

/// Fiat currencies settled over slow local rails.
const SLOW_RAIL_FIAT: [&str; 3] = ["BRL", "MXN", "NGN"];

impl Token {
    /// Creates a validated token symbol, uppercasing the input.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidToken` for an empty, overlong or
    /// non-alphanumeric symbol.
    pub fn new(symbol: impl AsRef<str>) -> DomainResult<Self> {
        let symbol = symbol.as_ref().trim();
        if symbol.len() < 2 || symbol.len() > 10 {
            return Err(DomainError::invalid_token(format!(
                "symbol must be 2-10 characters, got {:?}",
                symbol
            )));
        }
        if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::invalid_token(format!(
                "symbol must be alphanumeric, got {:?}",
                symbol
            )));
        }
        Ok(Self(symbol.to_ascii_uppercase()))
    }

    /// Returns the symbol as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for on-chain stablecoins (USDC, USDT, EURC).
    #[must_use]
    pub fn is_stablecoin(&self) -> bool {
        STABLECOINS.contains(&self.0.as_str())
    }

    /// Returns true for fiat settled over slow local rails (BRL, MXN, NGN).
    #[must_use]
    pub fn is_slow_rail_fiat(&self) -> bool {
        SLOW_RAIL_FIAT.contains(&self.0.as_str())
    }

    /// Returns the payment method a payer in this token uses.
    ///
    /// BRL pays over PIX, MXN over SPEI, everything else by bank transfer.
    #[must_use]
    pub fn payment_method(&self) -> PaymentMethod {
        match self.0.as_str() {
            "BRL" => PaymentMethod::Pix,
            "MXN" => PaymentMethod::Spei,
            _ => PaymentMethod::BankTransfer,
        }
    }

    /// Formats the `FROM/TO` pair code used by the volatility table.
    #[must_use]
    pub fn pair_code(&self, other: &Self) -> String {
        format!("{}/{}", self.0, other.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Token {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Token {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn uppercases_input() {
            assert_eq!(Token::new("usdc").unwrap().as_str(), "USDC");
        }

        #[test]
        fn trims_whitespace() {
            assert_eq!(Token::new(" BRL ").unwrap().as_str(), "BRL");
        }

        #[test]
        fn rejects_empty() {
            assert!(Token::new("").is_err());
        }

        #[test]
        fn rejects_single_char() {
            assert!(Token::new("X").is_err());
        }

        #[test]
        fn rejects_symbols_with_punctuation() {
            assert!(Token::new("BRL/USD").is_err());
        }

        #[test]
        fn rejects_overlong() {
            assert!(Token::new("ABCDEFGHIJK").is_err());
        }
    }

    mod classification {
        use super::*;

        #[test]
        fn stablecoins() {
            for symbol in ["USDC", "USDT", "EURC"] {
                assert!(Token::new(symbol).unwrap().is_stablecoin(), "{symbol}");
            }
            assert!(!Token::new("BRL").unwrap().is_stablecoin());
            assert!(!Token::new("EUR").unwrap().is_stablecoin());
        }

        #[test]
        fn slow_rail_fiat() {
            for symbol in ["BRL", "MXN", "NGN"] {
                assert!(Token::new(symbol).unwrap().is_slow_rail_fiat(), "{symbol}");
            }
            assert!(!Token::new("USD").unwrap().is_slow_rail_fiat());
        }
    }

    mod payment_methods {
        use super::*;

        #[test]
        fn brl_pays_over_pix() {
            assert_eq!(
                Token::new("BRL").unwrap().payment_method(),
                PaymentMethod::Pix
            );
        }

        #[test]
        fn mxn_pays_over_spei() {
            assert_eq!(
                Token::new("MXN").unwrap().payment_method(),
                PaymentMethod::Spei
            );
        }

        #[test]
        fn usd_and_eur_pay_by_bank_transfer() {
            assert_eq!(
                Token::new("USD").unwrap().payment_method(),
                PaymentMethod::BankTransfer
            );
            assert_eq!(
                Token::new("EUR").unwrap().payment_method(),
                PaymentMethod::BankTransfer
            );
        }

        #[test]
        fn unknown_fiat_defaults_to_bank_transfer() {
            assert_eq!(
                Token::new("GBP").unwrap().payment_method(),
                PaymentMethod::BankTransfer
            );
        }
    }

    #[test]
    fn pair_code_formats_with_slash() {
        let brl = Token::new("BRL").unwrap();
        let usdc = Token::new("USDC").unwrap();
        assert_eq!(brl.pair_code(&usdc), "BRL/USDC");
    }

    #[test]
    fn serde_roundtrip() {
        let token = Token::new("EURC").unwrap();
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"EURC\"");
        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn deserialize_invalid_fails() {
        let result: Result<Token, _> = serde_json::from_str("\"!!\"");
        assert!(result.is_err());
    }
}
