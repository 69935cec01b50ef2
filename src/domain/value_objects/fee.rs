//! # Fee Value Object
//!
//! Basis-point fee with range validation.
//!
//! Fees across the system are quoted in basis points (1 bp = 1/10000).
//! A quote fee is applied multiplicatively to a leg's gross output; route
//! aggregates sum step fees as a telemetry lower bound and never re-apply
//! the sum.

use crate::domain::errors::{ArithmeticError, ArithmeticResult};
use crate::domain::value_objects::Amount;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One basis point as a decimal fraction (1/10000).
const BPS_DENOMINATOR: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// A fee in basis points, validated to `[0, 10000]`.
///
/// # Examples
///
/// ```
/// use corridor::domain::value_objects::{Amount, FeeBps};
///
/// let fee = FeeBps::new(30).unwrap();
/// let gross = Amount::new(920.0).unwrap();
/// let net = fee.apply(gross).unwrap();
/// assert_eq!(net.to_string(), "917.2400");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct FeeBps(u32);

impl FeeBps {
    /// Maximum representable fee (100%).
    pub const MAX: u32 = 10_000;

    /// Zero fee constant.
    pub const ZERO: Self = Self(0);

    /// Creates a fee from basis points.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::InvalidValue` if `bps > 10000`.
    #[must_use = "this returns a Result that should be handled"]
    pub fn new(bps: u32) -> ArithmeticResult<Self> {
        if bps > Self::MAX {
            return Err(ArithmeticError::InvalidValue("fee exceeds 10000 bps"));
        }
        Ok(Self(bps))
    }

    /// Rounds a fractional basis-point figure to the nearest whole fee.
    ///
    /// FX providers derive fees from half the quoted spread, which is
    /// rarely a whole number of basis points.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::InvalidValue` for negative or
    /// out-of-range input.
    #[must_use = "this returns a Result that should be handled"]
    pub fn from_rounded(bps: Decimal) -> ArithmeticResult<Self> {
        if bps.is_sign_negative() {
            return Err(ArithmeticError::InvalidValue("fee cannot be negative"));
        }
        // Half-up, not banker's rounding: 12.5 bps charges 13.
        let value = bps
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .ok_or(ArithmeticError::InvalidValue("fee out of range"))?;
        Self::new(value)
    }

    /// Returns the fee in basis points.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the fee as a decimal fraction (30 bps -> 0.003).
    #[must_use]
    pub fn as_fraction(self) -> Decimal {
        Decimal::from(self.0) / BPS_DENOMINATOR
    }

    /// Applies the fee to a gross amount: `gross - gross * bps / 10000`.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error on overflow.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn apply(self, gross: Amount) -> ArithmeticResult<Amount> {
        let charged = gross.safe_mul(self.as_fraction())?;
        Ok(gross.saturating_sub(charged))
    }

    /// Saturating sum of fees, used for route-level aggregates.
    #[must_use]
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0).min(Self::MAX))
    }
}

impl Default for FeeBps {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for FeeBps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

impl TryFrom<u32> for FeeBps {
    type Error = ArithmeticError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeeBps> for u32 {
    fn from(fee: FeeBps) -> Self {
        fee.0
    }
}
