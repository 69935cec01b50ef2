//! # Amount Value Object
//!
//! Non-negative decimal amount with checked arithmetic.
//!
//! All quote, route and deposit amounts are [`Amount`]s in the token's
//! natural unit. Negative values are rejected at construction and every
//! arithmetic operation is checked.
//!
//! # Examples
//!
//! ```
//! use corridor::domain::value_objects::Amount;
//!
//! let principal = Amount::new(1000.0).unwrap();
//! let received = Amount::new(920.0).unwrap();
//! let rate = received.ratio_to(principal).unwrap();
//! assert_eq!(rate.to_string(), "0.92");
//! ```

use crate::domain::errors::{ArithmeticError, ArithmeticResult};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A validated non-negative amount.
///
/// # Invariants
///
/// - Amount is always >= 0
///
/// # Examples
///
/// ```
/// use corridor::domain::value_objects::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(100.50).unwrap();
/// assert!(!amount.is_zero());
///
/// let from_decimal = Amount::from_decimal(Decimal::new(10050, 2)).unwrap();
/// assert_eq!(amount, from_decimal);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// One unit, the reference size of FX feed quotes.
    pub const ONE: Self = Self(Decimal::ONE);

    /// Creates a new amount from an f64 value.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::InvalidValue` if the value is negative or
    /// not representable as a decimal.
    #[must_use = "this returns a Result that should be handled"]
    pub fn new(value: f64) -> ArithmeticResult<Self> {
        let decimal =
            Decimal::try_from(value).map_err(|_| ArithmeticError::InvalidValue("invalid float"))?;
        Self::from_decimal(decimal)
    }

    /// Creates a new amount from a Decimal value.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::InvalidValue` if the value is negative.
    #[must_use = "this returns a Result that should be handled"]
    pub fn from_decimal(value: Decimal) -> ArithmeticResult<Self> {
        if value.is_sign_negative() {
            return Err(ArithmeticError::InvalidValue("amount cannot be negative"));
        }
        Ok(Self(value))
    }

    /// Returns the inner Decimal value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }

    /// Returns the amount as an f64, for transport DTOs.
    ///
    /// Lossy for extreme magnitudes; transport precision is accepted as
    /// f64 at the API boundary.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// Returns true if the amount is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly positive.
    #[inline]
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Safely adds another amount.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the result would overflow.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn safe_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(ArithmeticError::Overflow)
    }

    /// Safely subtracts another amount, clamping at zero.
    ///
    /// Settlement scoring subtracts penalties from a gross output and the
    /// result floors at zero rather than going negative.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        if rhs.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - rhs.0)
        }
    }

    /// Safely multiplies by a non-negative Decimal factor.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` on overflow and
    /// `ArithmeticError::InvalidValue` for a negative factor.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn safe_mul(self, factor: Decimal) -> ArithmeticResult<Self> {
        if factor.is_sign_negative() {
            return Err(ArithmeticError::InvalidValue("factor cannot be negative"));
        }
        self.0
            .checked_mul(factor)
            .map(Self)
            .ok_or(ArithmeticError::Overflow)
    }

    /// Returns `self / other` as a plain Decimal rate.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::DivisionByZero` if `other` is zero.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn ratio_to(self, other: Self) -> ArithmeticResult<Decimal> {
        if other.0.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        self.0
            .checked_div(other.0)
            .ok_or(ArithmeticError::Overflow)
    }

    /// Returns the larger of two amounts.
    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if self.0 >= other.0 { self } else { other }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ArithmeticError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = ArithmeticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal =
            Decimal::from_str(s).map_err(|_| ArithmeticError::InvalidValue("invalid decimal"))?;
        Self::from_decimal(decimal)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}
