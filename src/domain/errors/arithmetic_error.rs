//! # Arithmetic Errors
//!
//! Errors produced by checked arithmetic on monetary value objects.
//!
//! Amounts and rates use [`rust_decimal::Decimal`](rust_decimal::Decimal)
//! with checked operations; every overflow, underflow or invalid operand
//! surfaces as an [`ArithmeticError`] rather than panicking or saturating
//! silently.

use thiserror::Error;

/// Error produced by checked arithmetic on monetary values.
///
/// # Examples
///
/// ```
/// use corridor::domain::errors::ArithmeticError;
///
/// let err = ArithmeticError::InvalidValue("amount cannot be negative");
/// assert!(err.to_string().contains("negative"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    /// The operation would overflow the decimal range.
    #[error("arithmetic overflow")]
    Overflow,

    /// The operation would produce a negative value where none is allowed.
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An operand or result is invalid for the target type.
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
}

/// Result type for checked arithmetic operations.
pub type ArithmeticResult<T> = Result<T, ArithmeticError>;
