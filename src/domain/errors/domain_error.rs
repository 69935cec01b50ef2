//! # Domain Errors
//!
//! Typed domain error definitions.
//!
//! This module provides the [`DomainError`] enum for domain-level failures:
//! invalid quotes and routes, expired records, and illegal lifecycle
//! transitions.

use crate::domain::errors::ArithmeticError;
use thiserror::Error;

/// Domain-level error.
///
/// # Examples
///
/// ```
/// use corridor::domain::errors::DomainError;
///
/// let error = DomainError::invalid_quote("amountIn must be positive");
/// assert!(error.to_string().contains("positive"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// An edge quote failed validation.
    #[error("invalid quote: {0}")]
    InvalidQuote(String),

    /// A route failed its chaining invariants.
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// A token symbol failed validation.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// A timestamp failed validation.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A quote or record was read past its expiry.
    #[error("expired: {0}")]
    Expired(String),

    /// An illegal lifecycle transition was attempted.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
    },

    /// The operation is not allowed in the current state.
    #[error("operation not allowed: {0}")]
    OperationNotAllowed(String),

    /// An approval token did not match.
    #[error("approval token mismatch")]
    ApprovalTokenMismatch,

    /// Arithmetic failure inside a domain computation.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

impl DomainError {
    /// Creates an invalid quote error.
    #[must_use]
    pub fn invalid_quote(message: impl Into<String>) -> Self {
        Self::InvalidQuote(message.into())
    }

    /// Creates an invalid route error.
    #[must_use]
    pub fn invalid_route(message: impl Into<String>) -> Self {
        Self::InvalidRoute(message.into())
    }

    /// Creates an invalid token error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }

    /// Creates an expired-record error.
    #[must_use]
    pub fn expired(message: impl Into<String>) -> Self {
        Self::Expired(message.into())
    }

    /// Creates an invalid state transition error.
    #[must_use]
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidStateTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates an operation-not-allowed error.
    #[must_use]
    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::OperationNotAllowed(message.into())
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
