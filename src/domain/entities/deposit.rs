//! # Deposit Entities
//!
//! Off-chain deposit instructions and the deposit record bound to a
//! payment reference.
//!
//! # Status Machine
//!
//! ```text
//! Pending → Confirmed
//!    ↓
//! Failed / Expired
//! ```
//!
//! Confirmation is idempotent on the payment reference: re-confirming a
//! Confirmed record re-applies the same content and reports that no state
//! changed, so execution is never triggered twice.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    Amount, ClientId, DepositId, PaymentMethod, QuoteId, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default deposit record time-to-live in seconds.
pub const DEPOSIT_TTL_SECS: i64 = 3_600;

/// Relative tolerance applied when the received amount differs from the
/// expected one (banking fees shave small slices off transfers).
pub const AMOUNT_TOLERANCE: f64 = 0.001;

/// Bank (or rail) account details shown to the payer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountDetails {
    /// Receiving institution name.
    pub bank_name: String,
    /// Account holder the payer should see.
    pub account_holder: String,
    /// Account number, IBAN or CLABE, depending on the rail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// PIX key, for the PIX rail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_key: Option<String>,
    /// SWIFT/BIC code for wires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swift_code: Option<String>,
}

/// Payload returned to the client to pay off-chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositInstructions {
    /// The rail the payer should use.
    pub method: PaymentMethod,
    /// Where the money goes.
    pub account_details: AccountDetails,
    /// Amount due, in the source token.
    pub amount: Amount,
    /// Reference the payer must attach; unique within the TTL window.
    pub payment_reference: String,
    /// EMV BR Code payload for PIX payments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_data: Option<String>,
    /// Instant after which the deposit window closes.
    pub deposit_expiry_ts: Timestamp,
}

/// Deposit lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositStatus {
    /// Instructions issued, waiting for the payer.
    #[default]
    Pending,
    /// Funds arrived and were matched to the reference.
    Confirmed,
    /// The deposit failed terminally.
    Failed,
    /// The deposit window closed without funds.
    Expired,
}

impl DepositStatus {
    /// Returns true for terminal statuses.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::Expired)
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
        };
        write!(f, "{}", s)
    }
}

/// The record tracking one expected deposit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositRecord {
    /// Deposit identifier.
    pub deposit_id: DepositId,
    /// The reserved quote this deposit funds.
    pub quote_id: QuoteId,
    /// The paying client.
    pub client_id: ClientId,
    /// Amount the instructions asked for.
    pub amount_expected: Amount,
    /// Amount actually received, once confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_received: Option<Amount>,
    /// The instructions issued to the payer.
    pub instructions: DepositInstructions,
    /// Lifecycle status.
    pub status: DepositStatus,
    /// Confirmation instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<Timestamp>,
    /// Bank-side transaction id reported by the notifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_tx_id: Option<String>,
    /// The payment reference, duplicated for index lookups.
    pub payment_reference: String,
}

impl DepositRecord {
    /// Creates a pending record from issued instructions.
    #[must_use]
    pub fn pending(
        quote_id: QuoteId,
        client_id: ClientId,
        instructions: DepositInstructions,
    ) -> Self {
        Self {
            deposit_id: DepositId::new_v4(),
            quote_id,
            client_id,
            amount_expected: instructions.amount,
            amount_received: None,
            payment_reference: instructions.payment_reference.clone(),
            instructions,
            status: DepositStatus::Pending,
            received_at: None,
            bank_tx_id: None,
        }
    }

    /// Returns true when `received` deviates from the expected amount by
    /// more than the tolerance. Mismatches are warned, not rejected.
    #[must_use]
    pub fn amount_mismatch(&self, received: Amount) -> bool {
        let expected = self.amount_expected.get();
        let tolerance = expected.abs()
            * rust_decimal::Decimal::try_from(AMOUNT_TOLERANCE).unwrap_or_default();
        (received.get() - expected).abs() > tolerance
    }

    /// Applies a confirmation.
    ///
    /// Re-confirming a Confirmed record is allowed and overwrites with
    /// the same effective content; the caller uses the prior status to
    /// decide whether to advance execution.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` from Failed or
    /// Expired.
    pub fn confirm(
        &mut self,
        received: Amount,
        now: Timestamp,
        bank_tx_id: Option<String>,
    ) -> DomainResult<()> {
        match self.status {
            DepositStatus::Pending | DepositStatus::Confirmed => {
                self.status = DepositStatus::Confirmed;
                self.amount_received = Some(received);
                self.received_at = Some(now);
                self.bank_tx_id = bank_tx_id;
                Ok(())
            }
            status => Err(DomainError::invalid_transition(
                status.to_string(),
                DepositStatus::Confirmed.to_string(),
            )),
        }
    }
}
