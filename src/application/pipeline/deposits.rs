//! # Deposit Issuance and Confirmation
//!
//! Issues off-chain deposit instructions for a reservation and applies
//! idempotent deposit confirmations arriving over the webhook.
//!
//! The record lives under two keys for one hour: `deposit:{id}` holds
//! the record and `deposit:ref:{reference}` indexes it by the payment
//! reference banks echo back. The two writes are not atomic; the index
//! TTL matches the record TTL so an orphan self-heals.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::pipeline::pix;
use crate::domain::entities::{
    AccountDetails, DEPOSIT_TTL_SECS, DepositInstructions, DepositRecord, DepositStatus,
    ReservedQuote,
};
use crate::domain::value_objects::{Amount, DepositId, PaymentMethod};
use crate::infrastructure::clock::Clock;
use crate::infrastructure::store::{KeyValueStore, keys};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Injected banking configuration: where payers send money, per rail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositConfig {
    /// Account details per payment method.
    pub accounts: HashMap<PaymentMethod, AccountDetails>,
    /// Merchant name rendered into PIX BR Codes.
    pub pix_merchant_name: String,
    /// Merchant city rendered into PIX BR Codes.
    pub pix_merchant_city: String,
}

impl Default for DepositConfig {
    fn default() -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(
            PaymentMethod::Pix,
            AccountDetails {
                bank_name: "Banco Plural".to_string(),
                account_holder: "Corridor Pagamentos LTDA".to_string(),
                account_number: None,
                pix_key: Some("treasury@corridor.example".to_string()),
                swift_code: None,
            },
        );
        accounts.insert(
            PaymentMethod::Spei,
            AccountDetails {
                bank_name: "STP".to_string(),
                account_holder: "Corridor Pagos SA de CV".to_string(),
                account_number: Some("646180157000000004".to_string()),
                pix_key: None,
                swift_code: None,
            },
        );
        accounts.insert(
            PaymentMethod::BankTransfer,
            AccountDetails {
                bank_name: "Evolve Bank & Trust".to_string(),
                account_holder: "Corridor Inc".to_string(),
                account_number: Some("9800012345".to_string()),
                pix_key: None,
                swift_code: Some("EVOLUS44".to_string()),
            },
        );
        Self {
            accounts,
            pix_merchant_name: "Corridor Pagamentos".to_string(),
            pix_merchant_city: "SAO PAULO".to_string(),
        }
    }
}

/// Parses the deposit id string stored in the reference index.
fn parse_deposit_id(value: &str) -> ApplicationResult<DepositId> {
    uuid::Uuid::parse_str(value)
        .map(DepositId::new)
        .map_err(|e| ApplicationError::serialization(format!("bad deposit index value: {e}")))
}

/// Outcome of applying a deposit confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmOutcome {
    /// The record after the confirmation.
    pub record: DepositRecord,
    /// True when this call performed the Pending to Confirmed
    /// transition; false for an idempotent re-delivery.
    pub newly_confirmed: bool,
}

/// Deposit lifecycle service over the store.
#[derive(Debug, Clone)]
pub struct DepositService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: DepositConfig,
}

impl DepositService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: DepositConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Derives the payment reference for a reservation:
    /// `r{reservation_id[:8]}-{client_id[:8]}`.
    #[must_use]
    pub fn payment_reference(reserved: &ReservedQuote) -> String {
        format!(
            "r{}-{}",
            reserved.reservation_id.short(),
            reserved.reserved_by.short()
        )
    }

    /// Issues deposit instructions for a reservation and persists the
    /// pending record under both keys.
    ///
    /// # Errors
    ///
    /// Returns a store or serialization error.
    pub async fn issue_deposit(
        &self,
        reserved: &ReservedQuote,
    ) -> ApplicationResult<DepositRecord> {
        let method = reserved.quote.from_token.payment_method();
        let account_details = self
            .config
            .accounts
            .get(&method)
            .cloned()
            .unwrap_or_default();
        let payment_reference = Self::payment_reference(reserved);

        let qr_code_data = match (&method, &account_details.pix_key) {
            (PaymentMethod::Pix, Some(key)) => Some(pix::br_code(
                key,
                &self.config.pix_merchant_name,
                &self.config.pix_merchant_city,
                reserved.quote.amount_in.get(),
                &payment_reference,
            )),
            _ => None,
        };

        let instructions = DepositInstructions {
            method,
            account_details,
            amount: reserved.quote.amount_in,
            payment_reference,
            qr_code_data,
            deposit_expiry_ts: reserved.reserved_until_ts,
        };

        let record = DepositRecord::pending(
            reserved.quote.quote_id,
            reserved.reserved_by.clone(),
            instructions,
        );
        self.persist(&record).await?;
        self.store
            .set(
                &keys::deposit_reference(&record.payment_reference),
                &record.deposit_id.to_string(),
                Some(Duration::from_secs(DEPOSIT_TTL_SECS as u64)),
            )
            .await?;
        Ok(record)
    }

    /// Applies a deposit confirmation arriving from the bank notifier.
    ///
    /// Amount mismatches beyond 0.1% of the expected amount are warned
    /// and admitted (banking fees shave transfers). Re-delivery of a
    /// confirmation is idempotent: the record content is re-applied and
    /// `newly_confirmed` is false so execution is not re-triggered.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown reference and domain errors for
    /// terminal records.
    pub async fn confirm_deposit(
        &self,
        payment_reference: &str,
        amount_received: Amount,
        bank_tx_id: Option<String>,
    ) -> ApplicationResult<ConfirmOutcome> {
        let deposit_id = self
            .store
            .get(&keys::deposit_reference(payment_reference))
            .await?
            .ok_or_else(|| {
                ApplicationError::not_found(format!("deposit reference {}", payment_reference))
            })?;
        let deposit_id = parse_deposit_id(&deposit_id)?;
        let Some(value) = self.store.get(&keys::deposit(&deposit_id)).await? else {
            return Err(ApplicationError::not_found(format!(
                "deposit {}",
                deposit_id
            )));
        };
        let mut record: DepositRecord = serde_json::from_str(&value)
            .map_err(|e| ApplicationError::serialization(e.to_string()))?;

        let was_confirmed = record.status == DepositStatus::Confirmed;
        if record.amount_mismatch(amount_received) {
            warn!(
                reference = payment_reference,
                expected = %record.amount_expected,
                received = %amount_received,
                "deposit amount outside tolerance, admitting"
            );
        }

        record.confirm(amount_received, self.clock.now(), bank_tx_id)?;
        self.persist(&record).await?;

        Ok(ConfirmOutcome {
            newly_confirmed: !was_confirmed,
            record,
        })
    }

    /// Reads a deposit record by its payment reference.
    ///
    /// # Errors
    ///
    /// Returns a store or serialization error.
    pub async fn get_by_reference(
        &self,
        payment_reference: &str,
    ) -> ApplicationResult<Option<DepositRecord>> {
        let Some(deposit_id) = self
            .store
            .get(&keys::deposit_reference(payment_reference))
            .await?
        else {
            return Ok(None);
        };
        let deposit_id = parse_deposit_id(&deposit_id)?;
        let Some(value) = self.store.get(&keys::deposit(&deposit_id)).await? else {
            return Ok(None);
        };
        let record = serde_json::from_str(&value)
            .map_err(|e| ApplicationError::serialization(e.to_string()))?;
        Ok(Some(record))
    }

    async fn persist(&self, record: &DepositRecord) -> ApplicationResult<()> {
        let value = serde_json::to_string(record)
            .map_err(|e| ApplicationError::serialization(e.to_string()))?;
        self.store
            .set(
                &keys::deposit(&record.deposit_id),
                &value,
                Some(Duration::from_secs(DEPOSIT_TTL_SECS as u64)),
            )
            .await?;
        Ok(())
    }
}
