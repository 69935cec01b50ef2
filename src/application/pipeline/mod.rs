//! # Quote-Deposit-Execution Pipeline
//!
//! The stateful heart of the engine: pricing requests into provisional
//! quotes, promoting them to reservations with deposit instructions, and
//! advancing confirmed deposits into asynchronous execution.
//!
//! [`RoutingPipeline`] is the facade the HTTP surface talks to; the
//! underlying services ([`QuoteService`], [`DepositService`],
//! [`ExecutionService`]) stay independently testable.

pub mod deposits;
pub mod executions;
pub mod pix;
pub mod quotes;

pub use deposits::{ConfirmOutcome, DepositConfig, DepositService};
pub use executions::{
    ExecutionService, SimulatedStepExecutor, StepError, StepExecutor, StepOutcome,
};
pub use quotes::{OtcDesk, QuoteService, SimulatedOtcDesk};

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::router::Router;
use crate::application::scorer::SettlementScorer;
use crate::domain::entities::{
    DepositRecord, ExecutionRecord, ExecutionStatus, ProvisionalQuote, ReservedQuote,
};
use crate::domain::value_objects::{Amount, ClientId, DepositId, ExecutionId, QuoteId, Token};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a successful reservation hands back to the client.
#[derive(Debug, Clone)]
pub struct ReservationBundle {
    /// The reservation, now the source of truth for the quote.
    pub reserved: ReservedQuote,
    /// The deposit record with its payment instructions.
    pub deposit: DepositRecord,
    /// The execution record awaiting the deposit.
    pub execution: ExecutionRecord,
}

/// Outcome of a deposit webhook delivery.
#[derive(Debug, Clone)]
pub struct WebhookOutcome {
    /// The confirmed deposit.
    pub deposit_id: DepositId,
    /// The execution the deposit advanced, when one exists.
    pub execution_id: Option<ExecutionId>,
}

/// Facade over the full quote lifecycle.
#[derive(Debug, Clone)]
pub struct RoutingPipeline {
    router: Arc<Router>,
    scorer: Arc<SettlementScorer>,
    quotes: Arc<QuoteService>,
    deposits: Arc<DepositService>,
    executions: Arc<ExecutionService>,
    otc_desk: Arc<dyn OtcDesk>,
}

impl RoutingPipeline {
    /// Creates the pipeline over its collaborating services.
    #[must_use]
    pub fn new(
        router: Arc<Router>,
        scorer: Arc<SettlementScorer>,
        quotes: Arc<QuoteService>,
        deposits: Arc<DepositService>,
        executions: Arc<ExecutionService>,
        otc_desk: Arc<dyn OtcDesk>,
    ) -> Self {
        Self {
            router,
            scorer,
            quotes,
            deposits,
            executions,
            otc_desk,
        }
    }

    /// Prices a conversion request into provisional quotes, best net
    /// output first. An unreachable pair prices to an empty list, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns store errors from the provisional write.
    pub async fn price(
        &self,
        amount_in: Amount,
        from: Token,
        to: Token,
        intermediates: &[Token],
        min_expiry_ms: i64,
    ) -> ApplicationResult<Vec<ProvisionalQuote>> {
        let search = self
            .router
            .best_route(amount_in, &from, &to, intermediates, min_expiry_ms)
            .await;

        let Some(route) = search.route else {
            info!(%from, %to, considered = search.considered_quotes, "no viable route");
            return Ok(Vec::new());
        };

        let gross = route.total_out;
        let scored = self
            .scorer
            .score(gross, &from, &to, &search.route_quotes);
        let quote = self
            .quotes
            .store_provisional(
                Some(route),
                search.fallback,
                from,
                to,
                amount_in,
                gross,
                scored,
            )
            .await?;

        // Single best candidate today; the contract stays list-shaped
        // and sorted by net output.
        Ok(vec![quote])
    }

    /// Reserves a provisional quote, issues deposit instructions and
    /// creates the execution record awaiting the deposit.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an absent or expired quote and
    /// `Validation` for a routeless one.
    pub async fn reserve(
        &self,
        quote_id: &QuoteId,
        client: ClientId,
    ) -> ApplicationResult<ReservationBundle> {
        let reserved = self
            .quotes
            .reserve(quote_id, client, self.otc_desk.as_ref())
            .await?;
        let route = reserved.quote.route.clone().ok_or_else(|| {
            ApplicationError::validation(format!("quote {} has no route to execute", quote_id))
        })?;

        let deposit = self.deposits.issue_deposit(&reserved).await?;
        let execution = self
            .executions
            .create_execution(
                reserved.quote.quote_id,
                route,
                reserved.quote.fallback_route.clone(),
            )
            .await?;

        info!(
            quote_id = %quote_id,
            reservation_id = %reserved.reservation_id,
            execution_id = %execution.execution_id,
            "quote reserved"
        );
        Ok(ReservationBundle {
            reserved,
            deposit,
            execution,
        })
    }

    /// Applies a deposit notification and, on the Pending to Confirmed
    /// transition, releases the execution to the driver.
    ///
    /// Idempotent on the payment reference: a re-delivered confirmation
    /// re-applies the record and does not re-trigger execution.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown reference; the webhook handler
    /// maps that to a 2xx `success: false` response per the notifier
    /// contract.
    pub async fn handle_deposit_notification(
        &self,
        payment_reference: &str,
        amount_received: Amount,
        bank_tx_id: Option<String>,
    ) -> ApplicationResult<WebhookOutcome> {
        let outcome = self
            .deposits
            .confirm_deposit(payment_reference, amount_received, bank_tx_id)
            .await?;

        let execution_id = self
            .executions
            .get_by_quote(&outcome.record.quote_id)
            .await?
            .map(|e| e.execution_id);

        if !outcome.newly_confirmed {
            // Re-delivery: report the existing state, advance nothing.
            return Ok(WebhookOutcome {
                deposit_id: outcome.record.deposit_id,
                execution_id,
            });
        }

        let execution_id = match self
            .executions
            .get_by_quote(&outcome.record.quote_id)
            .await?
        {
            Some(execution) => Some(self.release_execution(execution).await?),
            None => {
                warn!(
                    reference = payment_reference,
                    quote_id = %outcome.record.quote_id,
                    "confirmed deposit has no execution record"
                );
                None
            }
        };

        Ok(WebhookOutcome {
            deposit_id: outcome.record.deposit_id,
            execution_id,
        })
    }

    /// Reads the state of an execution.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub async fn execution_status(
        &self,
        execution_id: &ExecutionId,
    ) -> ApplicationResult<Option<ExecutionRecord>> {
        self.executions.get_execution(execution_id).await
    }

    /// Moves a waiting execution into Executing and spawns the driver.
    ///
    /// The confirmed deposit constitutes the approval for executions
    /// parked in PendingApproval.
    async fn release_execution(
        &self,
        execution: ExecutionRecord,
    ) -> ApplicationResult<ExecutionId> {
        let execution_id = execution.execution_id;
        match execution.status {
            ExecutionStatus::PendingApproval => {
                let token = execution.approval_token.clone().unwrap_or_default();
                self.executions
                    .approve_execution(&execution_id, &token)
                    .await?;
                self.executions.spawn_driver(execution_id);
            }
            ExecutionStatus::Executing => {
                self.executions.spawn_driver(execution_id);
            }
            status => {
                warn!(execution_id = %execution_id, %status, "deposit confirmed for a terminal execution");
            }
        }
        Ok(execution_id)
    }
}
