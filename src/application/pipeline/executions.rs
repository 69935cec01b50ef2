//! # Execution Records and Driver
//!
//! Persists execution records, applies the approval and fallback rules,
//! and drives an Executing record through its steps asynchronously.
//!
//! The driver is fire-and-forget: the HTTP surface returns the current
//! record immediately and the spawned task works through the steps via
//! the injected [`StepExecutor`], appending one transaction hash per
//! completed step. A step failure engages the fallback route (once) and
//! restarts from step zero; a second failure leaves the record FAILED.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::entities::{
    EXECUTION_TTL_SECS, ExecutionRecord, ExecutionStatus, FailOutcome, Route, RouteStep,
};
use crate::domain::value_objects::{ExecutionId, QuoteId};
use crate::infrastructure::clock::Clock;
use crate::infrastructure::store::{KeyValueStore, keys};
use async_trait::async_trait;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Error raised by a step executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("step execution failed: {0}")]
pub struct StepError(pub String);

/// Result of one executed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Transaction hash (or settlement reference) of the step.
    pub tx_hash: String,
}

/// Port performing one route step against the outside world.
///
/// The production implementation settles on-chain swaps and OTC legs;
/// the simulator stands in until it exists and for tests.
#[async_trait]
pub trait StepExecutor: Send + Sync + fmt::Debug {
    /// Executes one step and returns its transaction hash.
    ///
    /// # Errors
    ///
    /// Returns a [`StepError`] describing the failure.
    async fn execute(&self, step: &RouteStep) -> Result<StepOutcome, StepError>;
}

/// Simulator returning a random hash after a configurable delay.
#[derive(Debug)]
pub struct SimulatedStepExecutor {
    delay: Duration,
}

impl SimulatedStepExecutor {
    /// Creates a simulator pausing `delay` per step.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Production-shaped default: roughly the latency of a confirmed
    /// on-chain swap.
    #[must_use]
    pub fn with_default_delay() -> Self {
        Self::new(Duration::from_secs(2))
    }

    fn random_hash() -> String {
        let mut rng = rand::rng();
        let bytes: [u8; 32] = rng.random();
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        format!("0x{}", hex)
    }
}

#[async_trait]
impl StepExecutor for SimulatedStepExecutor {
    async fn execute(&self, step: &RouteStep) -> Result<StepOutcome, StepError> {
        tokio::time::sleep(self.delay).await;
        info!(
            venue = %step.venue_id,
            from = %step.from_token,
            to = %step.to_token,
            "simulated step settled"
        );
        Ok(StepOutcome {
            tx_hash: Self::random_hash(),
        })
    }
}

/// Execution lifecycle service over the store.
#[derive(Clone)]
pub struct ExecutionService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    executor: Arc<dyn StepExecutor>,
}

impl fmt::Debug for ExecutionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionService").finish_non_exhaustive()
    }
}

impl ExecutionService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        executor: Arc<dyn StepExecutor>,
    ) -> Self {
        Self {
            store,
            clock,
            executor,
        }
    }

    /// Creates and persists an execution record for a reserved quote's
    /// route, indexing it by quote id.
    ///
    /// # Errors
    ///
    /// Returns a store or serialization error.
    pub async fn create_execution(
        &self,
        quote_id: QuoteId,
        route: Route,
        fallback_route: Option<Route>,
    ) -> ApplicationResult<ExecutionRecord> {
        let record = ExecutionRecord::new(quote_id, route, fallback_route, self.clock.now());
        self.persist(&record).await?;
        self.store
            .set(
                &keys::execution_by_quote(&quote_id),
                &record.execution_id.to_string(),
                Some(Duration::from_secs(EXECUTION_TTL_SECS as u64)),
            )
            .await?;
        Ok(record)
    }

    /// Reads an execution record.
    ///
    /// # Errors
    ///
    /// Returns a store or serialization error.
    pub async fn get_execution(
        &self,
        execution_id: &ExecutionId,
    ) -> ApplicationResult<Option<ExecutionRecord>> {
        let Some(value) = self.store.get(&keys::execution(execution_id)).await? else {
            return Ok(None);
        };
        let record = serde_json::from_str(&value)
            .map_err(|e| ApplicationError::serialization(e.to_string()))?;
        Ok(Some(record))
    }

    /// Resolves the execution for a quote through the index.
    ///
    /// # Errors
    ///
    /// Returns a store or serialization error.
    pub async fn get_by_quote(
        &self,
        quote_id: &QuoteId,
    ) -> ApplicationResult<Option<ExecutionRecord>> {
        let Some(execution_id) = self.store.get(&keys::execution_by_quote(quote_id)).await? else {
            return Ok(None);
        };
        let execution_id = parse_execution_id(&execution_id)?;
        self.get_execution(&execution_id).await
    }

    /// Approves a PendingApproval execution with its token.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing record and domain errors for a
    /// bad token or state.
    pub async fn approve_execution(
        &self,
        execution_id: &ExecutionId,
        token: &str,
    ) -> ApplicationResult<ExecutionRecord> {
        let mut record = self
            .get_execution(execution_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(format!("execution {}", execution_id)))?;
        record.approve(token)?;
        self.persist(&record).await?;
        Ok(record)
    }

    /// Fails an execution, engaging the fallback when requested.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing record and domain errors for
    /// terminal states.
    pub async fn fail_execution(
        &self,
        execution_id: &ExecutionId,
        error_message: &str,
        use_fallback: bool,
    ) -> ApplicationResult<(ExecutionRecord, FailOutcome)> {
        let mut record = self
            .get_execution(execution_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(format!("execution {}", execution_id)))?;
        let outcome = record.fail(error_message, use_fallback)?;
        self.persist(&record).await?;
        Ok((record, outcome))
    }

    /// Spawns the asynchronous step driver for an execution.
    ///
    /// Fire-and-forget: callers observe progress through the status
    /// endpoint. Spawn exactly once per Pending-to-Confirmed deposit
    /// transition; the deposit status gate upstream enforces that.
    pub fn spawn_driver(self: &Arc<Self>, execution_id: ExecutionId) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.drive(execution_id).await {
                error!(execution_id = %execution_id, error = %e, "execution driver aborted");
            }
        });
    }

    /// Works through the steps of an Executing record until it completes
    /// or fails terminally. The fallback restart loops back to step zero
    /// at most once, bounded by the record's fallback flag.
    async fn drive(&self, execution_id: ExecutionId) -> ApplicationResult<()> {
        loop {
            let mut record = self
                .get_execution(&execution_id)
                .await?
                .ok_or_else(|| {
                    ApplicationError::not_found(format!("execution {}", execution_id))
                })?;
            if record.status != ExecutionStatus::Executing {
                return Ok(());
            }

            let mut failed_step: Option<StepError> = None;
            while !record.all_steps_done() {
                let step = record.route.steps[record.current_step].clone();
                match self.executor.execute(&step).await {
                    Ok(outcome) => {
                        record.advance_step(outcome.tx_hash)?;
                        self.persist(&record).await?;
                    }
                    Err(e) => {
                        failed_step = Some(e);
                        break;
                    }
                }
            }

            match failed_step {
                None => {
                    record.complete(self.clock.now())?;
                    self.persist(&record).await?;
                    info!(execution_id = %execution_id, "execution completed");
                    return Ok(());
                }
                Some(step_error) => {
                    let outcome = record.fail(step_error.to_string(), true)?;
                    self.persist(&record).await?;
                    match outcome {
                        FailOutcome::FallbackEngaged => {
                            warn!(
                                execution_id = %execution_id,
                                error = %step_error,
                                "primary route failed, restarting on fallback"
                            );
                            // Loop re-reads the record and restarts from
                            // step zero on the fallback route.
                        }
                        FailOutcome::Failed => {
                            warn!(
                                execution_id = %execution_id,
                                error = %step_error,
                                "execution failed terminally"
                            );
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    async fn persist(&self, record: &ExecutionRecord) -> ApplicationResult<()> {
        let value = serde_json::to_string(record)
            .map_err(|e| ApplicationError::serialization(e.to_string()))?;
        self.store
            .set(
                &keys::execution(&record.execution_id),
                &value,
                Some(Duration::from_secs(EXECUTION_TTL_SECS as u64)),
            )
            .await?;
        Ok(())
    }
}

/// Parses the execution id stored in the quote index.
fn parse_execution_id(value: &str) -> ApplicationResult<ExecutionId> {
    uuid::Uuid::parse_str(value)
        .map(ExecutionId::new)
        .map_err(|e| ApplicationError::serialization(format!("bad execution index value: {e}")))
}
