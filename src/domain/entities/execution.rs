//! # Execution Record Entity
//!
//! The state of one run of a route.
//!
//! # State Machine
//!
//! ```text
//! PendingApproval → Executing → Completed
//!                      ↓ ↻
//!                   Failed
//! ```
//!
//! A failing step with an unconsumed fallback route re-enters Executing
//! with the fallback as the active route, `current_step` reset and the
//! hash list cleared. At most one fallback is consumed per execution;
//! a second failure is terminal.

use crate::domain::entities::Route;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{ExecutionId, QuoteId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default execution record time-to-live in seconds.
pub const EXECUTION_TTL_SECS: i64 = 86_400;

/// Execution lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Waiting for approval (routes with an OTC leg).
    PendingApproval,
    /// The driver is working through the steps.
    Executing,
    /// All steps done (terminal).
    Completed,
    /// Irrecoverable error (terminal).
    Failed,
}

impl ExecutionStatus {
    /// Returns true for terminal statuses.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Executing => "EXECUTING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of [`ExecutionRecord::fail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// The record is terminally failed.
    Failed,
    /// The fallback route was engaged; the record is Executing again
    /// from step zero.
    FallbackEngaged,
}

/// The state of one run of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Execution identifier.
    pub execution_id: ExecutionId,
    /// The quote being executed.
    pub quote_id: QuoteId,
    /// The active route. Swapped for the fallback when engaged.
    pub route: Route,
    /// Alternative route, consumed on the first step failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_route: Option<Route>,
    /// True once the fallback has been engaged; a later failure is final.
    #[serde(default)]
    pub fallback_consumed: bool,
    /// Lifecycle status.
    pub status: ExecutionStatus,
    /// Token required to approve a PendingApproval execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_token: Option<String>,
    /// One transaction hash per completed step of the active route.
    pub transaction_hashes: Vec<String>,
    /// Index of the next step to run.
    pub current_step: usize,
    /// Creation instant.
    pub created_at: Timestamp,
    /// Completion instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Terminal error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionRecord {
    /// Creates an execution for a route.
    ///
    /// Routes with an OTC leg start in PendingApproval with a generated
    /// approval token; pure DEX routes start Executing.
    #[must_use]
    pub fn new(
        quote_id: QuoteId,
        route: Route,
        fallback_route: Option<Route>,
        now: Timestamp,
    ) -> Self {
        let (status, approval_token) = if route.has_otc_step() {
            (
                ExecutionStatus::PendingApproval,
                Some(Uuid::new_v4().simple().to_string()),
            )
        } else {
            (ExecutionStatus::Executing, None)
        };
        Self {
            execution_id: ExecutionId::new_v4(),
            quote_id,
            route,
            fallback_route,
            fallback_consumed: false,
            status,
            approval_token,
            transaction_hashes: Vec::new(),
            current_step: 0,
            created_at: now,
            completed_at: None,
            error: None,
        }
    }

    /// Approves a PendingApproval execution with its token.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ApprovalTokenMismatch` on a wrong token and
    /// an invalid-transition error from any other state.
    pub fn approve(&mut self, token: &str) -> DomainResult<()> {
        if self.status != ExecutionStatus::PendingApproval {
            return Err(DomainError::invalid_transition(
                self.status.to_string(),
                ExecutionStatus::Executing.to_string(),
            ));
        }
        if self.approval_token.as_deref() != Some(token) {
            return Err(DomainError::ApprovalTokenMismatch);
        }
        self.status = ExecutionStatus::Executing;
        Ok(())
    }

    /// Records a completed step and advances the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error when the record is not Executing or the cursor is
    /// already past the last step.
    pub fn advance_step(&mut self, tx_hash: impl Into<String>) -> DomainResult<()> {
        if self.status != ExecutionStatus::Executing {
            return Err(DomainError::not_allowed(format!(
                "cannot advance a {} execution",
                self.status
            )));
        }
        if self.current_step >= self.route.steps.len() {
            return Err(DomainError::not_allowed("all steps already recorded"));
        }
        self.transaction_hashes.push(tx_hash.into());
        self.current_step += 1;
        Ok(())
    }

    /// Returns true once every step of the active route has a hash.
    #[must_use]
    pub fn all_steps_done(&self) -> bool {
        self.current_step >= self.route.steps.len()
    }

    /// Completes the execution.
    ///
    /// # Errors
    ///
    /// Returns an error unless the record is Executing with all steps
    /// recorded.
    pub fn complete(&mut self, now: Timestamp) -> DomainResult<()> {
        if self.status != ExecutionStatus::Executing {
            return Err(DomainError::invalid_transition(
                self.status.to_string(),
                ExecutionStatus::Completed.to_string(),
            ));
        }
        if !self.all_steps_done() {
            return Err(DomainError::not_allowed(format!(
                "only {}/{} steps recorded",
                self.current_step,
                self.route.steps.len()
            )));
        }
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Fails the execution, optionally engaging the fallback route.
    ///
    /// With `use_fallback` and an unconsumed fallback present, the record
    /// swaps the fallback in as the active route, resets the cursor and
    /// hash list, and stays Executing. Otherwise it is terminally Failed.
    ///
    /// # Errors
    ///
    /// Returns an invalid-transition error from a terminal state.
    pub fn fail(&mut self, error: impl Into<String>, use_fallback: bool) -> DomainResult<FailOutcome> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(
                self.status.to_string(),
                ExecutionStatus::Failed.to_string(),
            ));
        }
        if use_fallback && !self.fallback_consumed {
            if let Some(fallback) = self.fallback_route.take() {
                self.route = fallback;
                self.fallback_consumed = true;
                self.current_step = 0;
                self.transaction_hashes.clear();
                self.status = ExecutionStatus::Executing;
                self.error = None;
                return Ok(FailOutcome::FallbackEngaged);
            }
        }
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        Ok(FailOutcome::Failed)
    }
}
