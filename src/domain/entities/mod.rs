//! # Domain Entities
//!
//! The records moving through the routing and settlement pipeline.
//!
//! - [`EdgeQuote`]: one venue's price for one directed token pair
//! - [`Route`]: an ordered list of 1-3 hops with aggregates
//! - [`ProvisionalQuote`] / [`ReservedQuote`]: the pre-execution quote
//!   lifecycle
//! - [`DepositRecord`] / [`DepositInstructions`]: the off-chain funding leg
//! - [`ExecutionRecord`]: the state of one run of a route

pub mod deposit;
pub mod edge_quote;
pub mod execution;
pub mod quote_lifecycle;
pub mod route;

pub use deposit::{
    AccountDetails, AMOUNT_TOLERANCE, DEPOSIT_TTL_SECS, DepositInstructions, DepositRecord,
    DepositStatus,
};
pub use edge_quote::{EdgeQuote, EdgeQuoteBuilder, SettlementMeta, VenueKind};
pub use execution::{
    EXECUTION_TTL_SECS, ExecutionRecord, ExecutionStatus, FailOutcome,
};
pub use quote_lifecycle::{
    OtcReservationMeta, PROVISIONAL_TTL_SECS, ProvisionalQuote, QuoteKind, RESERVATION_TTL_SECS,
    ReservedQuote, ScoringMeta,
};
pub use route::{DEX_CHAIN_ID, DEX_STEP_DURATION_MS, Route, RouteStep};
