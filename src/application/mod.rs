//! # Application Layer
//!
//! The routing and settlement services: best-route search, settlement
//! scoring, prefetch orchestration and the quote-deposit-execution
//! pipeline.

pub mod error;
pub mod pipeline;
pub mod prefetch;
pub mod router;
pub mod scorer;

pub use error::{ApplicationError, ApplicationResult};
pub use pipeline::RoutingPipeline;
pub use prefetch::{PrefetchConfig, PrefetchOrchestrator};
pub use router::{RouteSearch, Router};
pub use scorer::{ScoringConfig, SettlementScorer};
