//! # Corridor
//!
//! Cross-currency routing engine for a cross-border payments platform.
//!
//! Given a request to convert an amount of a source token (fiat such as
//! BRL/MXN/NGN, or on-chain stablecoin such as USDC/USDT/EURC) into a
//! destination token, the engine discovers viable conversion paths
//! across heterogeneous venues (OTC desks, DEXes, FX rate feeds), scores
//! each path for settlement-delay and counterparty risk, and manages the
//! lifecycle of a selected quote through reservation, deposit
//! confirmation and step-wise execution with fallback retry.
//!
//! ## Architecture
//!
//! Layered:
//!
//! - **Domain** (`domain`): validated value objects, the entities of the
//!   routing and settlement pipeline, typed domain errors
//! - **Infrastructure** (`infrastructure`): the key-value store port and
//!   its adapters, the edge cache, the quote providers, the clock
//! - **Application** (`application`): the router, the settlement scorer,
//!   the prefetch orchestrator and the quote-deposit-execution pipeline
//! - **API** (`api`): the REST surface mounted under `/routing`
//!
//! ## Example
//!
//! ```rust,ignore
//! use corridor::application::RoutingPipeline;
//!
//! let quotes = pipeline
//!     .price(amount, from, to, &[], 5_000)
//!     .await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
