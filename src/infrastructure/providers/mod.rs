//! # Quote Providers
//!
//! Pull-mode adapters that each expose one operation: return a fresh
//! snapshot of the edge quotes they know.
//!
//! Three kinds ship with the engine:
//!
//! - [`StaticBookProvider`]: a hand-curated book of OTC and DEX quotes
//! - [`SinglePairFxProvider`]: one HTTP request per pair, paced at
//!   >= 1.2 s between pairs to respect upstream rate limits
//! - [`BatchFxProvider`]: all pairs in one HTTP request
//!
//! The FX providers keep a process-local last-known-good snapshot so a
//! partial upstream outage degrades to the previous cycle's prices
//! instead of dropping pairs.

pub mod fx;
pub mod fx_batch;
pub mod fx_single;
pub mod http_client;
pub mod static_book;

pub use fx::{FxPair, FxRate, LastKnownGood};
pub use fx_batch::{BatchFxConfig, BatchFxProvider};
pub use fx_single::{SinglePairFxConfig, SinglePairFxProvider};
pub use http_client::HttpClient;
pub use static_book::{BookEntry, StaticBookProvider};

use crate::domain::entities::EdgeQuote;
use crate::domain::value_objects::VenueId;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error raised by a quote provider.
///
/// Provider failures are local: the prefetch orchestrator logs them and
/// the cycle continues with the other providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Transport failure, timeout or non-2xx response.
    #[error("provider http error: {0}")]
    Http(String),

    /// Upstream payload could not be decoded.
    #[error("provider parse error: {0}")]
    Parse(String),

    /// The provider produced an invalid quote.
    #[error("provider produced invalid quote: {0}")]
    InvalidQuote(String),

    /// Internal provider failure.
    #[error("provider internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Creates an HTTP error.
    #[must_use]
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http(message.into())
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates an invalid-quote error.
    #[must_use]
    pub fn invalid_quote(message: impl Into<String>) -> Self {
        Self::InvalidQuote(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Prefetch cadence tier a provider belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderTier {
    /// Polled on the short cadence (static books, DEX feeds).
    Fast,
    /// Polled on the long cadence (rate-limited HTTP FX feeds).
    Slow,
}

/// A source of edge quote snapshots.
///
/// Providers are stateless between calls except for optional in-process
/// last-known-good caches.
#[async_trait]
pub trait QuoteProvider: Send + Sync + fmt::Debug {
    /// The venue this provider quotes for.
    fn venue_id(&self) -> &VenueId;

    /// The prefetch tier this provider polls on.
    fn tier(&self) -> ProviderTier;

    /// Returns a fresh snapshot of the quotes this provider knows.
    ///
    /// # Errors
    ///
    /// Returns a provider error only on total failure with nothing to
    /// serve; partial failures degrade to the last-known-good snapshot.
    async fn fetch_quotes(&self) -> ProviderResult<Vec<EdgeQuote>>;
}
