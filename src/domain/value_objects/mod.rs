//! # Value Objects
//!
//! Immutable, validated building blocks of the domain model.
//!
//! - [`Amount`]: non-negative decimal amount with checked arithmetic
//! - [`FeeBps`]: basis-point fee in `[0, 10000]`
//! - [`Token`]: validated token symbol with rail classification
//! - [`Timestamp`]: epoch-millisecond instant
//! - Identity newtypes: [`QuoteId`], [`ReservationId`], [`DepositId`],
//!   [`ExecutionId`], [`VenueId`], [`ClientId`]

pub mod amount;
pub mod fee;
pub mod ids;
pub mod timestamp;
pub mod token;

pub use amount::Amount;
pub use fee::FeeBps;
pub use ids::{ClientId, DepositId, ExecutionId, QuoteId, ReservationId, VenueId};
pub use timestamp::Timestamp;
pub use token::{PaymentMethod, Token};
