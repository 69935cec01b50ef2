//! # API Layer
//!
//! External interfaces. The REST surface under `/routing` is the only
//! one today; the deposit notifier calls back into it.

pub mod rest;

pub use rest::{AppState, create_router};
