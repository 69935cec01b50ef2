//! # Domain Errors
//!
//! Typed error definitions for the domain layer.

pub mod arithmetic_error;
pub mod domain_error;

pub use arithmetic_error::{ArithmeticError, ArithmeticResult};
pub use domain_error::{DomainError, DomainResult};
