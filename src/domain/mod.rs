//! # Domain Layer
//!
//! Pure business types: validated value objects, the entities of the
//! routing and settlement pipeline, and typed domain errors. No I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;
