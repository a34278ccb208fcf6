//! Core business logic for Matrix.
//!
//! Each service composes one or more repositories from `matrix-db` and
//! owns the rules of its domain: validation, authorization of the acting
//! person, state transitions and the notifications they trigger.

pub mod services;

pub use services::*;
