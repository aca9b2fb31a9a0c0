//! `rollstock-core`: shared domain building blocks.
//!
//! Pure domain primitives only (no IO, no HTTP, no storage).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::RollId;
