//! `workify-core` — shared building blocks for the Workify HR backend.
//!
//! This crate contains **pure** primitives (no HTTP, no storage).

pub mod error;
pub mod id;
pub mod time;

pub use error::{DomainError, DomainResult};
pub use id::RecordId;
pub use time::{EpochMillis, now_millis};
