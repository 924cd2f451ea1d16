//! Shared building blocks for the shelfwise crates.
//!
//! Identifiers and the domain error model used by the inventory and AI crates.
//! No IO, no HTTP, no storage.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{BookId, BranchId};
