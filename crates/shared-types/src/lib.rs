//! # Shared Types Crate
//!
//! This crate contains the decoded block entity graph consumed by the
//! ingestion core (`sqlblock`).
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Block`, `Transaction` and `EventLog` are
//!   defined here and nowhere else.
//! - **Immutable Hand-off**: the decoder builds the graph once; the ingestion
//!   core only ever borrows it.
//! - **No Validation**: domain invariants (gas, sender, topic count) belong to
//!   the storage engine, not to these types.

pub mod entities;

pub use entities::*;
