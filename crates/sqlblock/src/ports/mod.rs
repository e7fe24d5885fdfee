//! # Ports Layer
//!
//! ## Hexagonal Architecture
//!
//! - `inbound.rs` - Driving port (what callers submit blocks through)
//! - `outbound.rs` - Driven port (the storage engine that runs statements)

pub mod inbound;
pub mod outbound;
