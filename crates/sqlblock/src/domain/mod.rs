//! # Domain Layer
//!
//! Pure ingestion logic. No I/O happens here.
//!
//! ## Modules
//!
//! - `schema` - Relations, constraints and the PostgreSQL DDL
//! - `encoding` - Typed SQL values and the single literal renderer
//! - `statement` - The executable unit for one block
//! - `builder` - Block entity graph to `Statement`
//! - `classifier` - Engine outcome to `Ingested` / `IngestError`
//! - `value_objects` - Configuration
//! - `errors` - Domain error types

pub mod builder;
pub mod classifier;
pub mod encoding;
pub mod errors;
pub mod schema;
pub mod statement;
pub mod value_objects;
