//! # sqlblock Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Statement building and in-memory execution
//! └── integration/      # End-to-end ingestion scenarios
//!     ├── flows.rs      # In-memory engine, Prometheus recorder
//!     ├── decoding.rs   # JSON payloads through to storage
//!     ├── parity.rs     # Outcomes every executor must agree on
//!     └── postgres.rs   # Live database (needs SQLBLOCK_DATABASE_URL)
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sqlblock-tests
//!
//! # Against PostgreSQL
//! SQLBLOCK_DATABASE_URL=postgres://localhost/sqlblock_test cargo test -p sqlblock-tests postgres
//!
//! # Benchmarks
//! cargo bench -p sqlblock-tests
//! ```
