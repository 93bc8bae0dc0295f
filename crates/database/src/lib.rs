//! # Cashflow Database Crate
//!
//! The persistence boundary of the system. The rest of the workspace only sees the
//! `LedgerStore` trait; which concrete store sits behind it is chosen by the
//! binary.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All file and CSV handling lives here. The metrics engine and the
//!   reconciler never perform I/O.
//! - **Whole-store writes with compare-and-swap:** Every save replaces the entire
//!   store and carries the `Revision` the caller read. A mismatch is reported as
//!   `DbError::Conflict` instead of silently dropping another session's writes.
//!
//! ## Public API
//!
//! - `LedgerStore`: the load/save capability.
//! - `InMemoryLedgerStore`: a mutex-guarded store for tests and embedding.
//! - `CsvLedgerStore`: a store backed by a single CSV file.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod csv_store;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use csv_store::CsvLedgerStore;
pub use error::DbError;
pub use repository::{InMemoryLedgerStore, LedgerStore, Revision, StoreSnapshot};
