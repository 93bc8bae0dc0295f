//! # Cashflow Core Types
//!
//! The shared vocabulary of the workspace: who owns a cashflow, what a stored row
//! looks like, and what a validated record looks like. Every other crate depends
//! on this one and this one depends on nothing in the workspace.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{DayCountBasis, FlowDirection};
pub use error::CoreError;
pub use structs::{CashflowRecord, Owner, RawRow};
