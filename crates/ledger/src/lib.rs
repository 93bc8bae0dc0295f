//! # Cashflow Ledger
//!
//! Turns the untyped rows of the shared store into a validated, per-owner
//! collection of dated cash movements. This is a leaf crate with no I/O: rows go
//! in, records come out, and malformed rows are dropped rather than reported as
//! errors.

pub mod ledger;
pub mod parsing;

pub use ledger::CashflowLedger;
pub use parsing::{parse_amount, DateParser, DEFAULT_DATE_FORMATS, MAX_AMOUNT_UNITS};
