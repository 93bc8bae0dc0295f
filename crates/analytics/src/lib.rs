//! # Cashflow Analytics Engine
//!
//! Turns a ledger of dated cash movements into investment performance figures.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No I/O and no shared state. It depends only on `core-types`
//!   and the validated `CashflowLedger`.
//! - **Total:** `MetricsEngine::calculate` always returns a report. Metrics that
//!   cannot be computed are `Metric::Undefined` with a reason, and collapse to
//!   `0.0` only in `ReportSummary`.
//!
//! ## Public API
//!
//! - `MetricsEngine`: derives a `PerformanceReport` from a ledger.
//! - `XirrSolver`: Newton–Raphson solver for the internal rate of return.
//! - `PerformanceReport` / `ReportSummary`: the internal and external report shapes.
//! - `AnalyticsError`: raised only for invalid solver parameters.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;
pub mod xirr;

// Re-export the key components to create a clean, public-facing API.
pub use engine::MetricsEngine;
pub use error::AnalyticsError;
pub use report::{Metric, PerformanceReport, ReportSummary, UndefinedReason};
pub use xirr::{DatedAmount, SolverParams, XirrSolver};
