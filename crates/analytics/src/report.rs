use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a metric could not be computed for a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    /// No negative amounts, so there is no capital to measure a return against.
    NothingInvested,
    /// Fewer than two valid records.
    TooFewRecords,
    /// The first and last records share a date.
    NonPositiveSpan,
    /// Every non-zero amount has the same sign; no rate can discount them to zero.
    SameSignCashflows,
    /// The NPV derivative was exactly zero during Newton iteration.
    ZeroDerivative,
    /// Newton iteration did not settle within its iteration budget.
    NoConvergence,
    /// An intermediate value overflowed or was not a number.
    NonFiniteValue,
}

impl fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UndefinedReason::NothingInvested => "nothing invested",
            UndefinedReason::TooFewRecords => "fewer than two records",
            UndefinedReason::NonPositiveSpan => "no time elapsed between first and last record",
            UndefinedReason::SameSignCashflows => "all cashflows share one sign",
            UndefinedReason::ZeroDerivative => "solver derivative vanished",
            UndefinedReason::NoConvergence => "solver did not converge",
            UndefinedReason::NonFiniteValue => "non-finite intermediate value",
        };
        f.write_str(text)
    }
}

/// A ratio metric that is either a computed value or undefined for a stated reason.
///
/// Kept distinct internally so "a return of exactly zero" and "no return can be
/// computed" are never confused; [`Metric::value`] collapses both to `0.0` for
/// display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Metric {
    Computed(f64),
    Undefined(UndefinedReason),
}

impl Metric {
    /// Wraps a freshly computed number, rejecting NaN and infinities.
    pub fn finite(value: f64) -> Self {
        if value.is_finite() {
            Metric::Computed(value)
        } else {
            Metric::Undefined(UndefinedReason::NonFiniteValue)
        }
    }

    /// The value with `0.0` standing in for "undefined".
    pub fn value(&self) -> f64 {
        match self {
            Metric::Computed(v) => *v,
            Metric::Undefined(_) => 0.0,
        }
    }

    pub fn computed(&self) -> Option<f64> {
        match self {
            Metric::Computed(v) => Some(*v),
            Metric::Undefined(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Computed(_))
    }

    pub fn reason(&self) -> Option<UndefinedReason> {
        match self {
            Metric::Computed(_) => None,
            Metric::Undefined(reason) => Some(*reason),
        }
    }
}

/// Investment performance of one owner's ledger.
///
/// A pure projection of the ledger: it has no identity of its own and is rebuilt
/// whenever the ledger changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    // I. Shape of the ledger
    pub record_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,

    // II. Capital
    /// Sum of the magnitudes of all negative amounts.
    pub invested: Decimal,
    /// Sum of all positive amounts.
    pub withdrawn: Decimal,
    /// Invested capital plus the net cashflow.
    pub net_value: Decimal,
    pub profit: Decimal,

    // III. Returns
    pub absolute_return: Metric,
    pub cagr: Metric,
    pub xirr: Metric,
}

impl PerformanceReport {
    /// Creates the report of an empty ledger.
    pub fn new() -> Self {
        Self {
            record_count: 0,
            first_date: None,
            last_date: None,
            invested: Decimal::ZERO,
            withdrawn: Decimal::ZERO,
            net_value: Decimal::ZERO,
            profit: Decimal::ZERO,
            absolute_return: Metric::Undefined(UndefinedReason::NothingInvested),
            cagr: Metric::Undefined(UndefinedReason::TooFewRecords),
            xirr: Metric::Undefined(UndefinedReason::TooFewRecords),
        }
    }

    /// The flat output shape handed to renderers, with `0.0` for undefined ratios.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            invested: self.invested,
            net_value: self.net_value,
            profit: self.profit,
            absolute_return: self.absolute_return.value(),
            cagr: self.cagr.value(),
            xirr: self.xirr.value(),
        }
    }
}

impl Default for PerformanceReport {
    fn default() -> Self {
        Self::new()
    }
}

/// The externally visible report: monetary values plus sentinel-valued fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub invested: Decimal,
    pub net_value: Decimal,
    pub profit: Decimal,
    pub absolute_return: f64,
    pub cagr: f64,
    pub xirr: f64,
}

/// Converts a decimal amount to `f64`, yielding NaN if it cannot be represented.
pub(crate) fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(f64::NAN)
}
