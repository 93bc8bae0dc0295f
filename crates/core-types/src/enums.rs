use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The economic meaning of a cashflow, derived from the sign of its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowDirection {
    /// Capital put into the investment (negative amount).
    Contribution,
    /// Capital taken out of the investment (positive amount).
    Return,
    /// A zero amount. Permitted, but it moves nothing.
    Inert,
}

impl FlowDirection {
    pub fn of(amount: Decimal) -> Self {
        if amount.is_zero() {
            FlowDirection::Inert
        } else if amount.is_sign_negative() {
            FlowDirection::Contribution
        } else {
            FlowDirection::Return
        }
    }

    /// The same classification for a floating-point amount. NaN moves nothing.
    pub fn of_f64(amount: f64) -> Self {
        if amount < 0.0 {
            FlowDirection::Contribution
        } else if amount > 0.0 {
            FlowDirection::Return
        } else {
            FlowDirection::Inert
        }
    }
}

/// How many days make up one year when converting date deltas to year fractions.
///
/// The same basis must be used for every metric inside a single report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DayCountBasis {
    /// 365 days per year.
    #[default]
    #[serde(alias = "365")]
    Actual365,
    /// 365.25 days per year, averaging leap years in.
    #[serde(alias = "365.25")]
    #[cfg_attr(feature = "clap", value(name = "actual365-25"))]
    Actual365_25,
}

impl DayCountBasis {
    pub fn days_per_year(&self) -> f64 {
        match self {
            DayCountBasis::Actual365 => 365.0,
            DayCountBasis::Actual365_25 => 365.25,
        }
    }

    /// Converts a whole number of days into a fraction of a year.
    pub fn years(&self, days: i64) -> f64 {
        days as f64 / self.days_per_year()
    }
}
