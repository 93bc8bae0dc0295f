use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Formats tried, in order, when no explicit list is configured.
///
/// ISO-8601 comes first. Slash and dash locale dates are read day-first.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%b %d, %Y",
];

/// Parses the date column of stored rows against an ordered list of formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParser {
    formats: Vec<String>,
}

impl Default for DateParser {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()))
    }
}

impl DateParser {
    pub fn new<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            formats: formats.into_iter().map(Into::into).collect(),
        }
    }

    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    /// Returns the first successful interpretation of `raw`, or `None`.
    ///
    /// Time-of-day and offsets are discarded. Full RFC 3339 timestamps are
    /// accepted regardless of the configured formats.
    pub fn parse(&self, raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        self.formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.date_naive())
            })
    }
}

/// Largest accepted magnitude of a single amount, in whole currency units.
///
/// Keeps the sum of any realistic number of rows inside the `Decimal` range.
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000_000_000;

/// Coerces a stored amount into a decimal.
///
/// Surrounding whitespace and thousands separators are ignored; scientific
/// notation is accepted. Anything else, or anything larger in magnitude than
/// [`MAX_AMOUNT_UNITS`], is not a valid amount.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
        .filter(|amount| amount.abs() <= Decimal::from(MAX_AMOUNT_UNITS))
}
