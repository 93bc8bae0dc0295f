use crate::enums::FlowDirection;
use crate::error::CoreError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the account a cashflow belongs to. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Owner(String);

impl Owner {
    /// Creates an owner from user input, trimming surrounding whitespace.
    pub fn new(name: impl AsRef<str>) -> Result<Self, CoreError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidInput(
                "owner".to_string(),
                "must not be blank".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when a stored, untyped owner column names this owner.
    pub fn matches(&self, raw: &str) -> bool {
        raw.trim() == self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Owner {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Owner::new(value)
    }
}

impl From<Owner> for String {
    fn from(owner: Owner) -> Self {
        owner.0
    }
}

/// A row exactly as it sits in the shared store.
///
/// Nothing is parsed here: a row with a bad date or amount is still a stored row,
/// it is only left out when a ledger is built for computation. Missing columns
/// read as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub amount: String,
}

impl RawRow {
    pub fn new(owner: impl Into<String>, date: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            date: date.into(),
            amount: amount.into(),
        }
    }
}

/// A validated, dated cash movement.
///
/// Negative amounts are capital contributed, positive amounts are capital returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashflowRecord {
    pub owner: Owner,
    pub date: NaiveDate,
    pub amount: Decimal,
}

impl CashflowRecord {
    pub fn new(owner: Owner, date: NaiveDate, amount: Decimal) -> Self {
        Self { owner, date, amount }
    }

    pub fn direction(&self) -> FlowDirection {
        FlowDirection::of(self.amount)
    }

    /// Turns the record back into a storable row using ISO-8601 dates.
    pub fn to_raw(&self) -> RawRow {
        RawRow {
            owner: self.owner.to_string(),
            date: self.date.format("%Y-%m-%d").to_string(),
            amount: self.amount.normalize().to_string(),
        }
    }
}
