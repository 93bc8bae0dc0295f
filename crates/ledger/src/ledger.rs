use crate::parsing::{parse_amount, DateParser};
use core_types::{CashflowRecord, Owner, RawRow};
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// An in-memory, validated collection of cashflow records.
///
/// A ledger is rebuilt from the stored rows for every request and never touches
/// storage itself. Records keep the order in which they were loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CashflowLedger {
    records: Vec<CashflowRecord>,
    rejected: usize,
}

impl CashflowLedger {
    /// Validates raw rows with the default date formats.
    pub fn load<I>(rows: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<RawRow>,
    {
        Self::load_with(rows, &DateParser::default())
    }

    /// Validates raw rows, dropping any row whose owner is blank, whose date
    /// cannot be parsed, or whose amount is not numeric.
    ///
    /// Never fails: malformed input degrades to a partial or empty ledger.
    pub fn load_with<I>(rows: I, parser: &DateParser) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<RawRow>,
    {
        let mut ledger = Self::default();

        for row in rows {
            let row = row.borrow();
            match Self::validate(row, parser) {
                Ok(record) => ledger.records.push(record),
                Err(reason) => {
                    ledger.rejected += 1;
                    tracing::debug!(
                        owner = %row.owner,
                        date = %row.date,
                        amount = %row.amount,
                        reason,
                        "Dropping malformed cashflow row."
                    );
                }
            }
        }

        ledger
    }

    fn validate(row: &RawRow, parser: &DateParser) -> Result<CashflowRecord, &'static str> {
        let owner = Owner::new(&row.owner).map_err(|_| "blank owner")?;
        let date = parser.parse(&row.date).ok_or("unparseable date")?;
        let amount = parse_amount(&row.amount).ok_or("non-numeric amount")?;
        Ok(CashflowRecord::new(owner, date, amount))
    }

    /// Builds a ledger from records that are already validated.
    pub fn from_records(records: Vec<CashflowRecord>) -> Self {
        Self {
            records,
            rejected: 0,
        }
    }

    /// The subsequence of records belonging to `owner`, in their original order.
    pub fn filter_by_owner(&self, owner: &Owner) -> Self {
        Self {
            records: self
                .records
                .iter()
                .filter(|r| &r.owner == owner)
                .cloned()
                .collect(),
            rejected: 0,
        }
    }

    /// Records in ascending date order.
    ///
    /// The sort is stable, so records sharing a date keep their load order.
    pub fn sorted_by_date(&self) -> Vec<&CashflowRecord> {
        let mut sorted: Vec<&CashflowRecord> = self.records.iter().collect();
        sorted.sort_by_key(|r| r.date);
        sorted
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[CashflowRecord] {
        &self.records
    }

    /// How many input rows were dropped during validation.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Every owner present in the ledger with their record count, sorted by name.
    pub fn owners(&self) -> BTreeMap<Owner, usize> {
        let mut owners = BTreeMap::new();
        for record in &self.records {
            *owners.entry(record.owner.clone()).or_insert(0) += 1;
        }
        owners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn rows() -> Vec<RawRow> {
        vec![
            RawRow::new("alice", "2023-06-01", "500"),
            RawRow::new("bob", "2023-01-01", "-200"),
            RawRow::new("alice", "2023-01-01", "-1000"),
            RawRow::new("alice", "not a date", "-5"),
            RawRow::new("alice", "2023-03-01", "abc"),
            RawRow::new("  ", "2023-03-01", "-1"),
            RawRow::new("alice", "2023-01-01", "-250"),
        ]
    }

    #[test]
    fn load_drops_malformed_rows_without_failing() {
        let ledger = CashflowLedger::load(rows());
        assert_eq!(ledger.len(), 4);
        assert_eq!(ledger.rejected(), 3);
    }

    #[test]
    fn load_of_garbage_is_an_empty_ledger() {
        let ledger = CashflowLedger::load(vec![RawRow::new("", "", "")]);
        assert!(ledger.is_empty());
        assert_eq!(ledger.rejected(), 1);
    }

    #[test]
    fn filter_keeps_relative_order() {
        let ledger = CashflowLedger::load(rows());
        let alice = ledger.filter_by_owner(&Owner::new("alice").unwrap());
        let amounts: Vec<_> = alice.records().iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![dec!(500), dec!(-1000), dec!(-250)]);
    }

    #[test]
    fn sort_is_stable_for_same_day_records() {
        let ledger = CashflowLedger::load(rows()).filter_by_owner(&Owner::new("alice").unwrap());
        let sorted: Vec<_> = ledger
            .sorted_by_date()
            .into_iter()
            .map(|r| (r.date, r.amount))
            .collect();
        let jan1 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let jun1 = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        assert_eq!(
            sorted,
            vec![(jan1, dec!(-1000)), (jan1, dec!(-250)), (jun1, dec!(500))]
        );
    }

    #[test]
    fn duplicate_records_are_kept() {
        let ledger = CashflowLedger::load(vec![
            RawRow::new("alice", "2023-01-01", "-100"),
            RawRow::new("alice", "2023-01-01", "-100"),
        ]);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn owners_are_counted() {
        let owners = CashflowLedger::load(rows()).owners();
        assert_eq!(owners.get(&Owner::new("alice").unwrap()), Some(&3));
        assert_eq!(owners.get(&Owner::new("bob").unwrap()), Some(&1));
    }
}
