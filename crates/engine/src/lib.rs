//! # Cashflow Engine
//!
//! Wires the ledger store, the validated ledger and the metrics engine together.
//! Each call reads the store afresh; nothing is cached between calls.

use analytics::{MetricsEngine, PerformanceReport};
use chrono::NaiveDate;
use core_types::{CashflowRecord, Owner, RawRow};
use database::{LedgerStore, Revision, StoreSnapshot};
use ledger::{CashflowLedger, DateParser};
use rust_decimal::Decimal;
use std::sync::Arc;

pub mod error;
pub mod reconciler;

pub use error::EngineError;
pub use reconciler::reconcile;

/// A report together with the store revision it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerReport {
    pub owner: Owner,
    pub report: PerformanceReport,
    /// Pass this back to [`LedgerService::replace`] to detect concurrent edits.
    pub revision: Revision,
    /// Stored rows of this owner that were left out of the computation.
    pub rejected_rows: usize,
}

/// The entry point used by front-ends: read, compute, edit, write back.
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    metrics: MetricsEngine,
    parser: DateParser,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, metrics: MetricsEngine, parser: DateParser) -> Self {
        Self {
            store,
            metrics,
            parser,
        }
    }

    pub fn metrics(&self) -> &MetricsEngine {
        &self.metrics
    }

    /// Loads `owner`'s rows and computes their performance report.
    pub fn report(&self, owner: &Owner) -> Result<OwnerReport, EngineError> {
        let snapshot = self.store.load(Some(owner))?;
        let ledger = CashflowLedger::load_with(&snapshot.rows, &self.parser);
        if ledger.rejected() > 0 {
            tracing::info!(%owner, rejected = ledger.rejected(), "Some stored rows were excluded from the report.");
        }

        Ok(OwnerReport {
            owner: owner.clone(),
            report: self.metrics.report_for_owner(&ledger, owner),
            revision: snapshot.revision,
            rejected_rows: ledger.rejected(),
        })
    }

    /// Every owner with at least one valid record, and how many records they have.
    pub fn owners(&self) -> Result<Vec<(Owner, usize)>, EngineError> {
        let snapshot = self.store.load(None)?;
        let ledger = CashflowLedger::load_with(&snapshot.rows, &self.parser);
        Ok(ledger.owners().into_iter().collect())
    }

    /// The stored rows of `owner`, as an editing session would start from them.
    pub fn rows(&self, owner: &Owner) -> Result<StoreSnapshot, EngineError> {
        Ok(self.store.load(Some(owner))?)
    }

    /// Appends one cashflow to `owner`'s rows.
    pub fn append(
        &self,
        owner: &Owner,
        date: NaiveDate,
        amount: Decimal,
    ) -> Result<Revision, EngineError> {
        let snapshot = self.store.load(None)?;
        let mut rows = snapshot.rows;
        rows.push(CashflowRecord::new(owner.clone(), date, amount).to_raw());

        let revision = self.store.save(&rows, snapshot.revision)?;
        tracing::info!(%owner, %date, %amount, %revision, "Appended cashflow.");
        Ok(revision)
    }

    /// Replaces all of `owner`'s rows with `edited`.
    ///
    /// `expected` is the revision the editing session started from. When it is
    /// given and the store has moved on, the edit is refused with a conflict
    /// rather than overwriting whatever was saved in between. The save itself is
    /// always a compare-and-swap against the revision read here.
    pub fn replace(
        &self,
        owner: &Owner,
        edited: Vec<RawRow>,
        expected: Option<Revision>,
    ) -> Result<Revision, EngineError> {
        let snapshot = self.store.load(None)?;
        if let Some(expected) = expected {
            if expected != snapshot.revision {
                tracing::warn!(%owner, %expected, actual = %snapshot.revision, "Edit session is stale.");
                return Err(database::DbError::Conflict {
                    expected,
                    actual: snapshot.revision,
                }
                .into());
            }
        }

        let previous = snapshot.rows.iter().filter(|r| owner.matches(&r.owner)).count();
        let submitted = edited.len();
        let merged = reconcile(&snapshot.rows, owner, edited);

        let revision = self.store.save(&merged, snapshot.revision)?;
        tracing::info!(%owner, previous, submitted, %revision, "Replaced owner's cashflows.");
        Ok(revision)
    }
}
