use crate::DbError;
use core_types::{Owner, RawRow};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

/// A version stamp of the whole store, used for compare-and-swap writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Revision(pub u64);

impl Revision {
    /// The revision of a store that has never been written.
    pub const INITIAL: Revision = Revision(0);
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for Revision {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s.trim(), 16).map(Revision)
    }
}

/// The rows read from a store together with the revision they were read at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreSnapshot {
    pub rows: Vec<RawRow>,
    pub revision: Revision,
}

/// The persistence capability the engine depends on.
///
/// Implementations keep every stored row, including rows the ledger would reject.
/// `save` replaces the entire store, and only if nobody else has written since
/// `expected` was read.
pub trait LedgerStore: Send + Sync {
    /// Reads the store, optionally keeping only `owner`'s rows.
    ///
    /// The revision always describes the whole store, filtered or not.
    fn load(&self, owner: Option<&Owner>) -> Result<StoreSnapshot, DbError>;

    /// Replaces the whole store with `rows` and returns the new revision.
    ///
    /// Fails with [`DbError::Conflict`] when the store is no longer at `expected`.
    fn save(&self, rows: &[RawRow], expected: Revision) -> Result<Revision, DbError>;
}

/// Keeps only the rows whose owner column names `owner`.
pub(crate) fn filter_rows(rows: Vec<RawRow>, owner: Option<&Owner>) -> Vec<RawRow> {
    match owner {
        Some(owner) => rows.into_iter().filter(|r| owner.matches(&r.owner)).collect(),
        None => rows,
    }
}

/// A store held entirely in memory. The revision counts successful saves.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: Mutex<StoreSnapshot>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `rows` at revision 1.
    pub fn with_rows(rows: Vec<RawRow>) -> Self {
        Self {
            state: Mutex::new(StoreSnapshot {
                rows,
                revision: Revision(1),
            }),
        }
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn load(&self, owner: Option<&Owner>) -> Result<StoreSnapshot, DbError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(StoreSnapshot {
            rows: filter_rows(state.rows.clone(), owner),
            revision: state.revision,
        })
    }

    fn save(&self, rows: &[RawRow], expected: Revision) -> Result<Revision, DbError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.revision != expected {
            return Err(DbError::Conflict {
                expected,
                actual: state.revision,
            });
        }

        state.rows = rows.to_vec();
        state.revision = Revision(state.revision.0 + 1);
        tracing::debug!(rows = rows.len(), revision = %state.revision, "Saved in-memory ledger.");
        Ok(state.revision)
    }
}
