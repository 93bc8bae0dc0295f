use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Ledger store error: {0}")]
    Store(#[from] database::DbError),
}

impl EngineError {
    /// True when the write was refused because another session saved first.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Store(database::DbError::Conflict { .. }))
    }
}
