use crate::repository::Revision;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to access the ledger store: {0}")]
    Io(#[from] std::io::Error),

    #[error("An error occurred while reading or writing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(
        "The ledger store changed since it was read (expected revision {expected}, found {actual}); reload and retry."
    )]
    Conflict { expected: Revision, actual: Revision },
}
