use thiserror::Error;

/// Errors raised while setting up the analytics engine.
///
/// Computing a report never fails; undefined metrics are values, not errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid solver parameter '{0}': {1}")]
    InvalidSolverParameter(&'static str, String),
}
