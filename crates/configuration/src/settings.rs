use analytics::SolverParams;
use core_types::DayCountBasis;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerSettings,
    pub metrics: MetricsSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
    pub display: DisplaySettings,
}

/// How stored rows are read into a ledger.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerSettings {
    /// `chrono` format strings tried in order for the date column.
    /// Empty means the ledger's built-in formats.
    #[serde(default)]
    pub date_formats: Vec<String>,
}

/// Contains parameters for the metrics engine.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// Days per year used by both XIRR and CAGR.
    pub day_count_basis: DayCountBasis,
    /// Newton–Raphson settings, checked by `SolverParams::validate` on load.
    pub solver: SolverParams,
}

/// Where the shared ledger lives.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Path of the CSV file holding every owner's cashflows.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, used when `RUST_LOG` is not set.
    pub filter: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplaySettings {
    pub currency_symbol: String,
}
