use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Config, DisplaySettings, LedgerSettings, LoggingSettings, MetricsSettings, StorageSettings,
};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix of environment variables overriding the file, e.g.
/// `CASHFLOW__STORAGE__PATH=/data/cashflows.csv`.
pub const ENV_PREFIX: &str = "CASHFLOW";

/// Loads the application configuration.
///
/// Built-in defaults are overlaid by the configuration file and then by
/// `CASHFLOW__*` environment variables. An explicit `path` must exist; the
/// default `config.toml` is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = with_defaults(config::Config::builder())?
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(";")
                .with_list_parse_key("ledger.date_formats")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    tracing::debug!(?config, "Configuration loaded.");
    Ok(config)
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Ok(builder
        .set_default("metrics.day_count_basis", "actual365")?
        .set_default("metrics.solver.initial_guess", 0.10)?
        .set_default("metrics.solver.tolerance", 1e-6)?
        .set_default("metrics.solver.max_iterations", 100_i64)?
        .set_default("metrics.solver.min_rate", -0.99)?
        .set_default("metrics.solver.max_rate", 10.0)?
        .set_default("storage.path", "cashflows.csv")?
        .set_default("logging.filter", "info")?
        .set_default("display.currency_symbol", "₹")?)
}

/// Rejects solver settings that could never produce a rate.
fn validate(config: &Config) -> Result<(), ConfigError> {
    config
        .metrics
        .solver
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("metrics.solver: {e}")))
}
