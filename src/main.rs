use analytics::{Metric, MetricsEngine};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use configuration::{Config, load_config};
use core_types::{DayCountBasis, FlowDirection, Owner};
use database::{CsvLedgerStore, LedgerStore, Revision};
use engine::{LedgerService, OwnerReport};
use ledger::DateParser;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// The main entry point for the cashflow tracker.
fn main() -> Result<()> {
    // A missing .env file is fine; it only carries CASHFLOW__* overrides.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let _guard = init_tracing(&config)?;

    let store_path = cli
        .store
        .clone()
        .unwrap_or_else(|| config.storage.path.clone());

    // Execute the appropriate command
    match cli.command {
        Commands::Report(args) => handle_report(args, &config, store_path),
        Commands::Owners => handle_owners(&config, store_path),
        Commands::Add(args) => handle_add(args, &config, store_path),
        Commands::Replace(args) => handle_replace(args, &config, store_path),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Track investment cashflows per person and report how they performed.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of ./config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger CSV to use instead of the configured `storage.path`.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show invested capital, profit, CAGR and XIRR for one owner.
    Report(ReportArgs),
    /// List every owner in the ledger with their number of records.
    Owners,
    /// Record a single cashflow. Negative amounts are contributions.
    Add(AddArgs),
    /// Replace all of an owner's cashflows with the rows of a CSV file.
    Replace(ReplaceArgs),
}

#[derive(Parser)]
struct ReportArgs {
    #[arg(long)]
    owner: String,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Day-count basis overriding `metrics.day_count_basis`.
    #[arg(long, value_enum)]
    basis: Option<DayCountBasis>,
}

#[derive(Parser)]
struct AddArgs {
    #[arg(long)]
    owner: String,

    /// The cashflow date (format: YYYY-MM-DD).
    #[arg(long)]
    date: NaiveDate,

    /// The amount, e.g. -10000 for an investment or 2500.50 for a redemption.
    #[arg(long, allow_negative_numbers = true)]
    amount: Decimal,
}

#[derive(Parser)]
struct ReplaceArgs {
    #[arg(long)]
    owner: String,

    /// CSV file with `date,amount` columns holding the owner's complete history.
    #[arg(long)]
    from: PathBuf,

    /// Revision printed by `report`; the edit is refused if the ledger changed since.
    #[arg(long)]
    revision: Option<Revision>,
}

// ==============================================================================
// Setup
// ==============================================================================

/// Installs the global subscriber: stderr always, plus a daily file when configured.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(config: &Config) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.filter)
            .with_context(|| format!("Invalid logging.filter '{}'", config.logging.filter))?,
    };

    let (file_layer, guard) = match &config.logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "cashflow.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    Ok(guard)
}

fn build_service(
    config: &Config,
    store_path: PathBuf,
    basis: Option<DayCountBasis>,
) -> Result<LedgerService> {
    let metrics = MetricsEngine::new(
        basis.unwrap_or(config.metrics.day_count_basis),
        config.metrics.solver,
    )
    .context("Invalid solver settings")?;

    let parser = if config.ledger.date_formats.is_empty() {
        DateParser::default()
    } else {
        DateParser::new(config.ledger.date_formats.iter().cloned())
    };
    tracing::debug!(formats = ?parser.formats(), "Date formats in use.");

    let store = Arc::new(CsvLedgerStore::new(store_path));
    tracing::debug!(store = %store.path().display(), "Using ledger store.");
    Ok(LedgerService::new(store, metrics, parser))
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_report(args: ReportArgs, config: &Config, store_path: PathBuf) -> Result<()> {
    let owner = Owner::new(&args.owner)?;
    let service = build_service(config, store_path, args.basis)?;
    let owner_report = service
        .report(&owner)
        .with_context(|| format!("Failed to build the report for {owner}"))?;

    if args.json {
        let document = serde_json::json!({
            "owner": owner_report.owner,
            "revision": owner_report.revision.to_string(),
            "dayCountBasis": service.metrics().basis(),
            "solver": service.metrics().params(),
            "rejectedRows": owner_report.rejected_rows,
            "summary": owner_report.report.summary(),
            "report": owner_report.report,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    if owner_report.report.record_count == 0 {
        println!("No cashflows recorded for {owner}.");
        return Ok(());
    }

    println!("Performance of {owner}");
    println!("{}", render_report(&owner_report, &config.display.currency_symbol));
    println!("Revision: {}", owner_report.revision);
    if owner_report.rejected_rows > 0 {
        println!(
            "{} stored row(s) had an unreadable date or amount and were skipped.",
            owner_report.rejected_rows
        );
    }
    Ok(())
}

fn handle_owners(config: &Config, store_path: PathBuf) -> Result<()> {
    let service = build_service(config, store_path, None)?;
    let owners = service.owners().context("Failed to read the ledger")?;

    if owners.is_empty() {
        println!("The ledger is empty.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Owner", "Records"]);
    for (owner, count) in owners {
        table.add_row(vec![
            Cell::new(owner),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn handle_add(args: AddArgs, config: &Config, store_path: PathBuf) -> Result<()> {
    let owner = Owner::new(&args.owner)?;
    let service = build_service(config, store_path, None)?;
    let revision = service
        .append(&owner, args.date, args.amount)
        .context("Failed to record the cashflow")?;

    println!(
        "Recorded {} on {} for {owner}. Revision: {revision}",
        format_money(args.amount, &config.display.currency_symbol),
        args.date
    );
    Ok(())
}

fn handle_replace(args: ReplaceArgs, config: &Config, store_path: PathBuf) -> Result<()> {
    let owner = Owner::new(&args.owner)?;
    let edited = read_edited_rows(&args.from)?;
    let submitted = edited.len();

    let service = build_service(config, store_path, None)?;
    let revision = match service.replace(&owner, edited, args.revision) {
        Ok(revision) => revision,
        Err(e) if e.is_conflict() => {
            bail!("{e}. Run `report --owner {owner}` again and retry with the new revision.")
        }
        Err(e) => return Err(e).context("Failed to replace the cashflows"),
    };

    println!("Replaced {owner}'s cashflows with {submitted} row(s). Revision: {revision}");
    Ok(())
}

/// Reads an edited `date,amount` sheet. An `owner` column, if present, is ignored.
fn read_edited_rows(path: &Path) -> Result<Vec<core_types::RawRow>> {
    // The store treats a missing file as empty, which here would erase the owner.
    if !path.is_file() {
        bail!("Edited sheet {} does not exist", path.display());
    }
    let snapshot = CsvLedgerStore::new(path)
        .load(None)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(snapshot.rows)
}

// ==============================================================================
// Rendering
// ==============================================================================

fn render_report(owner_report: &OwnerReport, currency: &str) -> Table {
    let report = &owner_report.report;
    let period = match (report.first_date, report.last_date) {
        (Some(first), Some(last)) => format!("{first} → {last}"),
        _ => "-".to_string(),
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);

    let rows = [
        ("Records", report.record_count.to_string()),
        ("Period", period),
        ("Invested", format_money(report.invested, currency)),
        ("Withdrawn", format_money(report.withdrawn, currency)),
        ("Net value", format_money(report.net_value, currency)),
        ("Profit", format_money(report.profit, currency)),
        ("Absolute return", format_metric(&report.absolute_return)),
        ("CAGR", format_metric(&report.cagr)),
        ("XIRR", format_metric(&report.xirr)),
    ];
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn format_money(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp(2);
    if FlowDirection::of(rounded) == FlowDirection::Contribution {
        format!("-{currency}{:.2}", rounded.abs())
    } else {
        format!("{currency}{:.2}", rounded.abs())
    }
}

fn format_metric(metric: &Metric) -> String {
    match (metric.computed(), metric.reason()) {
        (Some(value), _) => format!("{:.2}%", value * 100.0),
        (None, Some(reason)) => format!("n/a ({reason})"),
        (None, None) => "n/a".to_string(),
    }
}
