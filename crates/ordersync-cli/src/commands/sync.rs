//! Sync command - reconcile order emails into the ledger, once or on a schedule.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use console::style;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use ordersync_core::{SchemaVariant, SyncConfig, SyncReport, SyncRunner};

use super::load_config;
use crate::csv_ledger::CsvLedger;
use crate::mailbox::EmlMailbox;

/// Arguments for the sync command.
#[derive(Args)]
pub struct SyncArgs {
    /// Mailbox directory (overrides mail.mailbox_dir)
    #[arg(short, long)]
    mailbox: Option<PathBuf>,

    /// Ledger CSV file (overrides ledger.path)
    #[arg(short, long)]
    ledger: Option<PathBuf>,

    /// Ledger column layout (overrides ledger.schema)
    #[arg(short, long, value_enum)]
    schema: Option<SchemaArg>,

    /// Days to look back on the first run (overrides mail.initial_fetch_days)
    #[arg(short, long)]
    days: Option<u32>,

    /// Compute the changes without writing the ledger
    #[arg(long)]
    dry_run: bool,

    /// Keep running every schedule.interval_minutes until interrupted
    #[arg(short, long)]
    watch: bool,

    /// Print each run report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum SchemaArg {
    /// One row per order
    SingleRow,
    /// One row per line item
    MultiRow,
}

impl From<SchemaArg> for SchemaVariant {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::SingleRow => SchemaVariant::SingleRow,
            SchemaArg::MultiRow => SchemaVariant::MultiRow,
        }
    }
}

pub async fn run(args: SyncArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(dir) = &args.mailbox {
        config.mail.mailbox_dir = dir.clone();
    }
    if let Some(path) = &args.ledger {
        config.ledger.path = path.clone();
    }
    if let Some(schema) = args.schema {
        config.ledger.schema = schema.into();
    }

    let runner = SyncRunner::from_config(&config)?.with_dry_run(args.dry_run);
    let mut mailbox = EmlMailbox::new(&config.mail.mailbox_dir);
    let mut ledger = CsvLedger::new(&config.ledger.path);

    info!(
        "Syncing {} into {} ({} layout)",
        config.mail.mailbox_dir.display(),
        config.ledger.path.display(),
        config.ledger.schema
    );

    let initial_days = args.days.unwrap_or(config.mail.initial_fetch_days);
    match run_once(&runner, &mut mailbox, &mut ledger, &config, initial_days) {
        Ok(report) => print_report(&report, &ledger, args.json)?,
        Err(e) if args.watch => error!("Sync run failed: {:#}", e),
        Err(e) => return Err(e),
    }

    if !args.watch {
        return Ok(());
    }

    let period = Duration::from_secs(config.schedule.interval_minutes.max(1) * 60);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick fires immediately; the initial run already happened.
    interval.tick().await;

    eprintln!(
        "{} Watching every {} minutes, press Ctrl-C to stop",
        style("ℹ").blue(),
        config.schedule.interval_minutes.max(1)
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let days = config.mail.incremental_fetch_days;
                match run_once(&runner, &mut mailbox, &mut ledger, &config, days) {
                    Ok(report) => print_report(&report, &ledger, args.json)?,
                    Err(e) => error!("Sync run failed: {:#}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("{} Stopped", style("✓").green());
                break;
            }
        }
    }

    Ok(())
}

fn run_once(
    runner: &SyncRunner,
    mailbox: &mut EmlMailbox,
    ledger: &mut CsvLedger,
    config: &SyncConfig,
    days: u32,
) -> anyhow::Result<SyncReport> {
    let filter = config
        .mail
        .filter()
        .since_days_ago(days, Utc::now().date_naive());
    Ok(runner.run(mailbox, ledger, &filter)?)
}

fn print_report(report: &SyncReport, ledger: &CsvLedger, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    let verb = if report.dry_run { "Would sync" } else { "Synced" };
    println!(
        "{} {} {} emails into {} in {}ms",
        style("✓").green(),
        verb,
        report.fetched,
        ledger.path().display(),
        report.processing_time_ms
    );
    println!(
        "   {} new orders ({} rows), {} updated ({} cells), {} skipped, {} failed",
        style(report.appended).green(),
        report.appended_rows,
        style(report.updated).cyan(),
        report.cells_updated,
        report.skipped,
        style(report.failed).red()
    );

    if !report.failures.is_empty() {
        println!();
        println!("{}", style("Unparsed emails:").yellow());
        for failure in &report.failures {
            println!("  - {} ({}): {}", failure.email_id, failure.subject, failure.reason);
        }
    }

    Ok(())
}
