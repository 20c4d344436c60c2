//! One sync run: fetch, parse, reconcile, apply.

use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::error::{MailError, Result};
use crate::extract::{EmailOrderParser, OrderParser, ParseFailure, parse_emails};
use crate::ledger::{ApplyOutcome, Ledger, LedgerSchema, ReconcileSummary, Reconciler};
use crate::models::config::SyncConfig;
use crate::models::email::{MailFilter, RawEmail};

/// Mail collaborator.
pub trait MailSource {
    /// Fetch messages matching the filter.
    fn fetch(&mut self, filter: &MailFilter) -> std::result::Result<Vec<RawEmail>, MailError>;
}

impl MailSource for Vec<RawEmail> {
    fn fetch(&mut self, filter: &MailFilter) -> std::result::Result<Vec<RawEmail>, MailError> {
        Ok(self.iter().filter(|m| filter.matches(m)).cloned().collect())
    }
}

/// Counts reported by a sync run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub fetched: usize,
    pub parsed: usize,
    pub failed: usize,
    /// New orders appended.
    pub appended: usize,
    /// Ledger rows appended.
    pub appended_rows: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Cells overwritten by status patches.
    pub cells_updated: usize,
    /// The plan was computed but not applied.
    pub dry_run: bool,
    pub failures: Vec<ParseFailure>,
    pub processing_time_ms: u64,
}

impl SyncReport {
    fn record_plan(&mut self, summary: &ReconcileSummary) {
        self.appended = summary.new_orders;
        self.updated = summary.updated_orders;
        self.skipped = summary.skipped_orders;
    }

    fn record_apply(&mut self, outcome: &ApplyOutcome) {
        self.appended_rows = outcome.rows_appended;
        self.cells_updated = outcome.cells_updated;
    }
}

/// Runs the pipeline against mail and ledger collaborators.
pub struct SyncRunner<P = EmailOrderParser> {
    parser: P,
    reconciler: Reconciler,
    schema: LedgerSchema,
    dry_run: bool,
}

impl SyncRunner<EmailOrderParser> {
    /// Build a runner from configuration.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let parser = EmailOrderParser::from_config(&config.extraction)?;
        Ok(Self::new(parser, LedgerSchema::new(config.ledger.schema))
            .with_reconciler(Reconciler::new().with_import_note(config.ledger.import_note.clone())))
    }
}

impl<P: OrderParser> SyncRunner<P> {
    pub fn new(parser: P, schema: LedgerSchema) -> Self {
        Self {
            parser,
            reconciler: Reconciler::new(),
            schema,
            dry_run: false,
        }
    }

    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Compute operations without applying them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn schema(&self) -> LedgerSchema {
        self.schema
    }

    /// Run once. Individual emails never fail the run; mail and ledger
    /// collaborator errors do.
    pub fn run(
        &self,
        mail: &mut dyn MailSource,
        ledger: &mut dyn Ledger,
        filter: &MailFilter,
    ) -> Result<SyncReport> {
        let start = Instant::now();
        let mut report = SyncReport {
            dry_run: self.dry_run,
            ..SyncReport::default()
        };

        info!("Fetching mail: {}", filter.to_query());
        let emails = mail.fetch(filter)?;
        report.fetched = emails.len();

        if emails.is_empty() {
            info!("No new order emails");
            return Ok(finish(report, start));
        }

        let batch = parse_emails(&self.parser, &emails);
        report.parsed = batch.parsed_count();
        report.failed = batch.failed_count();
        report.failures = batch.failures;

        if batch.orders.is_empty() {
            info!("No orders parsed from {} emails", emails.len());
            return Ok(finish(report, start));
        }

        let snapshot = ledger.snapshot(self.schema)?;
        let plan = self.reconciler.reconcile(&batch.orders, &snapshot);
        report.record_plan(&plan.summary);

        if self.dry_run {
            report.appended_rows = plan.appends.len();
            report.cells_updated = plan.patched_cells();
            info!("Dry run, ledger left unchanged");
        } else {
            let outcome = ledger.apply(&plan)?;
            report.record_apply(&outcome);
        }

        let report = finish(report, start);
        info!(
            "Sync complete: {} new orders ({} rows), {} updated, {} skipped, {} failed",
            report.appended, report.appended_rows, report.updated, report.skipped, report.failed
        );
        Ok(report)
    }
}

fn finish(mut report: SyncReport, start: Instant) -> SyncReport {
    report.processing_time_ms = start.elapsed().as_millis() as u64;
    report
}
