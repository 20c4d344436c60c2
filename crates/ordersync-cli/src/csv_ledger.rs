//! CSV file ledger.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use ordersync_core::ledger::{ApplyOutcome, Ledger, LedgerTable};
use ordersync_core::{LedgerError, LedgerSchema, LedgerSnapshot, ReconcilePlan};

/// Ledger stored as a CSV file, header row first.
///
/// Writes go to a sibling temp file that replaces the ledger on success, so
/// a failed apply leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<LedgerTable, LedgerError> {
        if !self.path.exists() {
            return Ok(LedgerTable::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(storage)?;

        let mut cells = Vec::new();
        for record in reader.records() {
            let record = record.map_err(storage)?;
            cells.push(record.iter().map(str::to_string).collect());
        }
        Ok(LedgerTable::from_cells(cells))
    }

    fn store(&self, table: &LedgerTable) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(storage)?;
        }

        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&tmp)
                .map_err(storage)?;
            for row in table.cells() {
                writer.write_record(row).map_err(storage)?;
            }
            writer.flush().map_err(storage)?;
        }
        fs::rename(&tmp, &self.path).map_err(storage)?;

        debug!("Wrote {} rows to {}", table.cells().len(), self.path.display());
        Ok(())
    }
}

impl Ledger for CsvLedger {
    fn snapshot(&self, schema: LedgerSchema) -> Result<LedgerSnapshot, LedgerError> {
        self.load()?.snapshot(schema)
    }

    fn apply(&mut self, plan: &ReconcilePlan) -> Result<ApplyOutcome, LedgerError> {
        if plan.is_empty() {
            return Ok(ApplyOutcome::default());
        }

        let mut table = self.load()?;
        let outcome = table.apply(plan)?;
        self.store(&table)?;
        Ok(outcome)
    }
}

fn storage(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage(e.to_string())
}
