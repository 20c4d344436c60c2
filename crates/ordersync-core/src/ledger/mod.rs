//! Ledger model and reconciliation.

pub mod reconcile;
pub mod row;
pub mod schema;
pub mod snapshot;

pub use reconcile::{CellPatch, ReconcilePlan, ReconcileSummary, Reconciler, reconcile};
pub use row::{LedgerRow, RowLocation};
pub use schema::{Column, ColumnOwner, LedgerSchema, PatchGroup, SchemaVariant};
pub use snapshot::LedgerSnapshot;

use serde::Serialize;
use tracing::debug;

use crate::error::LedgerError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// What applying a plan changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    /// Whether the header row was written first.
    pub wrote_header: bool,
    /// Rows appended.
    pub rows_appended: usize,
    /// Cells overwritten by patches.
    pub cells_updated: usize,
}

/// Ledger collaborator: provides snapshots and applies plans.
pub trait Ledger {
    /// Read the current ledger contents.
    fn snapshot(&self, schema: LedgerSchema) -> Result<LedgerSnapshot>;

    /// Apply a reconciliation plan. Either every operation is applied or none.
    fn apply(&mut self, plan: &ReconcilePlan) -> Result<ApplyOutcome>;
}

/// A ledger grid: header row first, then data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerTable {
    cells: Vec<Vec<String>>,
}

impl LedgerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: Vec<Vec<String>>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Vec<String>] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Vec<String>> {
        self.cells
    }

    /// Number of data rows.
    pub fn data_rows(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    pub fn snapshot(&self, schema: LedgerSchema) -> Result<LedgerSnapshot> {
        LedgerSnapshot::from_cells(schema, &self.cells)
    }

    /// Apply a plan: header if the grid is empty, then patches, then appends.
    ///
    /// Patch locations are checked before anything is written.
    pub fn apply(&mut self, plan: &ReconcilePlan) -> Result<ApplyOutcome> {
        let schema = &plan.schema;
        let mut outcome = ApplyOutcome::default();

        for patch in &plan.patches {
            let row = patch.location.row();
            if row < 2 || row > self.cells.len() {
                return Err(LedgerError::RowOutOfRange(row));
            }
        }

        if plan.is_empty() {
            return Ok(outcome);
        }

        if self.cells.is_empty() {
            self.cells.push(schema.headers());
            outcome.wrote_header = true;
        }

        for patch in &plan.patches {
            let cells = &mut self.cells[patch.location.row() - 1];
            for (column, value) in &patch.values {
                let Some(position) = schema.position(*column) else {
                    continue;
                };
                if cells.len() <= position {
                    cells.resize(position + 1, String::new());
                }
                cells[position] = value.clone();
                outcome.cells_updated += 1;
            }
        }

        for row in &plan.appends {
            self.cells.push(row.to_cells(schema));
            outcome.rows_appended += 1;
        }

        debug!(
            "Applied plan: {} rows appended, {} cells updated",
            outcome.rows_appended, outcome.cells_updated
        );

        Ok(outcome)
    }
}

/// In-memory ledger.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    table: LedgerTable,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: LedgerTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &LedgerTable {
        &self.table
    }
}

impl Ledger for MemoryLedger {
    fn snapshot(&self, schema: LedgerSchema) -> Result<LedgerSnapshot> {
        self.table.snapshot(schema)
    }

    fn apply(&mut self, plan: &ReconcilePlan) -> Result<ApplyOutcome> {
        self.table.apply(plan)
    }
}
