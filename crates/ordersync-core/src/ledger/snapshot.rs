//! Read-only view of the ledger at the start of a reconciliation.

use crate::error::LedgerError;

use super::row::{LedgerRow, RowLocation};
use super::schema::{Column, LedgerSchema};

/// Ledger contents read once per reconciliation and never mutated.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    schema: LedgerSchema,
    has_header: bool,
    rows: Vec<LedgerRow>,
}

impl LedgerSnapshot {
    /// A snapshot of a ledger with no header and no rows.
    pub fn empty(schema: LedgerSchema) -> Self {
        Self {
            schema,
            has_header: false,
            rows: Vec::new(),
        }
    }

    /// Build a snapshot from raw cells, header row first.
    ///
    /// An empty grid is an empty ledger. Otherwise the first row must match
    /// the schema's header.
    pub fn from_cells(schema: LedgerSchema, cells: &[Vec<String>]) -> Result<Self, LedgerError> {
        let Some((header, data)) = cells.split_first() else {
            return Ok(Self::empty(schema));
        };

        schema.validate_header(header)?;

        let rows = data
            .iter()
            .map(|cells| LedgerRow::from_cells(&schema, cells))
            .collect();

        Ok(Self {
            schema,
            has_header: true,
            rows,
        })
    }

    pub fn schema(&self) -> &LedgerSchema {
        &self.schema
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Data rows with their sheet locations.
    pub fn located_rows(&self) -> impl Iterator<Item = (RowLocation, &LedgerRow)> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| (RowLocation::from_data_index(index), row))
    }

    /// Locations of every row holding `order_number`.
    pub fn order_locations(&self, order_number: &str) -> Vec<RowLocation> {
        self.located_rows()
            .filter(|(_, row)| row.get(Column::OrderNumber) == order_number)
            .map(|(location, _)| location)
            .collect()
    }
}
