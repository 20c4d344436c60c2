//! Diffing parsed orders against a ledger snapshot.
//!
//! Orders whose number is already in the ledger become sparse status
//! patches; all other orders become appended rows, deduplicated by identity
//! key. Reconciliation only computes operations and never fails.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::models::order::ParsedOrder;

use super::row::{LedgerRow, RowLocation, order_rows};
use super::schema::{Column, LedgerSchema, PatchGroup};
use super::snapshot::LedgerSnapshot;

/// Overwrite of one status group on one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellPatch {
    pub location: RowLocation,
    pub group: PatchGroup,
    pub values: Vec<(Column, String)>,
}

/// Per-order decisions of a reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// New orders that staged at least one row.
    pub new_orders: usize,
    /// Existing orders that received patches.
    pub updated_orders: usize,
    /// Orders that produced no operation.
    pub skipped_orders: usize,
    /// Candidate rows dropped because their identity key already existed.
    pub duplicate_rows: usize,
}

/// Operations to bring the ledger up to date.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcilePlan {
    #[serde(skip)]
    pub schema: LedgerSchema,
    pub appends: Vec<LedgerRow>,
    pub patches: Vec<CellPatch>,
    pub summary: ReconcileSummary,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.appends.is_empty() && self.patches.is_empty()
    }

    /// Number of cells the patches overwrite.
    pub fn patched_cells(&self) -> usize {
        self.patches.iter().map(|p| p.values.len()).sum()
    }
}

type IdentityKey = (String, String);

/// Computes append and patch operations for parsed orders.
#[derive(Debug, Clone)]
pub struct Reconciler {
    import_note: String,
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            import_note: "Gmail 自動匯入".to_string(),
        }
    }

    /// Note written on every appended row.
    pub fn with_import_note(mut self, note: impl Into<String>) -> Self {
        self.import_note = note.into();
        self
    }

    /// Reconcile orders, in input order, against a snapshot.
    ///
    /// When two inputs share a new identity key the first one is appended and
    /// the later one is dropped as a duplicate.
    pub fn reconcile(&self, orders: &[ParsedOrder], snapshot: &LedgerSnapshot) -> ReconcilePlan {
        let schema = *snapshot.schema();
        let index = identity_index(snapshot);
        let mut seen = existing_keys(snapshot);

        let mut plan = ReconcilePlan {
            schema,
            appends: Vec::new(),
            patches: Vec::new(),
            summary: ReconcileSummary::default(),
        };

        for order in orders {
            match index.get(order.order_number.as_str()) {
                Some(locations) => {
                    let patches = status_patches(order, locations, &schema);
                    if patches.is_empty() {
                        debug!("Order {} has no status changes", order.order_number);
                        plan.summary.skipped_orders += 1;
                    } else {
                        debug!(
                            "Order {}: {} patches over {} rows",
                            order.order_number,
                            patches.len(),
                            locations.len()
                        );
                        plan.patches.extend(patches);
                        plan.summary.updated_orders += 1;
                    }
                }
                None => {
                    let mut staged = 0;
                    for row in order_rows(order, &schema, &self.import_note) {
                        if seen.insert(identity_key(&row, &schema)) {
                            plan.appends.push(row);
                            staged += 1;
                        } else {
                            plan.summary.duplicate_rows += 1;
                        }
                    }

                    if staged > 0 {
                        plan.summary.new_orders += 1;
                    } else {
                        debug!("Order {} already recorded", order.order_number);
                        plan.summary.skipped_orders += 1;
                    }
                }
            }
        }

        info!(
            "Reconciled {} orders: {} new ({} rows), {} updated, {} skipped",
            orders.len(),
            plan.summary.new_orders,
            plan.appends.len(),
            plan.summary.updated_orders,
            plan.summary.skipped_orders
        );

        plan
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconcile with the default import note.
pub fn reconcile(orders: &[ParsedOrder], snapshot: &LedgerSnapshot) -> ReconcilePlan {
    Reconciler::new().reconcile(orders, snapshot)
}

fn identity_index(snapshot: &LedgerSnapshot) -> HashMap<&str, Vec<RowLocation>> {
    let mut index: HashMap<&str, Vec<RowLocation>> = HashMap::new();
    for (location, row) in snapshot.located_rows() {
        let order_number = row.get(Column::OrderNumber);
        if !order_number.is_empty() {
            index.entry(order_number).or_default().push(location);
        }
    }
    index
}

fn existing_keys(snapshot: &LedgerSnapshot) -> HashSet<IdentityKey> {
    snapshot
        .rows()
        .iter()
        .filter(|row| !row.get(Column::OrderNumber).is_empty())
        .map(|row| identity_key(row, snapshot.schema()))
        .collect()
}

fn identity_key(row: &LedgerRow, schema: &LedgerSchema) -> IdentityKey {
    let discriminator = schema
        .discriminator()
        .map(|column| row.get(column).to_string())
        .unwrap_or_default();
    (row.get(Column::OrderNumber).to_string(), discriminator)
}

/// Status patches for an order already in the ledger.
///
/// Order status goes to the first row only; the shipping and payment pairs go
/// to every row of the order. Only populated groups are patched, and an empty
/// half of a pair leaves the ledger cell as it is.
fn status_patches(
    order: &ParsedOrder,
    locations: &[RowLocation],
    schema: &LedgerSchema,
) -> Vec<CellPatch> {
    let mut patches = Vec::new();

    let patch = |location: RowLocation, group: PatchGroup, values: [&str; 2]| CellPatch {
        location,
        group,
        values: group
            .columns()
            .iter()
            .zip(values)
            .filter(|(column, value)| {
                !value.is_empty() && schema.contains(**column) && !column.is_manual()
            })
            .map(|(column, value)| (*column, value.to_string()))
            .collect(),
    };

    if order.status_keyword.is_some() {
        if let Some(first) = locations.first() {
            patches.push(patch(*first, PatchGroup::OrderStatus, [order.order_status.label(), ""]));
        }
    }

    if order.has_shipping_info() {
        for location in locations {
            patches.push(patch(
                *location,
                PatchGroup::Shipping,
                [order.shipping_date.as_str(), order.tracking_number.as_str()],
            ));
        }
    }

    if order.has_payment_info() {
        for location in locations {
            patches.push(patch(
                *location,
                PatchGroup::Payment,
                [order.payment_status.label(), order.payment_date.as_str()],
            ));
        }
    }

    patches.retain(|p| !p.values.is_empty());
    patches
}
