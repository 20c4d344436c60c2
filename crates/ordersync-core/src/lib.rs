//! Core library for storefront order email synchronisation.
//!
//! This crate provides:
//! - Order extraction from notification emails (subject order number,
//!   labelled fields, item tables and text shorthand)
//! - Batch parsing with per-email failure isolation
//! - Ledger schemas and reconciliation into append and patch operations
//! - A sync runner wiring mail and ledger collaborators around the above

pub mod error;
pub mod extract;
pub mod ledger;
pub mod models;
pub mod sync;

pub use error::{ExtractionError, LedgerError, MailError, Result, SyncError};
pub use extract::{
    BatchOutcome, EmailDocument, EmailOrderParser, ExtractionRules, OrderParser, ParseFailure,
    parse_emails,
};
pub use ledger::{
    ApplyOutcome, CellPatch, Column, Ledger, LedgerRow, LedgerSchema, LedgerSnapshot, LedgerTable,
    MemoryLedger, ReconcilePlan, Reconciler, RowLocation, SchemaVariant, reconcile,
};
pub use models::{LineItem, MailFilter, OrderStatus, ParsedOrder, PaymentStatus, RawEmail, SyncConfig};
pub use sync::{MailSource, SyncReport, SyncRunner};
