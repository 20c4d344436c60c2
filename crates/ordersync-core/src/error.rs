//! Error types for the ordersync-core library.

use thiserror::Error;

/// Main error type for the ordersync library.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Mail collaborator error.
    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    /// Order extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Ledger collaborator or snapshot error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to fetching and decoding raw emails.
#[derive(Error, Debug)]
pub enum MailError {
    /// The message could not be decoded as RFC 822.
    #[error("failed to decode message {id}: {reason}")]
    Decode { id: String, reason: String },

    /// The mailbox could not be read.
    #[error("failed to read mailbox: {0}")]
    Source(String),
}

/// Errors related to order field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The subject carries no recognizable order number.
    #[error("no order number in subject: {0:?}")]
    MissingOrderNumber(String),

    /// A configured pattern failed to compile.
    #[error("invalid pattern for {field}: {reason}")]
    InvalidPattern { field: String, reason: String },

    /// A configured pattern names a field that does not exist.
    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Errors related to ledger snapshots and ledger collaborators.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The ledger header does not match the configured schema variant.
    #[error("ledger header does not match schema {schema}: expected {expected:?} at column {index}, found {found:?}")]
    SchemaMismatch {
        schema: String,
        index: usize,
        expected: String,
        found: String,
    },

    /// A patch referenced a row outside the ledger.
    #[error("row {0} is outside the ledger")]
    RowOutOfRange(usize),

    /// The ledger backend failed to read or write.
    #[error("ledger storage failed: {0}")]
    Storage(String),
}

/// Result type for the ordersync library.
pub type Result<T> = std::result::Result<T, SyncError>;
