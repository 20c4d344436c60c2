//! Order extraction from notification emails.

mod batch;
pub mod document;
pub mod items;
mod parser;
pub mod rules;

pub use batch::{BatchOutcome, ParseFailure, parse_emails};
pub use document::EmailDocument;
pub use parser::EmailOrderParser;
pub use rules::ExtractionRules;

use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::models::email::RawEmail;
use crate::models::order::ParsedOrder;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for order parsers.
pub trait OrderParser {
    /// Parse one email. Fails when no order number can be established.
    fn parse(&self, email: &RawEmail) -> Result<ParsedOrder>;

    /// Parse one email, logging and discarding the failure reason.
    fn parse_order(&self, email: &RawEmail) -> Option<ParsedOrder> {
        match self.parse(email) {
            Ok(order) => {
                debug!("Parsed order {} from {}", order.order_number, email.id);
                Some(order)
            }
            Err(e) => {
                warn!("Skipping email {}: {}", email.id, e);
                None
            }
        }
    }
}
