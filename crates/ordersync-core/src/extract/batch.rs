//! Batch parsing with per-email failure isolation.

use serde::Serialize;
use tracing::{info, warn};

use crate::models::email::RawEmail;
use crate::models::order::ParsedOrder;

use super::OrderParser;

/// An email that did not yield an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    pub email_id: String,
    pub subject: String,
    pub reason: String,
}

/// Orders parsed from a batch, in input order, plus the rejected emails.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub orders: Vec<ParsedOrder>,
    pub failures: Vec<ParseFailure>,
}

impl BatchOutcome {
    pub fn parsed_count(&self) -> usize {
        self.orders.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }
}

/// Parse every email in arrival order. A failing email is recorded and the
/// batch continues.
pub fn parse_emails<P: OrderParser + ?Sized>(parser: &P, emails: &[RawEmail]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for email in emails {
        match parser.parse(email) {
            Ok(order) => outcome.orders.push(order),
            Err(e) => {
                warn!("Failed to parse email {}: {}", email.id, e);
                outcome.failures.push(ParseFailure {
                    email_id: email.id.clone(),
                    subject: email.subject.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Parsed {} orders from {} emails ({} failed)",
        outcome.parsed_count(),
        emails.len(),
        outcome.failed_count()
    );

    outcome
}
