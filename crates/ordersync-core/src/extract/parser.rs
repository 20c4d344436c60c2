//! Rule-based order parser for storefront notification emails.

use std::time::Instant;

use tracing::debug;

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::email::RawEmail;
use crate::models::order::ParsedOrder;

use super::document::EmailDocument;
use super::items::extract_order_items;
use super::rules::{
    ExtractionRules, Field, extract_amount, extract_email, extract_field, extract_order_date,
    extract_order_number, extract_order_status, extract_payment_status, extract_total_amount,
};
use super::{OrderParser, Result};

/// Parser turning one notification email into a [`ParsedOrder`].
///
/// The order number comes from the subject only. Every other field is
/// optional and falls back to its empty value.
#[derive(Debug, Clone)]
pub struct EmailOrderParser {
    rules: ExtractionRules,
    channel_source: String,
}

impl EmailOrderParser {
    /// Create a parser with the built-in rules.
    pub fn new() -> Self {
        Self {
            rules: ExtractionRules::builtin(),
            channel_source: "Cyberbiz".to_string(),
        }
    }

    /// Build a parser from configuration, compiling any custom patterns.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let rules = ExtractionRules::builtin().with_custom_patterns(&config.custom_patterns)?;
        Ok(Self::new()
            .with_rules(rules)
            .with_channel_source(config.channel_source.clone()))
    }

    /// Set the channel label written on every order.
    pub fn with_channel_source(mut self, channel_source: impl Into<String>) -> Self {
        self.channel_source = channel_source.into();
        self
    }

    /// Replace the extraction rules.
    pub fn with_rules(mut self, rules: ExtractionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    fn field(&self, text: &str, field: Field) -> String {
        extract_field(text, self.rules.field(field))
    }

    fn amount(&self, text: &str, field: Field) -> Option<i64> {
        extract_amount(text, self.rules.field(field))
    }
}

impl Default for EmailOrderParser {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderParser for EmailOrderParser {
    fn parse(&self, email: &RawEmail) -> Result<ParsedOrder> {
        let start = Instant::now();

        let order_number = extract_order_number(&email.subject, &self.rules)
            .ok_or_else(|| ExtractionError::MissingOrderNumber(email.subject.clone()))?;

        let document = EmailDocument::parse(&email.body);
        let text = document.text();

        let (order_status, status_keyword) =
            extract_order_status(&email.subject, text, &self.rules);

        let order = ParsedOrder {
            order_number,
            order_date: extract_order_date(text, &email.date, &self.rules),
            channel_source: self.channel_source.clone(),
            customer_name: self.field(text, Field::CustomerName),
            customer_phone: self.field(text, Field::CustomerPhone),
            customer_email: extract_email(text),
            shipping_address: self.field(text, Field::ShippingAddress),
            payment_method: self.field(text, Field::PaymentMethod),
            shipping_method: self.field(text, Field::ShippingMethod),
            order_status,
            status_keyword,
            payment_status: extract_payment_status(&email.subject, text, &self.rules),
            shipping_date: self.field(text, Field::ShippingDate),
            tracking_number: self.field(text, Field::TrackingNumber),
            payment_date: self.field(text, Field::PaymentDate),
            discount: self.amount(text, Field::Discount).unwrap_or(0),
            items: extract_order_items(&document, text, &self.rules),
            subtotal: self.amount(text, Field::Subtotal),
            shipping_fee: self.amount(text, Field::ShippingFee),
            total_amount: extract_total_amount(text, &self.rules),
            raw_subject: email.subject.clone(),
            email_date: email.date.clone(),
            email_id: email.id.clone(),
        };

        for issue in order.validate() {
            debug!("Order {}: {}", order.order_number, issue);
        }

        debug!(
            "Extracted order {} ({} items) in {}ms",
            order.order_number,
            order.items.len(),
            start.elapsed().as_millis()
        );

        Ok(order)
    }
}
