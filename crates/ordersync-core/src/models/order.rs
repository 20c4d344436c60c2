//! Order data models extracted from storefront notification emails.

use serde::{Deserialize, Serialize};

/// A complete order as recovered from one notification email.
///
/// `order_number` is never empty for a value produced by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOrder {
    /// Order identifier taken from the subject line.
    pub order_number: String,

    /// Order date as written in the email (free-form, may be empty).
    pub order_date: String,

    /// Sales channel label, constant per integration.
    pub channel_source: String,

    /// Recipient name.
    pub customer_name: String,

    /// Recipient phone number.
    pub customer_phone: String,

    /// Customer email address.
    pub customer_email: String,

    /// Shipping address.
    pub shipping_address: String,

    /// Payment method as written (e.g. 信用卡).
    pub payment_method: String,

    /// Shipping method as written (e.g. 宅配).
    pub shipping_method: String,

    /// Order lifecycle status.
    pub order_status: OrderStatus,

    /// Keyword that established `order_status`, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_keyword: Option<String>,

    /// Payment status.
    pub payment_status: PaymentStatus,

    /// Date the order was shipped.
    pub shipping_date: String,

    /// Carrier tracking number.
    pub tracking_number: String,

    /// Date the payment was received.
    pub payment_date: String,

    /// Discount amount (positive number, 0 when absent).
    pub discount: i64,

    /// Line items in extraction order.
    pub items: Vec<LineItem>,

    /// Items subtotal as stated in the email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<i64>,

    /// Shipping fee as stated in the email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_fee: Option<i64>,

    /// Total amount as stated in the email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<i64>,

    /// Raw subject line.
    pub raw_subject: String,

    /// Raw `Date` header of the email.
    pub email_date: String,

    /// Identifier of the source email.
    pub email_id: String,
}

/// One product entry within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Display name with any embedded product code removed.
    pub name: String,

    /// Product code split out of the display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,

    /// Quantity ordered (always > 0).
    pub quantity: u32,

    /// Unit price.
    pub unit_price: i64,

    /// Line amount. Taken from the table when present, otherwise
    /// `quantity * unit_price`.
    pub subtotal: i64,
}

impl LineItem {
    /// Create a line item whose subtotal is derived from quantity and price.
    /// The subtotal saturates instead of overflowing.
    pub fn new(name: impl Into<String>, quantity: u32, unit_price: i64) -> Self {
        Self {
            name: name.into(),
            sku: None,
            quantity,
            unit_price,
            subtotal: i64::from(quantity).saturating_mul(unit_price),
        }
    }

    /// Like [`LineItem::new`], but `None` when the derived subtotal does not
    /// fit in an `i64`.
    pub fn checked(name: impl Into<String>, quantity: u32, unit_price: i64) -> Option<Self> {
        let subtotal = i64::from(quantity).checked_mul(unit_price)?;
        Some(Self {
            subtotal,
            ..Self::new(name, quantity, unit_price)
        })
    }

    /// Attach a product code.
    pub fn with_sku(mut self, sku: Option<String>) -> Self {
        self.sku = sku;
        self
    }

    /// Override the derived subtotal with an explicitly stated amount.
    pub fn with_subtotal(mut self, subtotal: i64) -> Self {
        self.subtotal = subtotal;
        self
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed (新訂單).
    #[default]
    NewOrder,
    /// Order paid (已付款).
    Paid,
    /// Order shipped (已出貨).
    Shipped,
    /// Order cancelled (已取消).
    Cancelled,
    /// Return in progress (退貨中).
    Returning,
    /// Order refunded (已退款).
    Refunded,
}

impl OrderStatus {
    /// Ledger label for this status.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::NewOrder => "新訂單",
            OrderStatus::Paid => "已付款",
            OrderStatus::Shipped => "已出貨",
            OrderStatus::Cancelled => "已取消",
            OrderStatus::Returning => "退貨中",
            OrderStatus::Refunded => "已退款",
        }
    }
}

/// Payment status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment received.
    Paid,
    /// Payment outstanding.
    Unpaid,
    /// Payment returned to the customer.
    Refunded,
    /// No payment information in the email.
    #[default]
    Unknown,
}

impl PaymentStatus {
    /// Ledger label for this status. `Unknown` has no label.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "已收款",
            PaymentStatus::Unpaid => "未收款",
            PaymentStatus::Refunded => "已退款",
            PaymentStatus::Unknown => "",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PaymentStatus::Unknown)
    }
}

impl ParsedOrder {
    /// Create an order with only its identity populated.
    pub fn new(order_number: impl Into<String>) -> Self {
        Self {
            order_number: order_number.into(),
            ..Self::default()
        }
    }

    /// Whether the order carries shipping progress (date or tracking number).
    pub fn has_shipping_info(&self) -> bool {
        !self.shipping_date.is_empty() || !self.tracking_number.is_empty()
    }

    /// Whether the order carries payment progress.
    pub fn has_payment_info(&self) -> bool {
        self.payment_status.is_known() || !self.payment_date.is_empty()
    }

    /// Flattened item description used by the single-row ledger layout.
    pub fn item_summary(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("{} x{}", item.name, item.quantity))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Sum of all line amounts.
    pub fn items_total(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |total, item| total.saturating_add(item.subtotal))
    }

    /// Check the stated amounts against each other and return any issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.order_number.is_empty() {
            issues.push("Missing order number".to_string());
        }

        if self.items.is_empty() {
            issues.push("No line items".to_string());
        }

        if let Some(subtotal) = self.subtotal {
            let items_total = self.items_total();
            if !self.items.is_empty() && items_total != subtotal {
                issues.push(format!(
                    "Line item total ({}) differs from subtotal ({})",
                    items_total, subtotal
                ));
            }

            if let Some(total) = self.total_amount {
                let expected = subtotal
                    .saturating_add(self.shipping_fee.unwrap_or(0))
                    .saturating_sub(self.discount);
                if expected != total {
                    issues.push(format!(
                        "Subtotal + shipping - discount ({}) differs from total ({})",
                        expected, total
                    ));
                }
            }
        }

        issues
    }
}
