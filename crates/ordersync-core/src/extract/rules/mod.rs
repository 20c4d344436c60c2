//! Rule-based field extractors for order notification emails.

pub mod amounts;
pub mod fields;
pub mod patterns;
pub mod status;

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::models::order::{OrderStatus, PaymentStatus};

pub use amounts::{extract_amount, extract_total_amount, parse_amount};
pub use fields::{extract_email, extract_field, extract_order_date, extract_order_number};
pub use status::{extract_order_status, extract_payment_status};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract every candidate for the field, in priority order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value located by one of several candidate patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Index of the pattern that produced the value.
    pub pattern_index: usize,
    /// Source text that was matched.
    pub source: String,
}

impl<T> FieldMatch<T> {
    pub fn new(value: T, pattern_index: usize, source: impl Into<String>) -> Self {
        Self {
            value,
            pattern_index,
            source: source.into(),
        }
    }
}

/// Fields located by pattern lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    OrderNumber,
    OrderDate,
    CustomerName,
    CustomerPhone,
    ShippingAddress,
    PaymentMethod,
    ShippingMethod,
    ShippingDate,
    TrackingNumber,
    PaymentDate,
    Subtotal,
    ShippingFee,
    Discount,
    TotalAmount,
    Sku,
}

impl Field {
    pub const ALL: [Field; 15] = [
        Field::OrderNumber,
        Field::OrderDate,
        Field::CustomerName,
        Field::CustomerPhone,
        Field::ShippingAddress,
        Field::PaymentMethod,
        Field::ShippingMethod,
        Field::ShippingDate,
        Field::TrackingNumber,
        Field::PaymentDate,
        Field::Subtotal,
        Field::ShippingFee,
        Field::Discount,
        Field::TotalAmount,
        Field::Sku,
    ];

    /// Configuration key for the field.
    pub fn name(&self) -> &'static str {
        match self {
            Field::OrderNumber => "order_number",
            Field::OrderDate => "order_date",
            Field::CustomerName => "customer_name",
            Field::CustomerPhone => "customer_phone",
            Field::ShippingAddress => "shipping_address",
            Field::PaymentMethod => "payment_method",
            Field::ShippingMethod => "shipping_method",
            Field::ShippingDate => "shipping_date",
            Field::TrackingNumber => "tracking_number",
            Field::PaymentDate => "payment_date",
            Field::Subtotal => "subtotal",
            Field::ShippingFee => "shipping_fee",
            Field::Discount => "discount",
            Field::TotalAmount => "total_amount",
            Field::Sku => "sku",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Field::ALL.into_iter().find(|f| f.name() == name.trim())
    }

    fn builtin_patterns(&self) -> &'static [&'static str] {
        match self {
            Field::OrderNumber => patterns::ORDER_NUMBER,
            Field::OrderDate => patterns::ORDER_DATE,
            Field::CustomerName => patterns::CUSTOMER_NAME,
            Field::CustomerPhone => patterns::CUSTOMER_PHONE,
            Field::ShippingAddress => patterns::SHIPPING_ADDRESS,
            Field::PaymentMethod => patterns::PAYMENT_METHOD,
            Field::ShippingMethod => patterns::SHIPPING_METHOD,
            Field::ShippingDate => patterns::SHIPPING_DATE,
            Field::TrackingNumber => patterns::TRACKING_NUMBER,
            Field::PaymentDate => patterns::PAYMENT_DATE,
            Field::Subtotal => patterns::SUBTOTAL,
            Field::ShippingFee => patterns::SHIPPING_FEE,
            Field::Discount => patterns::DISCOUNT,
            Field::TotalAmount => patterns::TOTAL_AMOUNT,
            Field::Sku => patterns::SKU,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered candidate patterns for one field. The first pattern that matches
/// wins, and its first capture group is the value.
#[derive(Debug, Clone)]
pub struct FieldPatterns {
    field: Field,
    patterns: Vec<Regex>,
}

impl FieldPatterns {
    /// Compile a pattern list.
    pub fn compile<S: AsRef<str>>(field: Field, sources: &[S]) -> Result<Self, ExtractionError> {
        let patterns = sources
            .iter()
            .map(|source| {
                Regex::new(source.as_ref()).map_err(|e| ExtractionError::InvalidPattern {
                    field: field.name().to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { field, patterns })
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn prepend(&mut self, mut extra: FieldPatterns) {
        extra.patterns.append(&mut self.patterns);
        self.patterns = extra.patterns;
    }
}

impl FieldExtractor for FieldPatterns {
    type Output = FieldMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.patterns.iter().enumerate().find_map(|(index, pattern)| {
            let caps = pattern.captures(text)?;
            let value = caps.get(1).map_or("", |m| m.as_str()).trim();
            Some(FieldMatch::new(value.to_string(), index, &caps[0]))
        })
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.patterns
            .iter()
            .enumerate()
            .filter_map(|(index, pattern)| {
                let caps = pattern.captures(text)?;
                let value = caps.get(1).map_or("", |m| m.as_str()).trim();
                Some(FieldMatch::new(value.to_string(), index, &caps[0]))
            })
            .collect()
    }
}

/// Substring keyword table evaluated in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTable<T> {
    entries: Vec<(String, T)>,
}

impl<T: Copy> KeywordTable<T> {
    pub fn new(entries: &[(&str, T)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(keyword, value)| (keyword.to_string(), *value))
                .collect(),
        }
    }

    /// Return the first entry whose keyword occurs anywhere in `text`.
    pub fn find(&self, text: &str) -> Option<(&str, T)> {
        self.entries
            .iter()
            .find(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(keyword, value)| (keyword.as_str(), *value))
    }
}

/// Immutable pattern and keyword tables used by the extractors.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    fields: BTreeMap<Field, FieldPatterns>,
    order_status: KeywordTable<OrderStatus>,
    payment_status: KeywordTable<PaymentStatus>,
}

impl ExtractionRules {
    /// Rules built from the built-in pattern lists.
    pub fn builtin() -> Self {
        let fields = Field::ALL
            .into_iter()
            .map(|field| {
                let patterns = FieldPatterns::compile(field, field.builtin_patterns())
                    .expect("invalid built-in pattern");
                (field, patterns)
            })
            .collect();

        Self {
            fields,
            order_status: KeywordTable::new(patterns::ORDER_STATUS_KEYWORDS),
            payment_status: KeywordTable::new(patterns::PAYMENT_STATUS_KEYWORDS),
        }
    }

    /// Prepend configured patterns to the built-in lists, keyed by field name.
    pub fn with_custom_patterns(
        mut self,
        custom: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self, ExtractionError> {
        for (name, sources) in custom {
            let field =
                Field::from_name(name).ok_or_else(|| ExtractionError::UnknownField(name.clone()))?;
            let extra = FieldPatterns::compile(field, sources)?;
            self.set_or_prepend(field, extra);
        }
        Ok(self)
    }

    /// Replace the pattern list for one field.
    pub fn with_field(mut self, patterns: FieldPatterns) -> Self {
        self.fields.insert(patterns.field(), patterns);
        self
    }

    pub fn with_order_status_keywords(mut self, table: KeywordTable<OrderStatus>) -> Self {
        self.order_status = table;
        self
    }

    pub fn with_payment_status_keywords(mut self, table: KeywordTable<PaymentStatus>) -> Self {
        self.payment_status = table;
        self
    }

    pub fn field(&self, field: Field) -> &FieldPatterns {
        // every field is populated by `builtin`
        &self.fields[&field]
    }

    pub fn order_status(&self) -> &KeywordTable<OrderStatus> {
        &self.order_status
    }

    pub fn payment_status(&self) -> &KeywordTable<PaymentStatus> {
        &self.payment_status
    }

    fn set_or_prepend(&mut self, field: Field, extra: FieldPatterns) {
        match self.fields.get_mut(&field) {
            Some(existing) => existing.prepend(extra),
            None => {
                self.fields.insert(field, extra);
            }
        }
    }
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_patterns_first_match_wins() {
        let patterns =
            FieldPatterns::compile(Field::CustomerName, &[r"收件人[：:]\s*(.+)", r"姓名[：:]\s*(.+)"])
                .unwrap();

        let found = patterns.extract("姓名：李四\n收件人：王小明\n").unwrap();
        assert_eq!(found.value, "王小明");
        assert_eq!(found.pattern_index, 0);

        let all = patterns.extract_all("姓名：李四\n收件人：王小明\n");
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].value, "李四");
    }

    #[test]
    fn test_invalid_pattern_reports_field() {
        let err = FieldPatterns::compile(Field::Subtotal, &["(unclosed"]).unwrap_err();
        assert!(err.to_string().contains("subtotal"));
    }

    #[test]
    fn test_custom_patterns_take_priority() {
        let mut custom = BTreeMap::new();
        custom.insert(
            "customer_name".to_string(),
            vec![r"顧客[：:]\s*(.+)".to_string()],
        );
        let rules = ExtractionRules::builtin().with_custom_patterns(&custom).unwrap();

        let patterns = rules.field(Field::CustomerName);
        assert_eq!(patterns.len(), patterns::CUSTOMER_NAME.len() + 1);

        let found = patterns.extract("收件人：王小明\n顧客：陳大文\n").unwrap();
        assert_eq!(found.value, "陳大文");
    }

    #[test]
    fn test_unknown_custom_field() {
        let mut custom = BTreeMap::new();
        custom.insert("nickname".to_string(), vec![r"(.+)".to_string()]);
        let err = ExtractionRules::builtin().with_custom_patterns(&custom).unwrap_err();
        assert!(matches!(err, ExtractionError::UnknownField(name) if name == "nickname"));
    }

    #[test]
    fn test_injected_tables_replace_builtin() {
        let rules = ExtractionRules::builtin()
            .with_order_status_keywords(KeywordTable::new(&[("Shipped", OrderStatus::Shipped)]))
            .with_payment_status_keywords(KeywordTable::new(&[("Paid", PaymentStatus::Paid)]))
            .with_field(
                FieldPatterns::compile(Field::OrderNumber, &[r"Ref\s+(\w+)"]).unwrap(),
            );

        assert_eq!(
            extract_order_status("Ref W42 Shipped", "", &rules),
            (OrderStatus::Shipped, Some("Shipped".to_string()))
        );
        // built-in vocabulary is gone
        assert_eq!(extract_order_status("已出貨", "", &rules).0, OrderStatus::NewOrder);
        assert_eq!(extract_payment_status("", "Paid in full", &rules), PaymentStatus::Paid);
        assert_eq!(extract_payment_status("", "已付款", &rules), PaymentStatus::Unknown);

        assert_eq!(extract_order_number("Ref W42 Shipped", &rules), Some("W42".to_string()));
        assert_eq!(extract_order_number("訂單編號: C123456", &rules), None);
    }

    #[test]
    fn test_keyword_table_uses_table_order() {
        let table = KeywordTable::new(&[("出貨", 1u8), ("取消", 2u8)]);
        // "取消" appears first in the text but "出貨" is first in the table
        assert_eq!(table.find("取消後重新出貨"), Some(("出貨", 1)));
        assert_eq!(table.find("nothing"), None);
    }
}
