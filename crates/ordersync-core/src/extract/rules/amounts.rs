//! Monetary amounts. Amounts are whole currency units; separators are
//! dropped and signs are ignored.

use super::patterns::AMOUNT_DIGITS;
use super::{ExtractionRules, Field, FieldExtractor, FieldPatterns};

/// Parse the first digit run in `raw`, ignoring thousands separators.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let digits = AMOUNT_DIGITS.find(raw)?.as_str().replace(',', "");
    digits.parse().ok()
}

/// First amount located by `patterns`, or `None` when no pattern matches.
pub fn extract_amount(text: &str, patterns: &FieldPatterns) -> Option<i64> {
    patterns
        .extract_all(text)
        .into_iter()
        .find_map(|found| parse_amount(&found.value))
}

/// Order total. Labels are tried in the configured order.
pub fn extract_total_amount(text: &str, rules: &ExtractionRules) -> Option<i64> {
    extract_amount(text, rules.field(Field::TotalAmount))
}
