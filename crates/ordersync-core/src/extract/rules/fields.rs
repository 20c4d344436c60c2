//! Text field extraction: order number, dates, contact details.

use tracing::debug;

use crate::models::email::parse_email_date;

use super::patterns::EMAIL;
use super::{ExtractionRules, Field, FieldExtractor, FieldPatterns};

/// Apply `patterns` in priority order and return the first captured value,
/// trimmed. Returns an empty string when nothing matches.
pub fn extract_field(text: &str, patterns: &FieldPatterns) -> String {
    patterns
        .extract(text)
        .map(|found| found.value)
        .unwrap_or_default()
}

/// Locate the order number in a subject line.
///
/// Only the subject is consulted; an order number that appears solely in the
/// body is not accepted.
pub fn extract_order_number(subject: &str, rules: &ExtractionRules) -> Option<String> {
    let patterns = rules.field(Field::OrderNumber);
    let candidates = patterns.extract_all(subject);

    if candidates.len() > 1 && candidates.iter().any(|c| c.value != candidates[0].value) {
        debug!(
            "Subject {:?} has conflicting order numbers, using {:?}",
            subject, candidates[0].value
        );
    }

    candidates
        .into_iter()
        .map(|c| c.value)
        .find(|value| !value.is_empty())
}

/// Locate the order date in the body, falling back to the email's own date
/// (as a UTC `YYYY-MM-DD`). Returns an empty string if neither is usable.
pub fn extract_order_date(text: &str, email_date: &str, rules: &ExtractionRules) -> String {
    let date = extract_field(text, rules.field(Field::OrderDate));
    if !date.is_empty() {
        return date;
    }

    parse_email_date(email_date)
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// First email address in the text.
pub fn extract_email(text: &str) -> String {
    EMAIL
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ExtractionRules {
        ExtractionRules::builtin()
    }

    #[test]
    fn test_order_number_label() {
        assert_eq!(
            extract_order_number("您有一筆新訂單 訂單編號: C20260101001", &rules()),
            Some("C20260101001".to_string())
        );
        assert_eq!(
            extract_order_number("訂單號碼：A1234567 付款完成", &rules()),
            Some("A1234567".to_string())
        );
    }

    #[test]
    fn test_order_number_hash_prefix() {
        assert_eq!(
            extract_order_number("新訂單通知 #C20260201002", &rules()),
            Some("C20260201002".to_string())
        );
        assert_eq!(
            extract_order_number("Your order #88421", &rules()),
            Some("88421".to_string())
        );
    }

    #[test]
    fn test_order_number_bare_token() {
        assert_eq!(
            extract_order_number("出貨通知 CB2026013 已寄出", &rules()),
            Some("CB2026013".to_string())
        );
        // embedded in a longer alphanumeric run is not a token
        assert_eq!(extract_order_number("refXCB2026013", &rules()), None);
    }

    #[test]
    fn test_order_number_label_beats_hash() {
        assert_eq!(
            extract_order_number("訂單編號：C111111 重新寄送 #C222222", &rules()),
            Some("C111111".to_string())
        );
    }

    #[test]
    fn test_order_number_absent() {
        assert_eq!(extract_order_number("一般通知信件", &rules()), None);
        assert_eq!(extract_order_number("", &rules()), None);
    }

    #[test]
    fn test_extract_field_colons() {
        let patterns = rules();
        let name = patterns.field(Field::CustomerName);
        assert_eq!(extract_field("收件人：王小明\n", name), "王小明");
        assert_eq!(extract_field("收件人: 王小明  \n", name), "王小明");
        assert_eq!(extract_field("訂購人姓名：陳大文\n", name), "陳大文");
        assert_eq!(extract_field("沒有收件資訊", name), "");
    }

    #[test]
    fn test_order_date_from_body() {
        let text = "訂單日期：2026/01/01 10:00\n";
        assert_eq!(
            extract_order_date(text, "Wed, 01 Jan 2026 10:00:00 +0800", &rules()),
            "2026/01/01 10:00"
        );

        let text = "下單時間：2026-02-03 15:04:05\n";
        assert_eq!(extract_order_date(text, "", &rules()), "2026-02-03 15:04:05");
    }

    #[test]
    fn test_order_date_falls_back_to_email_date() {
        assert_eq!(
            extract_order_date("no dates here", "Tue, 03 Feb 2026 15:00:00 +0800", &rules()),
            "2026-02-03"
        );
        // early morning local time is still the previous day in UTC
        assert_eq!(
            extract_order_date("", "Tue, 03 Feb 2026 05:00:00 +0800", &rules()),
            "2026-02-02"
        );
        assert_eq!(extract_order_date("", "", &rules()), "");
    }

    #[test]
    fn test_extract_email() {
        assert_eq!(
            extract_email("聯絡信箱：ming.wang+shop@example.com.tw 謝謝"),
            "ming.wang+shop@example.com.tw"
        );
        assert_eq!(extract_email("no address"), "");
    }
}
