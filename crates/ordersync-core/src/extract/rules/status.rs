//! Order and payment status keyword matching.

use crate::models::order::{OrderStatus, PaymentStatus};

use super::ExtractionRules;

fn haystack(subject: &str, text: &str) -> String {
    format!("{subject} {text}")
}

/// Order status from subject and body. The matched keyword is returned with
/// the status; `None` means nothing matched and the status is the default.
pub fn extract_order_status(
    subject: &str,
    text: &str,
    rules: &ExtractionRules,
) -> (OrderStatus, Option<String>) {
    match rules.order_status().find(&haystack(subject, text)) {
        Some((keyword, status)) => (status, Some(keyword.to_string())),
        None => (OrderStatus::default(), None),
    }
}

/// Payment status from subject and body, `Unknown` when nothing matches.
pub fn extract_payment_status(subject: &str, text: &str, rules: &ExtractionRules) -> PaymentStatus {
    rules
        .payment_status()
        .find(&haystack(subject, text))
        .map(|(_, status)| status)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_keywords() {
        let rules = ExtractionRules::builtin();

        let (status, keyword) = extract_order_status("訂單編號: C123456 已出貨", "", &rules);
        assert_eq!(status, OrderStatus::Shipped);
        assert_eq!(keyword.as_deref(), Some("已出貨"));

        let (status, _) = extract_order_status("訂單通知", "您的訂單已取消", &rules);
        assert_eq!(status, OrderStatus::Cancelled);

        let (status, _) = extract_order_status("訂單通知", "退款處理中", &rules);
        assert_eq!(status, OrderStatus::Refunded);
    }

    #[test]
    fn test_order_status_table_order() {
        let rules = ExtractionRules::builtin();
        // "已付款" precedes "已出貨" in the table regardless of text position
        let (status, _) = extract_order_status("已出貨", "本訂單已付款", &rules);
        assert_eq!(status, OrderStatus::Paid);
    }

    #[test]
    fn test_order_status_default() {
        let rules = ExtractionRules::builtin();
        let (status, keyword) = extract_order_status("一般通知信件", "hello", &rules);
        assert_eq!(status, OrderStatus::NewOrder);
        assert_eq!(keyword, None);
    }

    #[test]
    fn test_payment_status() {
        let rules = ExtractionRules::builtin();
        assert_eq!(
            extract_payment_status("", "付款狀態：已付款", &rules),
            PaymentStatus::Paid
        );
        assert_eq!(
            extract_payment_status("", "付款狀態：尚未付款", &rules),
            PaymentStatus::Unpaid
        );
        assert_eq!(
            extract_payment_status("退款完成通知", "", &rules),
            PaymentStatus::Refunded
        );
        assert_eq!(
            extract_payment_status("訂單通知", "", &rules),
            PaymentStatus::Unknown
        );
    }
}
