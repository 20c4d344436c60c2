//! Line item extraction.
//!
//! Items come from the first item table in the email. Only when no table row
//! qualifies is the plain-text `<name> x<qty> $<price>` shorthand scanned;
//! results from the two sources are never combined.

use tracing::debug;

use crate::models::order::LineItem;

use super::document::EmailDocument;
use super::rules::patterns::{ITEM_SHORTHAND, LEADING_INT, STATED_AMOUNT, WHITESPACE};
use super::rules::{ExtractionRules, Field, parse_amount};

/// Extract line items from a parsed body and its visible text.
pub fn extract_order_items(
    document: &EmailDocument,
    text: &str,
    rules: &ExtractionRules,
) -> Vec<LineItem> {
    for (index, rows) in document.tables().iter().enumerate() {
        let items: Vec<LineItem> = rows
            .iter()
            .filter_map(|cells| parse_table_row(cells, rules))
            .collect();
        if !items.is_empty() {
            debug!("Found {} items in table {}", items.len(), index);
            return items;
        }
    }

    let items = extract_text_items(text, rules);
    if !items.is_empty() {
        debug!("Found {} items in text shorthand", items.len());
    }
    items
}

/// Parse one table row: name, quantity, unit price and an optional stated
/// line amount.
fn parse_table_row(cells: &[String], rules: &ExtractionRules) -> Option<LineItem> {
    if cells.len() < 3 {
        return None;
    }

    let (name, sku) = split_sku(&cells[0], rules);
    if name.is_empty() {
        return None;
    }

    let quantity = LEADING_INT
        .captures(&cells[1])
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|&q| q > 0)?;
    let unit_price = parse_amount(&cells[2]).unwrap_or(0);

    let Some(item) = LineItem::checked(name, quantity, unit_price) else {
        debug!("Skipping row with out-of-range amount: {:?}", cells);
        return None;
    };
    let mut item = item.with_sku(sku);
    if let Some(subtotal) = cells.get(3).and_then(|cell| stated_amount(cell)) {
        item = item.with_subtotal(subtotal);
    }
    Some(item)
}

fn stated_amount(cell: &str) -> Option<i64> {
    let caps = STATED_AMOUNT.captures(cell)?;
    parse_amount(&caps[1])
}

/// Scan text for `<name> x<qty> $<price>` entries, left to right.
pub fn extract_text_items(text: &str, rules: &ExtractionRules) -> Vec<LineItem> {
    ITEM_SHORTHAND
        .captures_iter(text)
        .filter_map(|caps| {
            let (name, sku) = split_sku(&caps[1], rules);
            let quantity = caps[2].parse::<u32>().ok().filter(|&q| q > 0)?;
            let unit_price = parse_amount(&caps[3]).unwrap_or(0);
            if name.is_empty() {
                return None;
            }
            LineItem::checked(name, quantity, unit_price).map(|item| item.with_sku(sku))
        })
        .collect()
}

/// Split an embedded product code out of an item name.
///
/// The whole code match is removed from the name and the remainder is
/// trimmed of whitespace and dangling separators.
pub fn split_sku(raw: &str, rules: &ExtractionRules) -> (String, Option<String>) {
    for pattern in rules.field(Field::Sku).patterns() {
        let Some(caps) = pattern.captures(raw) else {
            continue;
        };
        let (Some(whole), Some(code)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let rest = format!("{} {}", &raw[..whole.start()], &raw[whole.end()..]);
        let sku = Some(code.as_str().trim().to_string()).filter(|s| !s.is_empty());
        return (clean_name(&rest), sku);
    }

    (clean_name(raw), None)
}

fn clean_name(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '|' | '/'))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rules() -> ExtractionRules {
        ExtractionRules::builtin()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_table_row_derived_subtotal() {
        let item = parse_table_row(&row(&["能量膠 - 柑橘口味", "3", "NT$450"]), &rules()).unwrap();
        assert_eq!(
            item,
            LineItem {
                name: "能量膠 - 柑橘口味".to_string(),
                sku: None,
                quantity: 3,
                unit_price: 450,
                subtotal: 1350,
            }
        );
    }

    #[test]
    fn test_table_row_stated_subtotal_kept() {
        let item =
            parse_table_row(&row(&["能量膠 - 柑橘口味", "3", "NT$450", "NT$1,300"]), &rules())
                .unwrap();
        assert_eq!(item.unit_price, 450);
        assert_eq!(item.subtotal, 1300);

        // a fourth cell that is not an amount is ignored
        let item =
            parse_table_row(&row(&["能量膠", "3", "NT$450", "贈品 2 份"]), &rules()).unwrap();
        assert_eq!(item.subtotal, 1350);
    }

    #[test]
    fn test_table_row_rejections() {
        assert!(parse_table_row(&row(&["能量膠", "3"]), &rules()).is_none());
        assert!(parse_table_row(&row(&["能量膠", "0", "NT$450"]), &rules()).is_none());
        assert!(parse_table_row(&row(&["能量膠", "數量", "NT$450"]), &rules()).is_none());
        assert!(parse_table_row(&row(&["", "1", "NT$450"]), &rules()).is_none());
        // quantity x price does not fit in an i64
        assert!(
            parse_table_row(&row(&["能量膠", "10", "NT$999999999999999999"]), &rules()).is_none()
        );
    }

    #[test]
    fn test_table_row_quantity_prefix_and_missing_price() {
        let item = parse_table_row(&row(&["能量膠", "2 件", "洽詢"]), &rules()).unwrap();
        assert_eq!(item.quantity, 2);
        assert_eq!(item.unit_price, 0);
        assert_eq!(item.subtotal, 0);
    }

    #[test]
    fn test_split_sku_variants() {
        let r = rules();
        assert_eq!(
            split_sku("能量膠 SKU:EG-001", &r),
            ("能量膠".to_string(), Some("EG-001".to_string()))
        );
        assert_eq!(
            split_sku("貨號：A123 / 電解質粉", &r),
            ("電解質粉".to_string(), Some("A123".to_string()))
        );
        assert_eq!(
            split_sku("電解質粉 (EL-02) 檸檬", &r),
            ("電解質粉 檸檬".to_string(), Some("EL-02".to_string()))
        );
        // parentheses without a code are part of the name
        assert_eq!(split_sku("能量膠 (大包裝)", &r), ("能量膠 (大包裝)".to_string(), None));
        assert_eq!(split_sku("運動飲料 (500ml)", &r), ("運動飲料 (500ml)".to_string(), None));
        assert_eq!(split_sku("能量棒（12入）", &r), ("能量棒（12入）".to_string(), None));
    }

    #[test]
    fn test_size_variants_stay_distinct() {
        let doc = EmailDocument::parse(
            "<table>\
             <tr><th>商品</th><th>數量</th><th>金額</th></tr>\
             <tr><td>運動飲料 (500ml)</td><td>1</td><td>50</td></tr>\
             <tr><td>運動飲料 (1000ml)</td><td>2</td><td>90</td></tr>\
             </table>",
        );
        let items = extract_order_items(&doc, doc.text(), &rules());
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["運動飲料 (500ml)", "運動飲料 (1000ml)"]);
        assert!(items.iter().all(|i| i.sku.is_none()));
    }

    #[test]
    fn test_text_items() {
        let items = extract_text_items("能量棒 x2 $300\n運動飲料 × 3 NT$1,450\n總計：$750", &rules());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "能量棒");
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].subtotal, 600);
        assert_eq!(items[1].name, "運動飲料");
        assert_eq!(items[1].unit_price, 1450);
    }

    #[test]
    fn test_table_tier_excludes_text_tier() {
        let doc = EmailDocument::parse(
            "<table>\
             <tr><th>商品</th><th>數量</th><th>金額</th></tr>\
             <tr><td>能量膠</td><td>3</td><td>NT$450</td></tr>\
             </table>\
             <p>加購 能量棒 x2 $300</p>",
        );
        let items = extract_order_items(&doc, doc.text(), &rules());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "能量膠");
    }

    #[test]
    fn test_first_qualifying_table_wins() {
        let doc = EmailDocument::parse(
            "<table><tr><th>資訊</th></tr><tr><td>訂單</td><td>C1</td></tr></table>\
             <table>\
             <tr><th>商品</th><th>數量</th><th>金額</th></tr>\
             <tr><td>A</td><td>1</td><td>10</td></tr>\
             </table>\
             <table>\
             <tr><th>商品</th><th>數量</th><th>金額</th></tr>\
             <tr><td>B</td><td>1</td><td>20</td></tr>\
             </table>",
        );
        let items = extract_order_items(&doc, doc.text(), &rules());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "A");
    }

    #[test]
    fn test_text_tier_when_no_table_rows() {
        let doc = EmailDocument::parse("<p>能量棒 x2 $300</p><p>運動飲料 x3 $450</p>");
        let items = extract_order_items(&doc, doc.text(), &rules());
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].quantity, 3);
    }
}
