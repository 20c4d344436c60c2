//! Typed ledger rows.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::models::order::{LineItem, ParsedOrder};

use super::schema::{Column, LedgerSchema};

/// 1-based sheet row number; row 1 is the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RowLocation(pub usize);

impl RowLocation {
    /// Location of the data row at `index` (0-based, header excluded).
    pub fn from_data_index(index: usize) -> Self {
        Self(index + 2)
    }

    pub fn row(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RowLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}", self.0)
    }
}

/// A ledger row keyed by column. Columns without a value are blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerRow {
    values: BTreeMap<Column, String>,
}

impl LedgerRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a row from positional cells. Missing trailing cells are blank.
    pub fn from_cells(schema: &LedgerSchema, cells: &[String]) -> Self {
        let values = schema
            .columns()
            .zip(cells)
            .filter(|(_, value)| !value.is_empty())
            .map(|(column, value)| (column, value.clone()))
            .collect();
        Self { values }
    }

    pub fn get(&self, column: Column) -> &str {
        self.values.get(&column).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, column: Column, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.values.remove(&column);
        } else {
            self.values.insert(column, value);
        }
    }

    pub fn with(mut self, column: Column, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    /// Populated columns.
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.values.keys().copied()
    }

    /// Positional cells for the schema. Columns the schema lacks are dropped.
    pub fn to_cells(&self, schema: &LedgerSchema) -> Vec<String> {
        schema
            .columns()
            .map(|column| self.get(column).to_string())
            .collect()
    }
}

/// Expand an order into the rows a new order contributes to the ledger.
///
/// Multi-row layouts get one row per item, or one row with blank item
/// columns when the order has no items. Manual columns are left blank.
pub fn order_rows(order: &ParsedOrder, schema: &LedgerSchema, note: &str) -> Vec<LedgerRow> {
    let base = order_base_row(order, note);

    let rows = match schema.discriminator() {
        None => vec![single_row(order, base)],
        Some(_) if order.items.is_empty() => vec![base],
        Some(_) => order
            .items
            .iter()
            .map(|item| item_row(base.clone(), item))
            .collect(),
    };

    rows.into_iter()
        .map(|row| restrict_to(row, schema))
        .collect()
}

fn order_base_row(order: &ParsedOrder, note: &str) -> LedgerRow {
    let mut row = LedgerRow::new()
        .with(Column::OrderDate, order.order_date.as_str())
        .with(Column::OrderNumber, order.order_number.as_str())
        .with(Column::ChannelSource, order.channel_source.as_str())
        .with(Column::OrderStatus, order.order_status.label())
        .with(Column::CustomerName, order.customer_name.as_str())
        .with(Column::ShippingDate, order.shipping_date.as_str())
        .with(Column::TrackingNumber, order.tracking_number.as_str())
        .with(Column::PaymentStatus, order.payment_status.label())
        .with(Column::PaymentDate, order.payment_date.as_str())
        .with(Column::Note, note);

    if order.discount != 0 {
        row.set(Column::Coupon, order.discount.to_string());
    }
    row
}

fn item_row(base: LedgerRow, item: &LineItem) -> LedgerRow {
    base.with(Column::Sku, item.sku.clone().unwrap_or_default())
        .with(Column::ItemName, item.name.as_str())
        .with(Column::Quantity, item.quantity.to_string())
        .with(Column::UnitPrice, item.unit_price.to_string())
        .with(Column::LineAmount, item.subtotal.to_string())
}

fn single_row(order: &ParsedOrder, base: LedgerRow) -> LedgerRow {
    let amount = |value: Option<i64>| value.map(|v| v.to_string()).unwrap_or_default();

    let mut row = base
        .with(Column::ItemSummary, order.item_summary())
        .with(Column::Subtotal, amount(order.subtotal))
        .with(Column::ShippingFee, amount(order.shipping_fee))
        .with(Column::TotalAmount, amount(order.total_amount))
        .with(Column::CustomerPhone, order.customer_phone.as_str())
        .with(Column::ShippingAddress, order.shipping_address.as_str())
        .with(Column::PaymentMethod, order.payment_method.as_str())
        .with(Column::ShippingMethod, order.shipping_method.as_str());

    if order.discount != 0 {
        row.set(Column::Discount, order.discount.to_string());
    }
    row
}

fn restrict_to(mut row: LedgerRow, schema: &LedgerSchema) -> LedgerRow {
    row.values
        .retain(|column, _| schema.contains(*column) && !column.is_manual());
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::{LineItem, OrderStatus, PaymentStatus};
    use pretty_assertions::assert_eq;

    fn order() -> ParsedOrder {
        let mut order = ParsedOrder::new("C20260101001");
        order.order_date = "2026/01/01 10:00".to_string();
        order.channel_source = "Cyberbiz".to_string();
        order.customer_name = "王小明".to_string();
        order.discount = 100;
        order.subtotal = Some(800);
        order.shipping_fee = Some(60);
        order.total_amount = Some(760);
        order.items = vec![
            LineItem::new("能量膠 - 柑橘口味", 3, 450).with_sku(Some("EG-01".to_string())),
            LineItem::new("電解質粉 - 檸檬口味", 1, 350),
        ];
        order
    }

    #[test]
    fn test_multi_row_expansion() {
        let schema = LedgerSchema::multi_row();
        let rows = order_rows(&order(), &schema, "Gmail 自動匯入");
        assert_eq!(rows.len(), 2);

        let cells = rows[0].to_cells(&schema);
        assert_eq!(cells.len(), 23);
        assert_eq!(
            cells,
            vec![
                "2026/01/01 10:00", "C20260101001", "Cyberbiz", "EG-01", "能量膠 - 柑橘口味",
                "3", "450", "1350", "新訂單", "", "王小明", "", "", "", "", "", "", "", "100",
                "", "", "", "Gmail 自動匯入",
            ]
        );
        assert_eq!(rows[1].get(Column::ItemName), "電解質粉 - 檸檬口味");
        assert_eq!(rows[1].get(Column::Sku), "");
    }

    #[test]
    fn test_multi_row_without_items() {
        let mut order = order();
        order.items.clear();
        let rows = order_rows(&order, &LedgerSchema::multi_row(), "");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(Column::ItemName), "");
        assert_eq!(rows[0].get(Column::OrderNumber), "C20260101001");
    }

    #[test]
    fn test_single_row_expansion() {
        let schema = LedgerSchema::single_row();
        let mut order = order();
        order.order_status = OrderStatus::Paid;
        order.payment_status = PaymentStatus::Paid;

        let rows = order_rows(&order, &schema, "Gmail 自動匯入");
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(
            row.get(Column::ItemSummary),
            "能量膠 - 柑橘口味 x3; 電解質粉 - 檸檬口味 x1"
        );
        assert_eq!(row.get(Column::TotalAmount), "760");
        assert_eq!(row.get(Column::Discount), "100");
        assert_eq!(row.get(Column::OrderStatus), "已付款");
        assert_eq!(row.get(Column::PaymentStatus), "已收款");
        // item-level and coupon columns do not exist in this layout
        assert_eq!(row.get(Column::ItemName), "");
        assert_eq!(row.get(Column::Coupon), "");
    }

    #[test]
    fn test_manual_columns_blank() {
        for schema in [LedgerSchema::multi_row(), LedgerSchema::single_row()] {
            for row in order_rows(&order(), &schema, "note") {
                assert!(row.columns().all(|c| !c.is_manual()));
            }
        }
    }

    #[test]
    fn test_from_cells_pads_short_rows() {
        let schema = LedgerSchema::multi_row();
        let cells: Vec<String> = ["2026/01/01", "C1", "Cyberbiz"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let row = LedgerRow::from_cells(&schema, &cells);
        assert_eq!(row.get(Column::OrderNumber), "C1");
        assert_eq!(row.get(Column::ItemName), "");
        assert_eq!(row.to_cells(&schema).len(), 23);
    }
}
