//! Ledger column layouts.
//!
//! Two layouts are in use: one row per line item ([`SchemaVariant::MultiRow`],
//! the 23-column sales sheet) and one row per order with a flattened item
//! summary ([`SchemaVariant::SingleRow`]). Columns are addressed by name; the
//! schema maps them to positions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Which ledger layout is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    /// One row per order.
    SingleRow,
    /// One row per line item.
    #[default]
    MultiRow,
}

impl SchemaVariant {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaVariant::SingleRow => "single_row",
            SchemaVariant::MultiRow => "multi_row",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Who writes a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnOwner {
    /// Filled when a row is appended, never patched afterwards.
    Imported,
    /// Filled on append and kept current by status patches.
    Tracked,
    /// Maintained by hand; never written by the sync.
    Manual,
}

/// Named ledger columns across both layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    OrderDate,
    OrderNumber,
    ChannelSource,
    Sku,
    ItemName,
    Quantity,
    UnitPrice,
    LineAmount,
    ItemSummary,
    Subtotal,
    ShippingFee,
    Discount,
    TotalAmount,
    OrderStatus,
    CustomerCode,
    CustomerName,
    CustomerPhone,
    ShippingAddress,
    PaymentMethod,
    ShippingMethod,
    ShippingDate,
    TrackingNumber,
    PaymentStatus,
    PaymentDate,
    Cost,
    GrossProfit,
    MarginRate,
    Coupon,
    TransactionFee,
    ServiceFee,
    PaymentProcessingFee,
    Note,
}

impl Column {
    pub fn owner(&self) -> ColumnOwner {
        match self {
            Column::OrderStatus
            | Column::ShippingDate
            | Column::TrackingNumber
            | Column::PaymentStatus
            | Column::PaymentDate => ColumnOwner::Tracked,
            Column::CustomerCode
            | Column::Cost
            | Column::GrossProfit
            | Column::MarginRate
            | Column::TransactionFee
            | Column::ServiceFee
            | Column::PaymentProcessingFee => ColumnOwner::Manual,
            _ => ColumnOwner::Imported,
        }
    }

    pub fn is_manual(&self) -> bool {
        self.owner() == ColumnOwner::Manual
    }
}

/// Status columns that are patched together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatchGroup {
    /// Order status, patched on the first row of an order only.
    OrderStatus,
    /// Shipping date and tracking number.
    Shipping,
    /// Payment status and payment date.
    Payment,
}

impl PatchGroup {
    pub fn columns(&self) -> &'static [Column] {
        match self {
            PatchGroup::OrderStatus => &[Column::OrderStatus],
            PatchGroup::Shipping => &[Column::ShippingDate, Column::TrackingNumber],
            PatchGroup::Payment => &[Column::PaymentStatus, Column::PaymentDate],
        }
    }
}

const MULTI_ROW: &[(Column, &str)] = &[
    (Column::OrderDate, "訂單日期"),
    (Column::OrderNumber, "訂單編號"),
    (Column::ChannelSource, "通路來源"),
    (Column::Sku, "SKU"),
    (Column::ItemName, "外部品名"),
    (Column::Quantity, "銷貨數量"),
    (Column::UnitPrice, "售價"),
    (Column::LineAmount, "銷貨金額"),
    (Column::OrderStatus, "訂單狀態"),
    (Column::CustomerCode, "客戶代碼"),
    (Column::CustomerName, "客戶名稱"),
    (Column::ShippingDate, "出貨日期"),
    (Column::TrackingNumber, "物流單號"),
    (Column::PaymentStatus, "收款狀態"),
    (Column::PaymentDate, "收款日期"),
    (Column::Cost, "成本"),
    (Column::GrossProfit, "毛利"),
    (Column::MarginRate, "毛利率"),
    (Column::Coupon, "賣場優惠券"),
    (Column::TransactionFee, "成交手續費"),
    (Column::ServiceFee, "其他服務費"),
    (Column::PaymentProcessingFee, "金流與系統處理費"),
    (Column::Note, "備註"),
];

const SINGLE_ROW: &[(Column, &str)] = &[
    (Column::OrderDate, "訂單日期"),
    (Column::OrderNumber, "訂單編號"),
    (Column::ChannelSource, "通路來源"),
    (Column::ItemSummary, "商品明細"),
    (Column::Subtotal, "商品小計"),
    (Column::ShippingFee, "運費"),
    (Column::Discount, "折扣"),
    (Column::TotalAmount, "訂單總額"),
    (Column::OrderStatus, "訂單狀態"),
    (Column::CustomerName, "客戶名稱"),
    (Column::CustomerPhone, "聯絡電話"),
    (Column::ShippingAddress, "收件地址"),
    (Column::PaymentMethod, "付款方式"),
    (Column::ShippingMethod, "配送方式"),
    (Column::ShippingDate, "出貨日期"),
    (Column::TrackingNumber, "物流單號"),
    (Column::PaymentStatus, "收款狀態"),
    (Column::PaymentDate, "收款日期"),
    (Column::Cost, "成本"),
    (Column::GrossProfit, "毛利"),
    (Column::Note, "備註"),
];

/// Positional layout of one schema variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSchema {
    variant: SchemaVariant,
    columns: &'static [(Column, &'static str)],
}

impl LedgerSchema {
    pub fn new(variant: SchemaVariant) -> Self {
        let columns = match variant {
            SchemaVariant::SingleRow => SINGLE_ROW,
            SchemaVariant::MultiRow => MULTI_ROW,
        };
        Self { variant, columns }
    }

    pub fn single_row() -> Self {
        Self::new(SchemaVariant::SingleRow)
    }

    pub fn multi_row() -> Self {
        Self::new(SchemaVariant::MultiRow)
    }

    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    /// Columns in sheet order.
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.columns.iter().map(|(column, _)| *column)
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|(_, header)| header.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// 0-based position of a column, `None` if the layout lacks it.
    pub fn position(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|(c, _)| *c == column)
    }

    pub fn contains(&self, column: Column) -> bool {
        self.position(column).is_some()
    }

    /// Column that tells apart the rows of one order, if the layout has
    /// several rows per order.
    pub fn discriminator(&self) -> Option<Column> {
        match self.variant {
            SchemaVariant::SingleRow => None,
            SchemaVariant::MultiRow => Some(Column::ItemName),
        }
    }

    /// Check a header row against the layout. Extra trailing columns are
    /// allowed.
    pub fn validate_header(&self, header: &[String]) -> Result<(), LedgerError> {
        for (index, (_, expected)) in self.columns.iter().enumerate() {
            let found = header.get(index).map(|h| h.trim()).unwrap_or("");
            if found != *expected {
                return Err(LedgerError::SchemaMismatch {
                    schema: self.variant.to_string(),
                    index,
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for LedgerSchema {
    fn default() -> Self {
        Self::new(SchemaVariant::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_row_layout() {
        let schema = LedgerSchema::multi_row();
        assert_eq!(schema.len(), 23);
        assert_eq!(schema.position(Column::OrderNumber), Some(1));
        assert_eq!(schema.position(Column::ItemName), Some(4));
        assert_eq!(schema.position(Column::OrderStatus), Some(8));
        assert_eq!(schema.position(Column::ShippingDate), Some(11));
        assert_eq!(schema.position(Column::PaymentDate), Some(14));
        assert_eq!(schema.position(Column::Note), Some(22));
        assert_eq!(schema.discriminator(), Some(Column::ItemName));
        assert!(!schema.contains(Column::ItemSummary));
    }

    #[test]
    fn test_single_row_layout() {
        let schema = LedgerSchema::single_row();
        assert_eq!(schema.discriminator(), None);
        assert!(schema.contains(Column::ItemSummary));
        assert!(!schema.contains(Column::ItemName));
        for group in [PatchGroup::OrderStatus, PatchGroup::Shipping, PatchGroup::Payment] {
            assert!(group.columns().iter().all(|c| schema.contains(*c)));
        }
    }

    #[test]
    fn test_patch_groups_only_tracked() {
        for group in [PatchGroup::OrderStatus, PatchGroup::Shipping, PatchGroup::Payment] {
            assert!(group.columns().iter().all(|c| c.owner() == ColumnOwner::Tracked));
        }
        assert!(Column::Cost.is_manual());
        assert!(Column::PaymentProcessingFee.is_manual());
        assert_eq!(Column::Coupon.owner(), ColumnOwner::Imported);
    }

    #[test]
    fn test_validate_header() {
        let schema = LedgerSchema::multi_row();
        let mut header = schema.headers();
        assert!(schema.validate_header(&header).is_ok());

        header.push("自訂欄".to_string());
        assert!(schema.validate_header(&header).is_ok());

        let err = LedgerSchema::single_row().validate_header(&header).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::SchemaMismatch { index: 3, ref found, .. } if found == "SKU"
        ));

        let err = schema.validate_header(&header[..5]).unwrap_err();
        assert!(matches!(err, LedgerError::SchemaMismatch { index: 5, .. }));
    }
}
