//! Built-in patterns for storefront notification emails.
//!
//! Field lists are ordered: earlier entries win. They are compiled into
//! [`ExtractionRules`](super::ExtractionRules) rather than used directly, so
//! callers can prepend their own phrasings per field.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::order::{OrderStatus, PaymentStatus};

/// Optional currency prefix in front of an amount.
macro_rules! amount_after {
    ($label:literal) => {
        concat!($label, r"[：:]\s*-?\s*(?:NT\$|＄|\$)?\s*-?\s*([\d,]+)")
    };
}

/// `YYYY/MM/DD` or `YYYY-MM-DD` with an optional `HH:MM[:SS]` part.
macro_rules! date_after {
    ($label:literal) => {
        concat!(
            $label,
            r"[：:]\s*(\d{4}[/\-]\d{1,2}[/\-]\d{1,2}(?:\s+\d{1,2}:\d{2}(?::\d{2})?)?)"
        )
    };
}

pub const ORDER_NUMBER: &[&str] = &[
    r"(?i)(?:訂單編號|訂單號碼|Order\s*#?)[：:\s]*([A-Za-z0-9\-]+)",
    r"#([A-Za-z]?\d{4,})",
    r"(?:^|[^A-Za-z0-9_])([A-Z]{1,3}\d{6,})(?:[^A-Za-z0-9_]|$)",
];

pub const ORDER_DATE: &[&str] = &[
    date_after!("訂單日期"),
    date_after!("下單時間"),
    // bare 日期, but not 出貨日期 / 付款日期 / 收款日期
    r"(?m)(?:^|[^貨款])日期[：:]\s*(\d{4}[/\-]\d{1,2}[/\-]\d{1,2})",
];

pub const CUSTOMER_NAME: &[&str] = &[
    r"收件人[：:]\s*(.+)",
    r"收件人姓名[：:]\s*(.+)",
    r"訂購人(?:姓名)?[：:]\s*(.+)",
];

pub const CUSTOMER_PHONE: &[&str] = &[
    r"電話[：:]\s*([\d\-+()]+)",
    r"手機[：:]\s*([\d\-+()]+)",
];

pub const SHIPPING_ADDRESS: &[&str] = &[
    r"(?:收件|配送|寄送)地址[：:]\s*(.+)",
    r"地址[：:]\s*(.+)",
];

pub const PAYMENT_METHOD: &[&str] = &[r"付款方式[：:]\s*(.+)", r"支付方式[：:]\s*(.+)"];

pub const SHIPPING_METHOD: &[&str] = &[
    r"配送方式[：:]\s*(.+)",
    r"運送方式[：:]\s*(.+)",
    r"物流方式[：:]\s*(.+)",
];

pub const SHIPPING_DATE: &[&str] = &[
    date_after!("出貨日期"),
    date_after!("出貨時間"),
    date_after!("發貨日期"),
];

pub const TRACKING_NUMBER: &[&str] = &[
    r"(?:物流單號|貨運單號|託運單號)[：:]\s*([A-Za-z0-9\-]+)",
    r"(?:追蹤號碼|追蹤碼)[：:]\s*([A-Za-z0-9\-]+)",
];

pub const PAYMENT_DATE: &[&str] = &[
    date_after!("付款日期"),
    date_after!("付款時間"),
    date_after!("收款日期"),
];

pub const SUBTOTAL: &[&str] = &[amount_after!("小計"), amount_after!("商品金額")];

pub const SHIPPING_FEE: &[&str] = &[amount_after!("運費")];

pub const DISCOUNT: &[&str] = &[amount_after!("折扣"), amount_after!("優惠折抵")];

pub const TOTAL_AMOUNT: &[&str] = &[
    amount_after!("總計"),
    amount_after!("合計"),
    amount_after!("(?i:Total)"),
    amount_after!("應付金額"),
    amount_after!("訂單金額"),
];

/// Embedded product codes inside an item name. The whole match is removed
/// from the name; group 1 becomes the SKU.
pub const SKU: &[&str] = &[
    r"(?i)SKU[：:]\s*([A-Za-z0-9\-_]+)",
    r"貨號[：:]\s*([A-Za-z0-9\-_]+)",
    // bracketed codes start with a letter, so sizes like (500ml) stay in the name
    r"[(（]\s*([A-Za-z][A-Za-z0-9\-_]*\d[A-Za-z0-9\-_]*)\s*[)）]",
];

/// Status keywords in priority order. Table order breaks ties, not position
/// in the text.
pub const ORDER_STATUS_KEYWORDS: &[(&str, OrderStatus)] = &[
    ("已成立", OrderStatus::NewOrder),
    ("新訂單", OrderStatus::NewOrder),
    ("已付款", OrderStatus::Paid),
    ("付款完成", OrderStatus::Paid),
    ("已出貨", OrderStatus::Shipped),
    ("出貨通知", OrderStatus::Shipped),
    ("已取消", OrderStatus::Cancelled),
    ("取消", OrderStatus::Cancelled),
    ("退貨", OrderStatus::Returning),
    ("退款", OrderStatus::Refunded),
];

pub const PAYMENT_STATUS_KEYWORDS: &[(&str, PaymentStatus)] = &[
    ("已退款", PaymentStatus::Refunded),
    ("退款完成", PaymentStatus::Refunded),
    ("尚未付款", PaymentStatus::Unpaid),
    ("未付款", PaymentStatus::Unpaid),
    ("待付款", PaymentStatus::Unpaid),
    ("已付款", PaymentStatus::Paid),
    ("付款完成", PaymentStatus::Paid),
    ("付款成功", PaymentStatus::Paid),
    ("已收款", PaymentStatus::Paid),
];

lazy_static! {
    /// `<name> x<qty> $<price>` shorthand used by plain-text templates.
    pub static ref ITEM_SHORTHAND: Regex = Regex::new(
        r"(.+?)\s*[xX×]\s*(\d+)\s*(?:NT\$|＄|\$)?\s*([\d,]+)"
    ).unwrap();

    pub static ref EMAIL: Regex = Regex::new(
        r"[\w.\-+]+@[\w.\-]+\.\w+"
    ).unwrap();

    /// First run of digits, allowing thousands separators.
    pub static ref AMOUNT_DIGITS: Regex = Regex::new(
        r"\d[\d,]*"
    ).unwrap();

    /// A cell holding nothing but an amount, e.g. `NT$1,350` or `1350 元`.
    pub static ref STATED_AMOUNT: Regex = Regex::new(
        r"^\s*(?:NT\$|＄|\$)?\s*([\d,]+)(?:\.\d+)?\s*元?\s*$"
    ).unwrap();

    pub static ref LEADING_INT: Regex = Regex::new(
        r"^\s*(\d+)"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(
        r"\s+"
    ).unwrap();
}
