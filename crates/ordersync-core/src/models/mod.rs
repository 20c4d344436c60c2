//! Data models shared across the pipeline.

pub mod config;
pub mod email;
pub mod order;

pub use config::SyncConfig;
pub use email::{MailFilter, RawEmail, parse_email_date};
pub use order::{LineItem, OrderStatus, ParsedOrder, PaymentStatus};
