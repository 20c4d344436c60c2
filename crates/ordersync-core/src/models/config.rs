//! Configuration structures for the sync pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ledger::schema::SchemaVariant;
use crate::models::email::MailFilter;

/// Main configuration for ordersync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Order extraction configuration.
    pub extraction: ExtractionConfig,

    /// Ledger configuration.
    pub ledger: LedgerConfig,

    /// Mailbox configuration.
    pub mail: MailConfig,

    /// Run loop configuration.
    pub schedule: ScheduleConfig,
}

/// Order extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Channel label written on every order.
    pub channel_source: String,

    /// Extra patterns per field name, tried before the built-in ones.
    pub custom_patterns: BTreeMap<String, Vec<String>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            channel_source: "Cyberbiz".to_string(),
            custom_patterns: BTreeMap::new(),
        }
    }
}

/// Ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Active column layout.
    pub schema: SchemaVariant,

    /// Ledger file.
    pub path: PathBuf,

    /// Text written to the note column of imported rows.
    pub import_note: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            schema: SchemaVariant::MultiRow,
            path: PathBuf::from("ledger.csv"),
            import_note: "Gmail 自動匯入".to_string(),
        }
    }
}

/// Mailbox configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Directory holding `.eml` or JSON message dumps.
    pub mailbox_dir: PathBuf,

    /// Storefront sender address.
    pub sender: String,

    /// Keyword every order notification subject contains.
    pub subject_keyword: String,

    /// Days to look back on the first run.
    pub initial_fetch_days: u32,

    /// Days to look back on scheduled runs.
    pub incremental_fetch_days: u32,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            mailbox_dir: PathBuf::from("mail"),
            sender: "noreply@cyberbiz.co".to_string(),
            subject_keyword: "訂單".to_string(),
            initial_fetch_days: 30,
            incremental_fetch_days: 2,
        }
    }
}

impl MailConfig {
    /// Filter without a date bound.
    pub fn filter(&self) -> MailFilter {
        MailFilter::new(self.sender.clone(), self.subject_keyword.clone())
    }
}

/// Run loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minutes between scheduled runs.
    pub interval_minutes: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { interval_minutes: 10 }
    }
}

impl SyncConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SyncConfig =
            serde_json::from_str(r#"{"ledger": {"schema": "single_row"}}"#).unwrap();

        assert_eq!(config.ledger.schema, SchemaVariant::SingleRow);
        assert_eq!(config.ledger.import_note, "Gmail 自動匯入");
        assert_eq!(config.mail.initial_fetch_days, 30);
        assert_eq!(config.extraction.channel_source, "Cyberbiz");
        assert_eq!(config.schedule.interval_minutes, 10);
    }

    #[test]
    fn test_mail_filter_from_config() {
        let filter = MailConfig::default().filter();
        assert_eq!(filter.to_query(), "from:noreply@cyberbiz.co subject:訂單");
    }
}
