//! Local mailbox: a directory of `.eml` files and JSON message dumps.

use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use tracing::{debug, warn};

use ordersync_core::sync::MailSource;
use ordersync_core::{MailError, MailFilter, RawEmail};

/// Mail collaborator reading messages from a directory tree.
///
/// `.eml` files hold one RFC 822 message each. `.json` files hold either one
/// message object or an array of them (`id`, `subject`, `from`, `date`,
/// `body`).
#[derive(Debug, Clone)]
pub struct EmlMailbox {
    dir: PathBuf,
}

impl EmlMailbox {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every message file under the directory, sorted by path.
    pub fn message_files(&self) -> Result<Vec<PathBuf>, MailError> {
        if !self.dir.is_dir() {
            return Err(MailError::Source(format!(
                "mailbox directory not found: {}",
                self.dir.display()
            )));
        }

        let mut files = Vec::new();
        for ext in ["eml", "json"] {
            let pattern = self.dir.join("**").join(format!("*.{ext}"));
            let entries = glob(&pattern.to_string_lossy())
                .map_err(|e| MailError::Source(e.to_string()))?;
            files.extend(entries.filter_map(|entry| entry.ok()));
        }
        files.sort();
        Ok(files)
    }
}

impl MailSource for EmlMailbox {
    fn fetch(&mut self, filter: &MailFilter) -> Result<Vec<RawEmail>, MailError> {
        let mut emails = Vec::new();

        for path in self.message_files()? {
            match read_messages(&path) {
                Ok(messages) => emails.extend(messages),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        let total = emails.len();
        emails.retain(|email| filter.matches(email));
        debug!(
            "Mailbox {}: {} of {} messages match",
            self.dir.display(),
            emails.len(),
            total
        );
        Ok(emails)
    }
}

/// Read the messages stored in one file.
pub fn read_messages(path: &Path) -> Result<Vec<RawEmail>, MailError> {
    let data = fs::read(path)
        .map_err(|e| MailError::Source(format!("{}: {}", path.display(), e)))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => parse_json(path, &data),
        _ => {
            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("message")
                .to_string();
            Ok(vec![RawEmail::from_eml(id, &data)?])
        }
    }
}

fn parse_json(path: &Path, data: &[u8]) -> Result<Vec<RawEmail>, MailError> {
    let value: serde_json::Value = serde_json::from_slice(data).map_err(|e| MailError::Decode {
        id: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let decoded = if value.is_array() {
        serde_json::from_value::<Vec<RawEmail>>(value)
    } else {
        serde_json::from_value::<RawEmail>(value).map(|email| vec![email])
    };

    decoded.map_err(|e| MailError::Decode {
        id: path.display().to_string(),
        reason: e.to_string(),
    })
}
