//! Raw notification emails and the filter used to fetch them.

use chrono::{DateTime, Days, NaiveDate, Utc};
use mailparse::{MailHeaderMap, ParsedMail, parse_mail};
use serde::{Deserialize, Serialize};

use crate::error::MailError;

/// An email as handed over by the mail collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEmail {
    /// Unique message identifier.
    pub id: String,

    /// Subject line.
    pub subject: String,

    /// Sender header.
    #[serde(default)]
    pub from: String,

    /// `Date` header, usually RFC 2822.
    #[serde(default)]
    pub date: String,

    /// Body content, HTML or plain text.
    #[serde(default)]
    pub body: String,
}

impl RawEmail {
    pub fn new(id: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    /// Decode an RFC 822 message. The HTML part is preferred over plain text.
    pub fn from_eml(id: impl Into<String>, data: &[u8]) -> Result<Self, MailError> {
        let id = id.into();
        let mail = parse_mail(data).map_err(|e| MailError::Decode {
            id: id.clone(),
            reason: e.to_string(),
        })?;

        let header = |name: &str| mail.headers.get_first_value(name).unwrap_or_default();

        Ok(Self {
            subject: header("Subject"),
            from: header("From"),
            date: header("Date"),
            body: best_body(&mail).unwrap_or_default(),
            id,
        })
    }

    /// Parse the `Date` header into a UTC timestamp.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_email_date(&self.date)
    }
}

/// Parse an email `Date` header into a UTC timestamp.
pub fn parse_email_date(date: &str) -> Option<DateTime<Utc>> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }

    // storefront templates get the weekday wrong often enough to ignore it
    let without_weekday = match date.split_once(',') {
        Some((weekday, rest)) if weekday.trim().len() <= 3 => rest.trim(),
        _ => date,
    };
    if let Ok(parsed) = DateTime::parse_from_rfc2822(without_weekday) {
        return Some(parsed.with_timezone(&Utc));
    }

    // mailparse tolerates comments and sloppier layouts than chrono does
    mailparse::dateparse(date)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn best_body(mail: &ParsedMail) -> Option<String> {
    fn walk(mail: &ParsedMail, mimetype: &str) -> Option<String> {
        if mail.ctype.mimetype.eq_ignore_ascii_case(mimetype) {
            if let Ok(body) = mail.get_body() {
                return Some(body);
            }
        }
        mail.subparts.iter().find_map(|part| walk(part, mimetype))
    }

    walk(mail, "text/html").or_else(|| walk(mail, "text/plain"))
}

/// Selects which messages a sync run looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailFilter {
    /// Sender address (substring match, case-insensitive). Empty matches all.
    pub sender: String,

    /// Keyword the subject must contain. Empty matches all.
    pub subject_keyword: String,

    /// Only messages dated on or after this day are kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<NaiveDate>,
}

impl MailFilter {
    pub fn new(sender: impl Into<String>, subject_keyword: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            subject_keyword: subject_keyword.into(),
            after: None,
        }
    }

    pub fn with_after(mut self, after: NaiveDate) -> Self {
        self.after = Some(after);
        self
    }

    /// Bound the filter to the last `days` days counted back from `today`.
    /// A window reaching past the earliest representable date starts there.
    pub fn since_days_ago(self, days: u32, today: NaiveDate) -> Self {
        let after = today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        self.with_after(after)
    }

    /// Render the filter as a mailbox search query.
    pub fn to_query(&self) -> String {
        let mut parts = Vec::new();
        if !self.sender.is_empty() {
            parts.push(format!("from:{}", self.sender));
        }
        if !self.subject_keyword.is_empty() {
            parts.push(format!("subject:{}", self.subject_keyword));
        }
        if let Some(after) = self.after {
            parts.push(format!("after:{}", after.format("%Y/%m/%d")));
        }
        parts.join(" ")
    }

    /// Check a fetched message against the filter.
    ///
    /// Messages with an unparseable date pass the date bound.
    pub fn matches(&self, email: &RawEmail) -> bool {
        if !self.sender.is_empty()
            && !email
                .from
                .to_lowercase()
                .contains(&self.sender.to_lowercase())
        {
            return false;
        }

        if !self.subject_keyword.is_empty() && !email.subject.contains(&self.subject_keyword) {
            return false;
        }

        match (self.after, email.timestamp()) {
            (Some(after), Some(ts)) => ts.date_naive() >= after,
            _ => true,
        }
    }
}
