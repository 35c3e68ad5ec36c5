//! Data models passed between pipeline stages.
//!
//! Everything here lives for a single run:
//! - [`MarketContext`]: headlines scraped from the news source
//! - [`GeneratedPost`]: the LLM's draft
//! - [`OutgoingMail`]: the email built from the draft
//! - [`FailureRecord`]: what gets saved when every send attempt fails

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Headlines scraped for one run, stamped with the local date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketContext {
    /// Local date in `YYYY-MM-DD` format.
    pub date: String,
    /// At most ten non-empty headlines, in page order.
    pub headlines: Vec<String>,
}

impl MarketContext {
    /// Stamp `headlines` with the local date of `now`.
    pub fn new(now: DateTime<Local>, headlines: Vec<String>) -> Self {
        Self {
            date: now.format("%Y-%m-%d").to_string(),
            headlines,
        }
    }
}

/// Plain-text post drafted by the language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPost(pub String);

impl GeneratedPost {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A fully addressed plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    /// Build the advisory email for `post`, dated `now`.
    pub fn advisory(
        from: Option<String>,
        to: Option<String>,
        post: &GeneratedPost,
        now: DateTime<Local>,
    ) -> Self {
        Self {
            from,
            to,
            subject: advisory_subject(now),
            body: post.as_str().to_string(),
        }
    }
}

/// Subject line used for every advisory email, e.g. `LinkedIn Advisory Post - 06 May 2025`.
pub fn advisory_subject(now: DateTime<Local>) -> String {
    format!("LinkedIn Advisory Post - {}", now.format("%d %b %Y"))
}

/// A post that could not be delivered, saved for manual recovery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FailureRecord {
    /// Local time the record was created, `YYYY-MM-DD HH:MM:SS.ffffff`.
    pub timestamp: String,
    /// Description of the last delivery error.
    pub error: String,
    /// The full post body.
    pub content: String,
    pub subject: String,
}

impl FailureRecord {
    /// Capture an undeliverable email.
    ///
    /// # Arguments
    ///
    /// * `mail` - The email that could not be sent; its subject and body are kept
    /// * `error` - Description of the last delivery error
    /// * `now` - When delivery gave up
    ///
    /// # Returns
    ///
    /// A record ready to be serialized, timestamped with microsecond precision.
    pub fn new(mail: &OutgoingMail, error: String, now: DateTime<Local>) -> Self {
        Self {
            timestamp: now.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            error,
            content: mail.body.clone(),
            subject: mail.subject.clone(),
        }
    }
}
