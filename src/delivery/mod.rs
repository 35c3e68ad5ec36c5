//! Email delivery with bounded retries and on-disk fallback.
//!
//! [`DeliveryManager`] makes up to `max_retries` attempts through a
//! [`Mailer`], sleeping according to a [`DelayStrategy`] between attempts.
//! Every failure is treated the same: a rejected login is retried exactly
//! like a timeout.
//!
//! ```text
//! PENDING ──ok──▶ SENT
//!    │
//!    └─err─▶ attempt < max ──delay──▶ PENDING
//!            attempt = max ──▶ FAILED ──write──▶ PERSISTED
//!                                       └─io err─▶ LOST
//! ```
//!
//! At most one [`FailureRecord`] is written per call, and only when every
//! attempt failed.

use crate::config::{DeliveryPolicy, MailConfig};
use crate::models::{FailureRecord, GeneratedPost, OutgoingMail};
use crate::outputs::failed::write_failure_record;
use chrono::Local;
use std::path::PathBuf;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

pub mod backoff;
pub mod smtp;

use backoff::{DelayStrategy, strategy_for};
use smtp::Mailer;

/// How a delivery ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Attempt number `attempts` succeeded.
    Sent { attempts: usize },
    /// Every attempt failed; the post was saved to `path` under `subject`.
    Persisted {
        path: PathBuf,
        subject: String,
        attempts: usize,
        error: String,
    },
    /// Every attempt failed and the post could not be saved either.
    Lost {
        attempts: usize,
        error: String,
        persist_error: String,
    },
}

impl DeliveryOutcome {
    /// Whether the email went out.
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent { .. })
    }

    /// Number of send attempts made.
    ///
    /// # Returns
    ///
    /// The successful attempt's number for [`DeliveryOutcome::Sent`], and the
    /// full retry budget otherwise.
    pub fn attempts(&self) -> usize {
        match self {
            DeliveryOutcome::Sent { attempts }
            | DeliveryOutcome::Persisted { attempts, .. }
            | DeliveryOutcome::Lost { attempts, .. } => *attempts,
        }
    }
}

/// Sends posts with retry, falling back to a JSON file on total failure.
#[derive(Debug)]
pub struct DeliveryManager<M> {
    mailer: M,
    strategy: Box<dyn DelayStrategy>,
    from: Option<String>,
    to: Option<String>,
    max_retries: usize,
    failed_posts_dir: PathBuf,
}

impl<M> DeliveryManager<M>
where
    M: Mailer,
{
    /// Create a manager around `mailer`.
    ///
    /// A `max_retries` of zero still makes one attempt.
    pub fn new(mailer: M, mail: &MailConfig, policy: &DeliveryPolicy) -> Self {
        Self {
            mailer,
            strategy: strategy_for(policy.backoff, policy.retry_delay),
            from: mail.username.clone(),
            to: mail.to.clone(),
            max_retries: policy.max_retries.max(1),
            failed_posts_dir: policy.failed_posts_dir.clone(),
        }
    }

    /// Replace the delay strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn DelayStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Email `post` to the configured recipient, dated now.
    pub async fn deliver_post(&self, post: &GeneratedPost) -> DeliveryOutcome {
        let mail = OutgoingMail::advisory(self.from.clone(), self.to.clone(), post, Local::now());
        self.deliver(&mail).await
    }

    /// Send `mail`, retrying up to the configured limit, then persist it.
    #[instrument(level = "info", skip_all, fields(subject = %mail.subject, max = self.max_retries))]
    pub async fn deliver(&self, mail: &OutgoingMail) -> DeliveryOutcome {
        let total_t0 = Instant::now();
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            let attempt_t0 = Instant::now();
            match self.mailer.send(mail).await {
                Ok(()) => {
                    info!(
                        attempt,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "Email sent successfully"
                    );
                    return DeliveryOutcome::Sent { attempts: attempt };
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max = self.max_retries,
                        kind = e.kind(),
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                        error = %e,
                        "Delivery attempt failed"
                    );
                    last_error = e.to_string();

                    if attempt < self.max_retries {
                        let delay = self.strategy.delay_for(attempt);
                        info!(?delay, "Retrying delivery");
                        sleep(delay).await;
                    }
                }
            }
        }

        error!(
            attempts = self.max_retries,
            elapsed_ms_total = total_t0.elapsed().as_millis(),
            error = %last_error,
            "Delivery exhausted retries; saving post to disk"
        );
        self.persist(mail, last_error).await
    }

    async fn persist(&self, mail: &OutgoingMail, error: String) -> DeliveryOutcome {
        let now = Local::now();
        let record = FailureRecord::new(mail, error.clone(), now);

        match write_failure_record(&self.failed_posts_dir, &record, now).await {
            Ok(path) => DeliveryOutcome::Persisted {
                path,
                subject: record.subject,
                attempts: self.max_retries,
                error,
            },
            Err(e) => {
                error!(
                    dir = %self.failed_posts_dir.display(),
                    error = %e,
                    "Failed to save undeliverable post; it is lost"
                );
                DeliveryOutcome::Lost {
                    attempts: self.max_retries,
                    error,
                    persist_error: e.to_string(),
                }
            }
        }
    }
}
