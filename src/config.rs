//! Run configuration assembled once at startup.
//!
//! [`Config`] is built from the parsed [`Cli`] and handed to each stage by
//! reference. Nothing reads the environment after this point.

use crate::cli::{Backoff, Cli};
use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Where and how to scrape headlines.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub url: Url,
    pub headline_selector: String,
    pub user_agent: String,
    pub timeout: Duration,
}

/// Chat-completion endpoint settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// Always ends with `/` so endpoint paths join beneath it.
    pub api_base: Url,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

/// SMTP account and addressing.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub username: Option<String>,
    pub password: Option<String>,
    pub to: Option<String>,
}

/// Retry and fallback behaviour for delivery.
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    pub max_retries: usize,
    pub retry_delay: Duration,
    pub backoff: Backoff,
    pub failed_posts_dir: PathBuf,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            backoff: Backoff::Fixed,
            failed_posts_dir: PathBuf::from("failed_posts"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceConfig,
    pub llm: LlmConfig,
    pub mail: MailConfig,
    pub delivery: DeliveryPolicy,
}

impl Config {
    /// Build the run configuration from parsed command-line arguments.
    ///
    /// Blank secrets are treated as absent, and `api_base` gains a trailing
    /// slash so endpoint paths join beneath it.
    ///
    /// # Arguments
    ///
    /// * `cli` - Arguments after clap has merged flags, env vars and defaults
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if `source_url` or `api_base` does
    /// not parse as a URL.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let source_url = Url::parse(&cli.source_url).map_err(|source| ConfigError::InvalidUrl {
            field: "source_url",
            source,
        })?;

        let api_base = normalize_base(&cli.api_base).map_err(|source| ConfigError::InvalidUrl {
            field: "api_base",
            source,
        })?;

        Ok(Self {
            source: SourceConfig {
                url: source_url,
                headline_selector: cli.headline_selector.clone(),
                user_agent: cli.user_agent.clone(),
                timeout: Duration::from_secs(cli.fetch_timeout_secs),
            },
            llm: LlmConfig {
                api_key: non_empty(&cli.openai_key),
                api_base,
                model: cli.model.clone(),
                temperature: cli.temperature,
                timeout: Duration::from_secs(cli.llm_timeout_secs),
            },
            mail: MailConfig {
                host: cli.smtp_host.clone(),
                port: cli.smtp_port,
                timeout: Duration::from_secs(cli.smtp_timeout_secs),
                username: non_empty(&cli.gmail_user),
                password: non_empty(&cli.gmail_app_password),
                to: non_empty(&cli.email_to),
            },
            delivery: DeliveryPolicy {
                max_retries: cli.max_retries,
                retry_delay: Duration::from_secs(cli.retry_delay_secs),
                backoff: cli.backoff,
                failed_posts_dir: PathBuf::from(&cli.failed_posts_dir),
            },
        })
    }
}

/// Parse `raw` and make sure the path ends with a slash.
pub fn normalize_base(raw: &str) -> Result<Url, url::ParseError> {
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{raw}/"))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
