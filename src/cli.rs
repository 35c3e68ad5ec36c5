//! Command-line interface definitions for the advisory post pipeline.
//!
//! The program runs with no arguments; every option has a default or is read
//! from the environment (a `.env` file in the working directory is loaded
//! first). Secrets are optional here and only fail when a stage needs them.

use clap::{Parser, ValueEnum};

/// How long to wait between failed email attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backoff {
    /// Same delay after every failed attempt.
    Fixed,
    /// Delay doubles each attempt, capped, with a little jitter.
    Exponential,
}

/// Command-line arguments for the advisory post pipeline.
///
/// # Examples
///
/// ```sh
/// # Everything from the environment / .env
/// advisory_post
///
/// # Faster retries against a local mail relay
/// advisory_post --smtp-host localhost --smtp-port 1465 --retry-delay-secs 1
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Gmail account used to send the post
    #[arg(long, env = "GMAIL_USER", hide_env_values = true)]
    pub gmail_user: Option<String>,

    /// Gmail app password for the sender account
    #[arg(long, env = "GMAIL_APP_PASSWORD", hide_env_values = true)]
    pub gmail_app_password: Option<String>,

    /// Recipient of the drafted post
    #[arg(long, env = "EMAIL_TO", hide_env_values = true)]
    pub email_to: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_KEY", hide_env_values = true)]
    pub openai_key: Option<String>,

    /// Page to scrape headlines from
    #[arg(
        long,
        env = "ADVISORY_SOURCE_URL",
        default_value = "https://www.moneycontrol.com/news/business/markets/"
    )]
    pub source_url: String,

    /// CSS selector matching one headline element
    #[arg(long, env = "ADVISORY_HEADLINE_SELECTOR", default_value = "li.clearfix")]
    pub headline_selector: String,

    /// User-Agent header sent to the news source
    #[arg(long, env = "ADVISORY_USER_AGENT", default_value = "Mozilla/5.0")]
    pub user_agent: String,

    /// Timeout for the news page request, in seconds
    #[arg(long, default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_API_BASE", default_value = "https://api.openai.com/v1/")]
    pub api_base: String,

    /// Chat model used to draft the post
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub model: String,

    /// Sampling temperature for the completion
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Timeout for the completion request, in seconds
    #[arg(long, default_value_t = 120)]
    pub llm_timeout_secs: u64,

    /// SMTP host (implicit TLS)
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// SMTP port (implicit TLS)
    #[arg(long, env = "SMTP_PORT", default_value_t = 465)]
    pub smtp_port: u16,

    /// SMTP connection timeout, in seconds
    #[arg(long, default_value_t = 10)]
    pub smtp_timeout_secs: u64,

    /// Number of email attempts before saving the post to disk
    #[arg(long, default_value_t = 3)]
    pub max_retries: usize,

    /// Delay between email attempts, in seconds
    #[arg(long, default_value_t = 5)]
    pub retry_delay_secs: u64,

    /// Delay strategy between email attempts
    #[arg(long, value_enum, default_value_t = Backoff::Fixed)]
    pub backoff: Backoff,

    /// Directory where undeliverable posts are saved
    #[arg(long, env = "FAILED_POSTS_DIR", default_value = "failed_posts")]
    pub failed_posts_dir: String,
}
