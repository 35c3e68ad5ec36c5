//! Error types for each pipeline stage.
//!
//! Every stage reports failure through its own enum so the pipeline can tell
//! "nothing to work with" apart from a transport fault, and so the delivery
//! loop can name what went wrong on each attempt.

use thiserror::Error;

/// Failures while fetching the market context.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport, timeout, or body read failure.
    #[error("request to news source failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a non-success status.
    #[error("news source returned HTTP {0}")]
    Status(u16),

    /// The configured headline selector is not valid CSS.
    #[error("invalid headline selector `{0}`")]
    Selector(String),

    /// The page parsed but no non-empty headline matched.
    #[error("no headlines found on the news source")]
    NoHeadlines,
}

impl FetchError {
    /// Whether retrying the fetch later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status(code) => *code == 429 || *code >= 500,
            FetchError::Selector(_) | FetchError::NoHeadlines => false,
        }
    }
}

/// Failures while asking the language model for a post.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("OPENAI_KEY is not set")]
    MissingApiKey,

    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API, with its error message when decodable.
    #[error("completion API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not decode completion response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API answered but produced no usable text.
    #[error("completion response contained no content")]
    EmptyCompletion,
}

impl GenerateError {
    /// Timeouts, rate limits, and server errors are transient; everything else
    /// (bad key, bad request, empty output) will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerateError::Http(e) => e.is_timeout() || e.is_connect(),
            GenerateError::Api { status, .. } => *status == 429 || *status >= 500,
            GenerateError::MissingApiKey
            | GenerateError::Decode(_)
            | GenerateError::EmptyCompletion => false,
        }
    }
}

/// Failure of a single delivery attempt.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Sender account, app password, or recipient absent from configuration.
    #[error("missing mail setting: {0} is not set")]
    MissingSetting(&'static str),

    /// The server rejected the login.
    #[error("SMTP authentication failed: {0}")]
    Auth(String),

    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build email message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

impl DeliveryError {
    /// Short name of the failure, used in per-attempt log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryError::MissingSetting(_) => "MissingSetting",
            DeliveryError::Auth(_) => "AuthenticationError",
            DeliveryError::Address(_) => "AddressError",
            DeliveryError::Build(_) => "BuildError",
            DeliveryError::Smtp(e) if e.is_permanent() => "SmtpPermanentError",
            DeliveryError::Smtp(e) if e.is_transient() => "SmtpTransientError",
            DeliveryError::Smtp(_) => "SmtpError",
        }
    }
}

/// Failure to write or read a saved post.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failure record JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Invalid configuration values detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
}
