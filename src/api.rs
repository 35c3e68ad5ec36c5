//! LLM API interaction for drafting the advisory post.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining a single async LLM request
//! - [`OpenAiChat`]: Implementation against an OpenAI-compatible
//!   `chat/completions` endpoint
//! - [`generate_post`]: Builds the prompt from a [`MarketContext`] and asks once
//!
//! No retry here: one request per run, and any failure
//! halts the pipeline.

use crate::config::LlmConfig;
use crate::error::GenerateError;
use crate::models::{GeneratedPost, MarketContext};
use crate::prompt::advisory_prompt;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Trait for async LLM interaction.
///
/// Implementors send text to an LLM and return its reply. The pipeline is
/// generic over this trait so tests can substitute a scripted model.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send `text` as a single user turn and return the reply.
    async fn ask(&self, text: &str) -> Result<Self::Response, GenerateError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// OpenAI-compatible chat-completion client.
#[derive(Debug)]
pub struct OpenAiChat {
    client: Client,
    config: LlmConfig,
}

impl OpenAiChat {
    /// Create a client for the endpoint and model in `config`.
    ///
    /// A missing API key is not an error here; it is reported by the first
    /// [`AskAsync::ask`] without sending a request.
    ///
    /// # Arguments
    ///
    /// * `config` - API base, key, model, temperature and request timeout
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Http`] if the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, GenerateError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        match self.config.api_base.join("chat/completions") {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}chat/completions", self.config.api_base),
        }
    }
}

impl AskAsync for OpenAiChat {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.config.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, GenerateError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GenerateError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: text,
            }],
            temperature: self.config.temperature,
        };

        let t0 = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| truncate_for_log(&body, 300));
            warn!(
                elapsed_ms = dt.as_millis(),
                status = status.as_u16(),
                %message,
                "Completion API returned an error"
            );
            return Err(GenerateError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        debug!(elapsed_ms = dt.as_millis(), choices = parsed.choices.len(), "Completion received");

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerateError::EmptyCompletion)
    }
}

/// Ask the model for an advisory post built from `context`.
///
/// Exactly one request is made. The reply is returned as-is; length, emoji
/// count and compliance wording are requested in the prompt but not checked.
#[instrument(level = "info", skip_all, fields(headlines = context.headlines.len()))]
pub async fn generate_post<A>(api: &A, context: &MarketContext) -> Result<GeneratedPost, GenerateError>
where
    A: AskAsync<Response = String>,
{
    let t0 = Instant::now();
    let prompt = advisory_prompt(context);
    let res = api.ask(&prompt).await;
    let dt = t0.elapsed();

    match res {
        Ok(text) => {
            info!(elapsed_ms_total = dt.as_millis(), chars = text.chars().count(), "generate_post succeeded");
            Ok(GeneratedPost(text))
        }
        Err(e) => {
            error!(
                elapsed_ms_total = dt.as_millis(),
                transient = e.is_transient(),
                error = %e,
                "generate_post failed"
            );
            Err(e)
        }
    }
}
