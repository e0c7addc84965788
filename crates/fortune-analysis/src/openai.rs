//! Chat-completions client for OpenAI-compatible APIs.
//!
//! Implements [`TextGenerator`] with a per-request HTTP timeout and retry on
//! transient failures (see [`crate::retry`]). With a total budget set, every
//! attempt and back-off delay is fitted inside it.

use std::time::Duration;

use async_trait::async_trait;
use fortune_core::AppConfig;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::GenerationError;
use crate::generator::TextGenerator;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Client for the `/chat/completions` endpoint.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    completions_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
    budget: Option<Duration>,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("completions_url", &self.completions_url)
            .field("max_retries", &self.max_retries)
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiClient {
    /// Creates a client pointed at the public OpenAI API.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Result<Self, GenerationError> {
        Self::with_base_url(api_key, model, timeout_secs, max_retries, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (compatible providers, wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        max_retries: u32,
        base_url: &str,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("threads-fortune/0.1")
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            completions_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            max_retries,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            budget: None,
        })
    }

    /// Builds the client from application config.
    ///
    /// `generation_timeout_secs` becomes the total budget for one
    /// [`TextGenerator::complete`] call, shared by all of its attempts.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Http`] if the `reqwest::Client` cannot be built.
    pub fn from_app_config(api_key: &str, config: &AppConfig) -> Result<Self, GenerationError> {
        Ok(Self::with_base_url(
            api_key,
            &config.openai_model,
            config.generation_timeout_secs,
            config.generation_max_retries,
            &config.openai_base_url,
        )?
        .with_budget(Duration::from_secs(config.generation_timeout_secs)))
    }

    /// Cap the wall-clock time of one `complete` call, retries included.
    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Override the base delay between retries.
    #[must_use]
    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    async fn request_once(
        &self,
        body: &ChatRequest<'_>,
        timeout: Option<Duration>,
    ) -> Result<String, GenerationError> {
        let mut request = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(GenerationError::RateLimited { retry_after_secs });
        }

        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map_or_else(|_| text.trim().to_string(), |e| e.error.message);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| GenerationError::Malformed(format!("invalid completion body: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| GenerationError::Malformed("completion contained no text".to_string()))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
        };

        let deadline = self.budget.map(|budget| Instant::now() + budget);
        let mut attempts_left = self.max_retries.saturating_add(1);
        retry_with_backoff(self.max_retries, self.backoff_base_ms, deadline, || {
            let timeout = deadline.map(|d| {
                attempt_timeout(d.saturating_duration_since(Instant::now()), attempts_left)
            });
            attempts_left = attempts_left.saturating_sub(1);
            self.request_once(&body, timeout)
        })
        .await
    }
}

/// Even share of the `remaining` budget for the next attempt.
fn attempt_timeout(remaining: Duration, attempts_left: u32) -> Duration {
    remaining / attempts_left.max(1)
}
