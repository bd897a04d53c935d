//! Chat completion client
//!
//! Sends one non-streaming chat completion request and reports the token
//! usage returned by the endpoint together with the wall-clock time of the
//! call. Usage counts are taken as reported; they are not re-tokenized here.

use crate::error::ProbeError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Model name used when neither the driver nor the config supplies one
pub const DEFAULT_MODEL: &str = "llama";

/// Default per-request ceiling
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Chat message role + content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Parameters for one completion probe
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub seed: Option<u64>,
}

/// Token usage and elapsed time of one completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub response_time: Duration,
}

/// Anything that can execute a chat completion probe
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Execute one request, blocking until the full response is available
    async fn complete(&self, params: &CompletionParams) -> Result<Completion, ProbeError>;
}

/// Request body for the chat completion endpoint
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full chat completion URL, e.g. `http://localhost:8080/v1/chat/completions`
    pub url: String,
    /// Model name sent with every request
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Create a config, falling back to the default model name
    pub fn new(url: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            url: url.into(),
            model: if model.is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                model
            },
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// reqwest-backed client for OpenAI-compatible chat completion endpoints
pub struct HttpCompletionClient {
    client: Client,
    config: ClientConfig,
}

impl HttpCompletionClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self, ProbeError> {
        if config.url.is_empty() {
            return Err(ProbeError::MissingUrl);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Target URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Model name
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, params: &CompletionParams) -> Result<Completion, ProbeError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: &params.messages,
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: (params.max_tokens > 0).then_some(params.max_tokens),
            seed: params.seed,
        };

        info!(url = %self.config.url, max_tokens = params.max_tokens, "Sending request");

        let started = Instant::now();
        let result = self.client.post(&self.config.url).json(&body).send().await;
        let response_time = started.elapsed();

        let response =
            result.map_err(|e| ProbeError::from_transport(e, self.config.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            error!(status_code = status.as_u16(), "Received error response");
            return Err(ProbeError::Status(status.as_u16()));
        }

        let decoded: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::Timeout(self.config.timeout_secs)
                } else {
                    ProbeError::Decode(e.to_string())
                }
            })?;

        match decoded.choices.first() {
            Some(choice) => debug!(content = %choice.message.content, "Response content"),
            None => warn!("Response contains no choices"),
        }

        let completion = Completion {
            prompt_tokens: decoded.usage.prompt_tokens,
            completion_tokens: decoded.usage.completion_tokens,
            response_time,
        };

        info!(
            prompt_tokens = completion.prompt_tokens,
            completion_tokens = completion.completion_tokens,
            response_time_ms = response_time.as_millis() as u64,
            "Completion successful"
        );

        Ok(completion)
    }
}
