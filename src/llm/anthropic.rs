//! Anthropic API client
//!
//! Direct HTTP client for the Anthropic Messages API streaming endpoint.
//!
//! # Authentication
//!
//! Reads the API key from an environment variable (`ANTHROPIC_API_KEY` by
//! default) or takes it directly.
//!
//! ```ignore
//! let llm = AnthropicProvider::from_env("ANTHROPIC_API_KEY")?
//!     .with_model("claude-sonnet-4-5")
//!     .with_max_tokens(4096);
//! ```

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::Client;
use std::env;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use super::provider::{EventStream, LlmProvider};
use super::types::{ApiError, Message, MessageRequest, StreamEvent, ToolDefinition};

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
const API_VERSION: &str = "2023-06-01";

/// Anthropic LLM provider
#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AnthropicProvider {
    /// Create a provider with an explicit API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }

    /// Create a provider reading the API key from `var`
    pub fn from_env(var: &str) -> Result<Self> {
        tracing::info!("[Anthropic] Creating provider from environment ({})", var);

        let api_key = env::var(var)
            .with_context(|| format!("Failed to create Anthropic client. Make sure {} is set", var))?;

        Ok(Self::new(api_key))
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the max tokens for responses
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the API base URL (proxies, gateways)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.api_base)
    }

    fn build_request(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
    ) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages,
            system,
            tools,
            temperature: self.temperature,
            stream: true,
        }
    }
}

/// Parse one SSE line into a stream event
///
/// Returns `None` for `event:` lines, comments, blank lines and data the
/// client does not understand.
pub fn parse_sse_line(line: &str) -> Option<StreamEvent> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }

    match serde_json::from_str::<StreamEvent>(data) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!("[Anthropic] Skipping unparseable stream event: {}", e);
            None
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn stream_with_tools_and_system(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
    ) -> Result<EventStream> {
        tracing::info!("[Anthropic] Streaming message with tools");
        tracing::debug!("[Anthropic] Messages count: {}", messages.len());
        tracing::debug!("[Anthropic] Tools count: {}", tools.len());

        let request = self.build_request(messages, system, tools);
        let request_json = serde_json::to_string(&request)
            .context("Failed to serialize Anthropic streaming request")?;
        tracing::trace!("[Anthropic] Request JSON: {}", request_json);

        let response = self
            .client
            .post(self.messages_url())
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .body(request_json)
            .send()
            .await
            .context("Failed to send streaming request to Anthropic API")?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            tracing::error!("[Anthropic] Streaming API error: {} - {}", status, error_text);

            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|e| format!("{}: {}", e.error.kind, e.error.message))
                .unwrap_or(error_text);
            anyhow::bail!("Anthropic API error ({}): {}", status, message);
        }

        tracing::info!("[Anthropic] Streaming response started");

        let byte_stream = response.bytes_stream();
        let stream_reader = StreamReader::new(
            byte_stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string()))),
        );
        let buf_reader = tokio::io::BufReader::new(stream_reader);

        let stream = async_stream::try_stream! {
            let mut lines = buf_reader.lines();

            while let Some(line) = lines.next_line().await? {
                let Some(event) = parse_sse_line(&line) else {
                    continue;
                };
                let is_stop = matches!(event, StreamEvent::MessageStop);
                yield event;
                if is_stop {
                    break;
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}
