//! LLM Provider trait
//!
//! Abstracts the model backend so the orchestrator can be driven by the
//! Anthropic client or by a scripted backend in tests.

use anyhow::Result;
use futures::stream::Stream;
use std::pin::Pin;

use super::types::{Message, StreamEvent, ToolDefinition};

/// Boxed stream of backend events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Trait for model backends used by the orchestrator.
///
/// The backend receives the whole conversation so far on every call; tool
/// results are fed back by appending them as user content blocks.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stream a request with tools and system prompt.
    ///
    /// Returns an async stream of StreamEvent that yields events as they arrive.
    async fn stream_with_tools_and_system(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
    ) -> Result<EventStream>;

    /// Get the current model name.
    fn model(&self) -> String;

    /// Get the provider name (e.g., "anthropic").
    fn provider_name(&self) -> &str;
}
