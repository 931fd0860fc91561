//! MCP provider channel
//!
//! Wraps an rmcp client service talking to a provider child process over
//! stdio.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, CallToolResult, ListToolsResult, RawContent};
use rmcp::service::RunningService;
use rmcp::transport::TokioChildProcess;
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::RwLock;

use super::channel::{OperationSpec, ProviderChannel, ProviderLauncher};
use super::config::ProviderConfig;
use crate::tools::ToolInvocationResult;

/// Channel to one MCP provider process
pub struct McpChannel {
    /// Provider name from its configuration
    name: String,

    /// The underlying rmcp service (None once closed)
    service: RwLock<Option<RunningService<RoleClient, ()>>>,
}

impl std::fmt::Debug for McpChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpChannel").field("name", &self.name).finish()
    }
}

impl McpChannel {
    /// Wrap an already running rmcp service
    pub fn from_service(name: impl Into<String>, service: RunningService<RoleClient, ()>) -> Self {
        let name = name.into();
        tracing::info!("[McpChannel] Created channel for '{}'", name);

        Self {
            name,
            service: RwLock::new(Some(service)),
        }
    }

    /// Spawn the configured process and perform the MCP handshake
    pub async fn spawn(config: &ProviderConfig) -> Result<Self> {
        tracing::info!(
            "[McpChannel] Launching '{}': {}",
            config.name,
            config.command_line()
        );

        let mut command = Command::new(&config.command);
        command.args(&config.args).envs(&config.env).kill_on_drop(true);

        let transport = TokioChildProcess::new(command)
            .with_context(|| format!("Failed to spawn '{}'", config.command))?;

        let service = ()
            .serve(transport)
            .await
            .with_context(|| format!("MCP handshake with '{}' failed", config.name))?;

        Ok(Self::from_service(config.name.clone(), service))
    }

    /// Provider name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the channel is still open
    pub async fn is_connected(&self) -> bool {
        self.service.read().await.is_some()
    }
}

#[async_trait]
impl ProviderChannel for McpChannel {
    async fn list_operations(&self) -> Result<Vec<OperationSpec>> {
        let service_guard = self.service.read().await;
        let service = service_guard
            .as_ref()
            .ok_or_else(|| anyhow!("Provider '{}' is not connected", self.name))?;

        tracing::debug!("[McpChannel] Listing tools from '{}'", self.name);

        let result: ListToolsResult = service.list_tools(Default::default()).await?;

        tracing::info!(
            "[McpChannel] Got {} tools from '{}'",
            result.tools.len(),
            self.name
        );

        Ok(result
            .tools
            .into_iter()
            .map(|tool| OperationSpec {
                name: tool.name.to_string(),
                description: tool
                    .description
                    .as_ref()
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                input_schema: Value::Object(tool.input_schema.as_ref().clone()),
            })
            .collect())
    }

    async fn invoke(
        &self,
        operation: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolInvocationResult> {
        let service_guard = self.service.read().await;
        let service = service_guard
            .as_ref()
            .ok_or_else(|| anyhow!("Provider '{}' is not connected", self.name))?;

        tracing::info!(
            "[McpChannel] Calling tool '{}' on provider '{}'",
            operation,
            self.name
        );
        tracing::debug!("[McpChannel] Arguments: {:?}", arguments);

        let result = service
            .call_tool(CallToolRequestParams {
                meta: None,
                name: operation.to_string().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await?;

        tracing::debug!("[McpChannel] Tool call completed for '{}'", operation);

        Ok(convert_call_result(result))
    }

    async fn close(&self) -> Result<()> {
        let Some(service) = self.service.write().await.take() else {
            return Ok(());
        };

        tracing::info!("[McpChannel] Closing '{}'", self.name);
        service
            .cancel()
            .await
            .with_context(|| format!("Failed to stop provider '{}'", self.name))?;
        Ok(())
    }
}

/// Convert an MCP call result into the tool result contract
///
/// Structured content holding a `ToolInvocationResult` is taken as is. Other
/// providers get their text content parsed as JSON when possible, with
/// `isError` deciding success.
pub fn convert_call_result(result: CallToolResult) -> ToolInvocationResult {
    let is_error = result.is_error.unwrap_or(false);

    if let Some(structured) = result.structured_content {
        return match serde_json::from_value::<ToolInvocationResult>(structured.clone()) {
            Ok(parsed) => parsed,
            Err(_) => ToolInvocationResult {
                success: !is_error,
                payload: structured,
                message: String::new(),
            },
        };
    }

    let mut text_parts = Vec::new();
    for content in &result.content {
        match &content.raw {
            RawContent::Text(text_content) => text_parts.push(text_content.text.clone()),
            other => match serde_json::to_string(other) {
                Ok(json) => text_parts.push(json),
                Err(e) => tracing::warn!("[McpChannel] Unserializable content: {}", e),
            },
        }
    }
    let text = text_parts.join("\n");

    if let Ok(parsed) = serde_json::from_str::<ToolInvocationResult>(&text) {
        return parsed;
    }

    let payload = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text.clone()));
    ToolInvocationResult {
        success: !is_error,
        payload,
        message: if is_error { text } else { String::new() },
    }
}

/// Launches providers as child processes speaking MCP over stdio
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

#[async_trait]
impl ProviderLauncher for ProcessLauncher {
    async fn launch(&self, config: &ProviderConfig) -> Result<Arc<dyn ProviderChannel>> {
        let channel = McpChannel::spawn(config).await?;
        Ok(Arc::new(channel))
    }
}
