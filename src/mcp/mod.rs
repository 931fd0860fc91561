//! Tool provider connections
//!
//! This module connects the relay to its tool providers and serves the
//! built-in ones.
//!
//! # Architecture
//!
//! - `ProviderConfig`: Launch configuration of one provider process
//! - `ProviderChannel` / `ProviderLauncher`: The request/response seam and its factory
//! - `McpChannel` / `ProcessLauncher`: rmcp client over a child process's stdio
//! - `ProviderRegistry`: Opens and releases all providers as one scoped unit
//! - `CapabilityAggregator`: Merges provider operations into one tool set.
//!   A name offered by several providers belongs to the first configured one
//!   (the built-in grocery and food providers both offer `place_order`)
//! - `StdioServer`: Serves a built-in `ToolRegistry` as an MCP provider
//!
//! # Usage
//!
//! ```ignore
//! use relay_agent::mcp::{CapabilityAggregator, ProcessLauncher, ProviderConfig, ProviderRegistry};
//!
//! let configs = vec![
//!     ProviderConfig::new("grocery", "relay-agent").with_args(["provider", "grocery"]),
//! ];
//!
//! let registry = ProviderRegistry::open(&configs, &ProcessLauncher).await?;
//! let tools = CapabilityAggregator::collect(registry.connections()).await;
//! let result = tools.dispatch("get_categories", serde_json::json!({})).await;
//! registry.close().await;
//! ```
//!
//! # Tool Names
//!
//! Operations keep the names their provider reports. When two providers
//! report the same name, the provider listed first in the configuration
//! keeps it and the other's operation is excluded.

mod aggregator;
mod channel;
mod config;
mod registry;
mod server;
mod stdio_server;
mod tool_adapter;

// Public exports
pub use aggregator::{CapabilityAggregator, ToolCollision};
pub use channel::{InProcessChannel, InProcessLauncher, OperationSpec, ProviderChannel, ProviderLauncher};
pub use config::{validate_providers, ProviderConfig};
pub use registry::{ProviderConnection, ProviderRegistry};
pub use server::{convert_call_result, McpChannel, ProcessLauncher};
pub use stdio_server::{call_tool_result, StdioServer};
pub use tool_adapter::ToolDescriptor;
