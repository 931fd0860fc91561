//! Capability Aggregator
//!
//! Merges the operations of every open provider into one flat,
//! name-addressable tool set and routes calls to the owning provider.

use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::registry::ProviderConnection;
use super::tool_adapter::ToolDescriptor;
use crate::core::DispatchError;
use crate::llm::ToolDefinition;
use crate::tools::ToolInvocationResult;

/// A tool name offered by more than one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCollision {
    pub name: String,
    /// Provider whose tool is kept (registered first)
    pub kept_provider: String,
    /// Provider whose tool was excluded
    pub dropped_provider: String,
}

/// Flat tool set across all providers
pub struct CapabilityAggregator {
    tools: BTreeMap<String, ToolDescriptor>,
    collisions: Vec<ToolCollision>,
    call_timeout: Option<Duration>,
}

impl CapabilityAggregator {
    /// Query every connection and merge the results
    ///
    /// Connections are listed concurrently, but their tools are inserted in
    /// the order of `connections`, so the first registered provider always
    /// wins a name. A provider whose listing fails contributes nothing.
    pub async fn collect(connections: &[Arc<ProviderConnection>]) -> Self {
        tracing::info!(
            "[CapabilityAggregator] Collecting tools from {} provider(s)",
            connections.len()
        );

        let listings = join_all(connections.iter().map(|c| c.list_operations())).await;

        let mut tools: BTreeMap<String, ToolDescriptor> = BTreeMap::new();
        let mut collisions = Vec::new();

        for (connection, listing) in connections.iter().zip(listings) {
            let operations = match listing {
                Ok(ops) => ops,
                Err(e) => {
                    tracing::warn!(
                        "[CapabilityAggregator] Failed to get tools from provider '{}': {:#}",
                        connection.name(),
                        e
                    );
                    continue;
                }
            };

            for operation in operations {
                if let Some(existing) = tools.get(&operation.name) {
                    let collision = ToolCollision {
                        name: operation.name.clone(),
                        kept_provider: existing.provider().to_string(),
                        dropped_provider: connection.name().to_string(),
                    };
                    tracing::warn!(
                        "[CapabilityAggregator] Tool '{}' from '{}' shadowed by '{}'; keeping the first",
                        collision.name,
                        collision.dropped_provider,
                        collision.kept_provider
                    );
                    collisions.push(collision);
                    continue;
                }

                let descriptor = ToolDescriptor::new(connection.clone(), operation);
                tools.insert(descriptor.qualified_name.clone(), descriptor);
            }
        }

        tracing::info!(
            "[CapabilityAggregator] {} tool(s) available, {} collision(s)",
            tools.len(),
            collisions.len()
        );

        Self {
            tools,
            collisions,
            call_timeout: None,
        }
    }

    /// Bound every dispatched call; `None` waits indefinitely
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Tool names in sorted order
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Duplicates excluded during collection
    pub fn collisions(&self) -> &[ToolCollision] {
        &self.collisions
    }

    /// Tool definitions for the model backend, ordered by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(ToolDescriptor::definition).collect()
    }

    /// Call a tool by name
    ///
    /// Never fails: unknown names, bad arguments, broken channels and
    /// timeouts all come back as `success: false` results.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> ToolInvocationResult {
        let Some(descriptor) = self.tools.get(name) else {
            let err = DispatchError::UnknownToolRequested(name.to_string());
            tracing::warn!("[CapabilityAggregator] {}", err);
            return ToolInvocationResult::failure(err.to_string());
        };

        let arguments = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let err = DispatchError::ToolDispatchFailed {
                    tool: name.to_string(),
                    cause: format!("arguments must be a JSON object, got {}", other),
                };
                tracing::warn!("[CapabilityAggregator] {}", err);
                return ToolInvocationResult::failure(err.to_string());
            }
        };

        tracing::info!(
            "[CapabilityAggregator] Dispatching '{}' to provider '{}'",
            name,
            descriptor.provider()
        );

        let call = descriptor.origin.invoke(name, arguments);
        let outcome = match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!("timed out after {}ms", limit.as_millis())),
            },
            None => call.await,
        };

        match outcome {
            Ok(result) => {
                tracing::debug!(
                    "[CapabilityAggregator] Tool '{}' completed. Success: {}",
                    name,
                    result.success
                );
                result
            }
            Err(e) => {
                let err = DispatchError::ToolDispatchFailed {
                    tool: name.to_string(),
                    cause: format!("{:#}", e),
                };
                tracing::warn!("[CapabilityAggregator] {}", err);
                ToolInvocationResult::failure(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::channel::InProcessChannel;
    use crate::mcp::config::ProviderConfig;
    use crate::tools::{BuiltinProvider, OrderIdStrategy};
    use serde_json::json;

    fn connection(name: &str, provider: BuiltinProvider) -> Arc<ProviderConnection> {
        Arc::new(ProviderConnection::new(
            ProviderConfig::new(name, "unused"),
            Arc::new(InProcessChannel::new(Arc::new(
                provider.registry(OrderIdStrategy::Counter),
            ))),
        ))
    }

    #[tokio::test]
    async fn test_place_order_collision_keeps_first() {
        let connections = vec![
            connection("grocery", BuiltinProvider::Grocery),
            connection("food", BuiltinProvider::Food),
        ];
        let aggregator = CapabilityAggregator::collect(&connections).await;

        // 5 grocery tools + 3 food tools, minus the shadowed place_order
        assert_eq!(aggregator.len(), 7);
        assert_eq!(aggregator.get("place_order").unwrap().provider(), "grocery");
        assert_eq!(
            aggregator.collisions(),
            &[ToolCollision {
                name: "place_order".into(),
                kept_provider: "grocery".into(),
                dropped_provider: "food".into(),
            }]
        );

        let names: Vec<String> = aggregator.definitions().into_iter().map(|d| d.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn test_dispatch_never_fails() {
        let connections = vec![connection("grocery", BuiltinProvider::Grocery)];
        let aggregator = CapabilityAggregator::collect(&connections).await;

        let unknown = aggregator.dispatch("nonexistent", json!({})).await;
        assert!(!unknown.success);
        assert!(unknown.message.contains("nonexistent"));

        let bad_args = aggregator.dispatch("get_categories", json!([1, 2])).await;
        assert!(!bad_args.success);

        let ok = aggregator.dispatch("get_categories", Value::Null).await;
        assert!(ok.success, "{}", ok.message);

        connections[0].release().await.unwrap();
        let closed = aggregator.dispatch("get_categories", json!({})).await;
        assert!(!closed.success);
    }
}
