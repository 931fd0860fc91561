//! Provider channels
//!
//! A channel is the request/response link to one provider. The registry only
//! sees this trait; how a channel is established is up to a `ProviderLauncher`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::config::ProviderConfig;
use crate::tools::{ToolInvocationResult, ToolRegistry};

/// One operation a provider reports as callable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON schema of the arguments object
    pub input_schema: Value,
}

/// Request/response link to one provider
#[async_trait]
pub trait ProviderChannel: Send + Sync {
    /// List the operations the provider exposes
    async fn list_operations(&self) -> Result<Vec<OperationSpec>>;

    /// Invoke one operation
    ///
    /// `Err` means the channel itself failed; a provider-side failure comes
    /// back as `Ok` with `success: false`.
    async fn invoke(&self, operation: &str, arguments: Map<String, Value>)
        -> Result<ToolInvocationResult>;

    /// Release the channel and whatever it owns (process, pipes)
    async fn close(&self) -> Result<()>;
}

/// Turns a provider configuration into a live channel
#[async_trait]
pub trait ProviderLauncher: Send + Sync {
    async fn launch(&self, config: &ProviderConfig) -> Result<Arc<dyn ProviderChannel>>;
}

/// Channel serving a `ToolRegistry` inside the current process
pub struct InProcessChannel {
    registry: Arc<ToolRegistry>,
    closed: AtomicBool,
}

impl InProcessChannel {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(anyhow!("Provider '{}' is closed", self.registry.name()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderChannel for InProcessChannel {
    async fn list_operations(&self) -> Result<Vec<OperationSpec>> {
        self.ensure_open()?;

        Ok(self
            .registry
            .tools()
            .iter()
            .map(|t| OperationSpec {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect())
    }

    async fn invoke(
        &self,
        operation: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolInvocationResult> {
        self.ensure_open()?;
        Ok(self.registry.execute(operation, &Value::Object(arguments)))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Launcher resolving provider names to in-process tool registries
///
/// The configured command is ignored; only the name is looked up.
#[derive(Default)]
pub struct InProcessLauncher {
    registries: HashMap<String, Arc<ToolRegistry>>,
}

impl InProcessLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `registry` for configurations named `name`
    pub fn with_registry(mut self, name: impl Into<String>, registry: ToolRegistry) -> Self {
        self.registries.insert(name.into(), Arc::new(registry));
        self
    }
}

#[async_trait]
impl ProviderLauncher for InProcessLauncher {
    async fn launch(&self, config: &ProviderConfig) -> Result<Arc<dyn ProviderChannel>> {
        let registry = self
            .registries
            .get(&config.name)
            .cloned()
            .ok_or_else(|| anyhow!("No in-process provider named '{}'", config.name))?;

        tracing::debug!("[InProcessLauncher] Serving '{}' in process", config.name);
        Ok(Arc::new(InProcessChannel::new(registry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{BuiltinProvider, OrderIdStrategy};
    use serde_json::json;

    fn grocery() -> InProcessChannel {
        InProcessChannel::new(Arc::new(
            BuiltinProvider::Grocery.registry(OrderIdStrategy::Counter),
        ))
    }

    #[tokio::test]
    async fn test_list_and_invoke() {
        let channel = grocery();

        let ops = channel.list_operations().await.unwrap();
        assert_eq!(ops.len(), 5);
        assert!(ops.iter().any(|o| o.name == "add_to_cart"));

        let args = json!({"product_id": "d1"}).as_object().cloned().unwrap();
        let result = channel.invoke("get_product_details", args).await.unwrap();
        assert!(result.success, "{}", result.message);
    }

    #[tokio::test]
    async fn test_closed_channel_errors() {
        let channel = grocery();
        channel.close().await.unwrap();

        assert!(channel.is_closed());
        assert!(channel.list_operations().await.is_err());
        assert!(channel.invoke("get_categories", Map::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_launcher_lookup() {
        let launcher = InProcessLauncher::new()
            .with_registry("food", BuiltinProvider::Food.registry(OrderIdStrategy::Counter));

        assert!(launcher.launch(&ProviderConfig::new("food", "unused")).await.is_ok());
        assert!(launcher.launch(&ProviderConfig::new("other", "unused")).await.is_err());
    }
}
