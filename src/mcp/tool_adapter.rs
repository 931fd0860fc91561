//! Tool descriptors
//!
//! Binds an operation reported by a provider to the connection that owns it.

use serde_json::Value;
use std::sync::Arc;

use crate::llm::{ToolDefinition, ToolInputSchema};

use super::channel::OperationSpec;
use super::registry::ProviderConnection;

/// One callable tool in the aggregated set
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    /// Name the model addresses the tool by
    pub qualified_name: String,

    /// Connection that serves the tool
    pub origin: Arc<ProviderConnection>,

    /// JSON schema exactly as the provider reported it
    pub raw_schema: Value,

    pub description: String,
}

impl ToolDescriptor {
    /// Describe `operation` as served by `origin`
    ///
    /// Operation names are exposed unchanged; uniqueness across providers is
    /// enforced by the aggregator.
    pub fn new(origin: Arc<ProviderConnection>, operation: OperationSpec) -> Self {
        Self {
            qualified_name: operation.name,
            origin,
            raw_schema: operation.input_schema,
            description: operation.description,
        }
    }

    /// Name of the provider that serves this tool
    pub fn provider(&self) -> &str {
        self.origin.name()
    }

    /// Convert to the backend's tool definition format
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.qualified_name.clone(),
            description: if self.description.is_empty() {
                None
            } else {
                Some(self.description.clone())
            },
            input_schema: ToolInputSchema::from_json_schema(&self.raw_schema),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::channel::InProcessChannel;
    use crate::mcp::config::ProviderConfig;
    use crate::tools::ToolRegistry;
    use serde_json::json;

    #[test]
    fn test_definition_conversion() {
        let origin = Arc::new(ProviderConnection::new(
            ProviderConfig::new("grocery", "unused"),
            Arc::new(InProcessChannel::new(Arc::new(ToolRegistry::new("grocery")))),
        ));

        let descriptor = ToolDescriptor::new(
            origin,
            OperationSpec {
                name: "search_products".into(),
                description: "Search the catalog".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"query": {"type": "string"}},
                    "required": ["query"]
                }),
            },
        );

        assert_eq!(descriptor.provider(), "grocery");

        let def = descriptor.definition();
        assert_eq!(def.name, "search_products");
        assert_eq!(def.description.as_deref(), Some("Search the catalog"));
        assert_eq!(def.input_schema.required, Some(vec!["query".to_string()]));
    }
}
