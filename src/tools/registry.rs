//! Tool registry for a single provider
//!
//! The registry holds the fixed set of operations one provider process
//! exposes. Registration order is preserved so `tools/list` answers are
//! stable across calls.

use std::sync::Arc;

use serde_json::Value;

use super::tool::{Tool, ToolInvocationResult};

/// Registry that holds all tools of one provider
pub struct ToolRegistry {
    /// Provider name reported during the handshake
    name: String,

    /// Tools in registration order
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: Vec::new(),
        }
    }

    /// Provider name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a tool in the registry
    ///
    /// A tool whose name is already registered replaces nothing; the first
    /// registration is kept and the duplicate is dropped with a warning.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        if self.get(&name).is_some() {
            tracing::warn!("[ToolRegistry] Ignoring duplicate tool '{}' in '{}'", name, self.name);
            return;
        }
        tracing::debug!("[ToolRegistry] Registering tool '{}' in '{}'", name, self.name);
        self.tools.push(Arc::new(tool));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// All tools in registration order
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Execute a tool by name
    ///
    /// Unknown names produce a failed result rather than an error.
    pub fn execute(&self, name: &str, input: &Value) -> ToolInvocationResult {
        let Some(tool) = self.get(name) else {
            tracing::warn!("[ToolRegistry] Unknown tool '{}' in '{}'", name, self.name);
            return ToolInvocationResult::failure(format!("Unknown tool: {}", name));
        };

        tracing::info!("[ToolRegistry] Executing tool: {}", name);
        tracing::debug!("[ToolRegistry] Input: {}", input);

        let result = tool.execute(input);

        tracing::debug!(
            "[ToolRegistry] Tool {} completed. Success: {}",
            name,
            result.success
        );

        result
    }

    /// Get the list of tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo(&'static str);

    impl Tool for Echo {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "echo"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        fn execute(&self, input: &Value) -> ToolInvocationResult {
            ToolInvocationResult::success(input.clone(), self.0)
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new("empty");
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_registration_order_and_duplicates() {
        let mut registry = ToolRegistry::new("test");
        registry.register(Echo("b"));
        registry.register(Echo("a"));
        registry.register(Echo("b"));
        assert_eq!(registry.tool_names(), vec!["b", "a"]);
    }

    #[test]
    fn test_execute_unknown_is_failure() {
        let registry = ToolRegistry::new("test");
        let result = registry.execute("missing", &json!({}));
        assert!(!result.success);
        assert!(result.message.contains("missing"));
    }
}
