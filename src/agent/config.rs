//! Agent Configuration
//!
//! Configuration options for the invocation orchestrator.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful shopping assistant. \
Use the available tools to search products and restaurants, build carts and place orders. \
Always confirm prices, delivery fees and totals with the user before placing an order.";

/// Prompt used when the caller sends none
pub const DEFAULT_PROMPT: &str = "Hello";

/// Configuration for the orchestrator
///
/// Loaded from the `[agent]` section of the config file, or built in code:
///
/// ```ignore
/// let config = AgentConfig::new("You are a helpful assistant")
///     .with_max_tool_iterations(10)
///     .with_tool_events(false);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// System prompt for the LLM
    pub system_prompt: String,

    /// Maximum number of backend round trips per turn (prevents infinite loops)
    pub max_tool_iterations: usize,

    /// Whether tool requests and results are surfaced as events
    pub emit_tool_events: bool,

    /// Prompt used when a payload carries none
    pub default_prompt: String,
}

impl AgentConfig {
    /// Create a new agent configuration with a system prompt
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            max_tool_iterations: 25,
            emit_tool_events: true,
            default_prompt: DEFAULT_PROMPT.to_string(),
        }
    }

    /// Set maximum tool iterations per turn
    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    /// Enable or disable `ToolCallRequest` / `ToolCallResult` events
    pub fn with_tool_events(mut self, enabled: bool) -> Self {
        self.emit_tool_events = enabled;
        self
    }

    pub fn with_default_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.default_prompt = prompt.into();
        self
    }

    /// System prompt as sent to the backend (`None` when blank)
    pub fn system(&self) -> Option<String> {
        if self.system_prompt.trim().is_empty() {
            None
        } else {
            Some(self.system_prompt.clone())
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AgentConfig = toml::from_str("max_tool_iterations = 3").unwrap();
        assert_eq!(config.max_tool_iterations, 3);
        assert!(config.emit_tool_events);
        assert_eq!(config.default_prompt, "Hello");
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_blank_system_prompt() {
        assert!(AgentConfig::new("  ").system().is_none());
        assert!(AgentConfig::default().system().is_some());
    }
}
