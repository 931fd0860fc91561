//! Tool trait definition
//!
//! Every operation a tool provider exposes implements this trait, and every
//! call returns a `ToolInvocationResult`. Failures are encoded in the result,
//! never raised across the provider boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of invoking a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    /// Whether the call succeeded
    pub success: bool,
    /// Structured output of the call (`null` when there is none)
    #[serde(default)]
    pub payload: Value,
    /// Human-readable summary the model can narrate
    #[serde(default)]
    pub message: String,
}

impl ToolInvocationResult {
    /// Create a successful result
    pub fn success(payload: Value, message: impl Into<String>) -> Self {
        Self {
            success: true,
            payload,
            message: message.into(),
        }
    }

    /// Create a failed result with no payload
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: Value::Null,
            message: message.into(),
        }
    }

    /// Render the result as the text fed back to the model
    pub fn to_feedback(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

/// Trait for operations exposed by a tool provider
///
/// Calls are synchronous and self-contained: the only state a tool may read
/// is the dataset it was constructed with.
pub trait Tool: Send + Sync {
    /// Get the name of this tool
    fn name(&self) -> &str;

    /// Get a description of this tool
    fn description(&self) -> &str;

    /// JSON schema of the argument record
    fn input_schema(&self) -> Value;

    /// Execute the tool with the given arguments
    ///
    /// Required fields are validated here; the caller passes arguments
    /// through untouched.
    fn execute(&self, input: &Value) -> ToolInvocationResult;
}
