//! Conversation events streamed to the caller of a turn

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::ToolInvocationResult;

/// One incremental piece of a turn's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// Text produced by the model, forwarded as it arrives
    TextDelta { content: String },

    /// The model asked for a tool call
    ToolCallRequest {
        tool_name: String,
        arguments: Value,
        call_id: String,
    },

    /// Result of a tool call, matched by `call_id`
    ToolCallResult {
        call_id: String,
        payload: ToolInvocationResult,
    },

    /// The turn finished; always the last event
    Done,
}

impl ConversationEvent {
    pub fn text(content: impl Into<String>) -> Self {
        ConversationEvent::TextDelta {
            content: content.into(),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ConversationEvent::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(ConversationEvent::text("Hi")).unwrap();
        assert_eq!(json, json!({"type": "text_delta", "content": "Hi"}));

        let json = serde_json::to_value(ConversationEvent::ToolCallResult {
            call_id: "toolu_1".into(),
            payload: ToolInvocationResult::failure("nope"),
        })
        .unwrap();
        assert_eq!(json["type"], "tool_call_result");
        assert_eq!(json["payload"]["success"], false);

        let json = serde_json::to_value(ConversationEvent::Done).unwrap();
        assert_eq!(json, json!({"type": "done"}));
    }
}
