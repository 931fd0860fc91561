pub mod anthropic;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use provider::{EventStream, LlmProvider};
pub use types::{
    ApiError, ContentBlock, ContentBlockDeltaEvent, ContentBlockStart, ContentBlockStartEvent,
    ContentBlockStopEvent, ContentDelta, DeltaUsage, ErrorDetails, Message, MessageContent,
    MessageDeltaData, MessageDeltaEvent, MessageRequest, MessageStartData, MessageStartEvent,
    Role, StopReason, StreamEvent, ToolDefinition, ToolInputSchema, Usage,
};
