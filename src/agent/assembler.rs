//! Response assembly
//!
//! Rebuilds the content blocks of one backend response from its stream of
//! events, surfacing text deltas as they arrive.

use serde_json::{Map, Value};

use crate::core::TurnError;
use crate::llm::{ContentBlock, ContentBlockStart, ContentDelta, StopReason, StreamEvent};

/// Block currently being streamed
#[derive(Debug)]
enum PartialBlock {
    Text {
        index: usize,
        text: String,
    },
    ToolUse {
        index: usize,
        id: String,
        name: String,
        initial_input: Value,
        json: String,
    },
    Ignored {
        index: usize,
    },
}

impl PartialBlock {
    fn index(&self) -> usize {
        match self {
            PartialBlock::Text { index, .. }
            | PartialBlock::ToolUse { index, .. }
            | PartialBlock::Ignored { index } => *index,
        }
    }

    fn finish(self) -> Option<ContentBlock> {
        match self {
            PartialBlock::Text { text, .. } if !text.is_empty() => Some(ContentBlock::Text { text }),
            PartialBlock::Text { .. } | PartialBlock::Ignored { .. } => None,
            PartialBlock::ToolUse {
                id,
                name,
                initial_input,
                json,
                ..
            } => {
                let input = if json.trim().is_empty() {
                    initial_input
                } else {
                    match serde_json::from_str::<Value>(&json) {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::warn!(
                                "[ResponseAssembler] Invalid input JSON for tool '{}': {}",
                                name,
                                e
                            );
                            Value::Object(Map::new())
                        }
                    }
                };
                Some(ContentBlock::ToolUse { id, name, input })
            }
        }
    }
}

/// A fully received backend response
#[derive(Debug, Clone, Default)]
pub struct AssembledResponse {
    pub blocks: Vec<ContentBlock>,
    pub stop_reason: Option<StopReason>,
}

impl AssembledResponse {
    /// Tool calls in the order the model made them: (id, name, input)
    pub fn tool_calls(&self) -> Vec<(String, String, Value)> {
        self.blocks
            .iter()
            .filter_map(|b| b.as_tool_use())
            .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
            .collect()
    }
}

/// Accumulates stream events into content blocks
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    blocks: Vec<ContentBlock>,
    current: Option<PartialBlock>,
    stop_reason: Option<StopReason>,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event
    ///
    /// Returns the text to forward to the caller, if any. An error event from
    /// the backend ends the response with `BackendStreamFailed`.
    pub fn apply(&mut self, event: StreamEvent) -> Result<Option<String>, TurnError> {
        match event {
            StreamEvent::MessageStart(start) => {
                tracing::debug!("[ResponseAssembler] Stream started ({})", start.message.id);
            }

            StreamEvent::ContentBlockStart(block_start) => {
                self.close_current();
                let index = block_start.index;
                let (partial, initial_text) = match block_start.content_block {
                    ContentBlockStart::Text { text } => {
                        let initial = (!text.is_empty()).then(|| text.clone());
                        (PartialBlock::Text { index, text }, initial)
                    }
                    ContentBlockStart::ToolUse { id, name, input } => (
                        PartialBlock::ToolUse {
                            index,
                            id,
                            name,
                            initial_input: input,
                            json: String::new(),
                        },
                        None,
                    ),
                    ContentBlockStart::Other => (PartialBlock::Ignored { index }, None),
                };
                self.current = Some(partial);
                return Ok(initial_text);
            }

            StreamEvent::ContentBlockDelta(delta) => {
                let at = delta.index;
                match (&mut self.current, delta.delta) {
                    (Some(PartialBlock::Text { index, text }), ContentDelta::TextDelta { text: piece })
                        if *index == at =>
                    {
                        text.push_str(&piece);
                        return Ok(Some(piece));
                    }
                    (
                        Some(PartialBlock::ToolUse { index, json, .. }),
                        ContentDelta::InputJsonDelta { partial_json },
                    ) if *index == at => {
                        json.push_str(&partial_json);
                    }
                    (_, other) => {
                        tracing::trace!("[ResponseAssembler] Ignoring delta {:?}", other);
                    }
                }
            }

            StreamEvent::ContentBlockStop(block_stop) => {
                if self.current.as_ref().map(PartialBlock::index) == Some(block_stop.index) {
                    self.close_current();
                }
            }

            StreamEvent::MessageDelta(msg_delta) => {
                self.stop_reason = msg_delta.delta.stop_reason;
            }

            StreamEvent::MessageStop => {
                tracing::debug!("[ResponseAssembler] Stream complete");
            }

            StreamEvent::Ping => {
                tracing::trace!("[ResponseAssembler] Ping");
            }

            StreamEvent::Error(err) => {
                tracing::error!(
                    "[ResponseAssembler] Stream error: {}: {}",
                    err.error.kind,
                    err.error.message
                );
                return Err(TurnError::backend(format!(
                    "{}: {}",
                    err.error.kind, err.error.message
                )));
            }
        }

        Ok(None)
    }

    fn close_current(&mut self) {
        if let Some(block) = self.current.take().and_then(PartialBlock::finish) {
            self.blocks.push(block);
        }
    }

    /// Finish the response, closing any block left open
    pub fn finish(mut self) -> AssembledResponse {
        self.close_current();
        AssembledResponse {
            blocks: self.blocks,
            stop_reason: self.stop_reason,
        }
    }
}
