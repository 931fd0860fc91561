//! Invocation Orchestrator
//!
//! Drives one conversational turn: sends the conversation to the model
//! backend, forwards text as it streams in, dispatches requested tool calls
//! through the aggregator and feeds their results back until the model
//! finishes.
//!
//! A turn moves through `Sent → (Streaming ⇄ AwaitingToolResult)* →
//! Completed | Failed`. The caller sees it as a lazy stream of
//! `ConversationEvent`s ending in `Done`, or in one `TurnError`.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::Stream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::core::{TurnError, TurnResult};
use crate::llm::{ContentBlock, LlmProvider, Message};
use crate::mcp::CapabilityAggregator;

use super::assembler::ResponseAssembler;
use super::config::AgentConfig;
use super::events::ConversationEvent;

type EventStream = Pin<Box<dyn Stream<Item = TurnResult<ConversationEvent>> + Send>>;

/// Runs turns against a model backend and an aggregated tool set
///
/// # Example
///
/// ```ignore
/// let orchestrator = Orchestrator::new(llm, Arc::new(tools), AgentConfig::default());
///
/// let mut turn = orchestrator.begin_turn("Find me some milk");
/// while let Some(event) = turn.next().await {
///     println!("{:?}", event?);
/// }
/// ```
pub struct Orchestrator {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<CapabilityAggregator>,
    config: AgentConfig,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tools: Arc<CapabilityAggregator>,
        config: AgentConfig,
    ) -> Self {
        Self { llm, tools, config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &Arc<CapabilityAggregator> {
        &self.tools
    }

    /// Start a turn
    ///
    /// Nothing is sent to the backend until the returned stream is polled.
    pub fn begin_turn(&self, user_message: impl Into<String>) -> Turn {
        let cancel = CancellationToken::new();
        let events = run_turn(
            self.llm.clone(),
            self.tools.clone(),
            self.config.clone(),
            user_message.into(),
            cancel.clone(),
        );

        Turn {
            events: Some(Box::pin(events)),
            cancel,
        }
    }
}

/// The event stream of one turn
///
/// Finite and not restartable: after `Done`, a failure or cancellation it
/// yields nothing more.
pub struct Turn {
    events: Option<EventStream>,
    cancel: CancellationToken,
}

impl Turn {
    /// Stop the turn
    ///
    /// The backend stream and any in-flight tool call are dropped; provider
    /// connections stay open.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this turn, for use from another task
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for Turn {
    type Item = TurnResult<ConversationEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            self.events = None;
            return Poll::Ready(None);
        }

        let Some(events) = self.events.as_mut() else {
            return Poll::Ready(None);
        };

        match events.as_mut().poll_next(cx) {
            Poll::Ready(Some(Err(e))) => {
                self.events = None;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(Some(Ok(event))) => {
                if event.is_done() {
                    self.events = None;
                }
                Poll::Ready(Some(Ok(event)))
            }
            Poll::Ready(None) => {
                self.events = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

fn run_turn(
    llm: Arc<dyn LlmProvider>,
    tools: Arc<CapabilityAggregator>,
    config: AgentConfig,
    user_message: String,
    cancel: CancellationToken,
) -> impl Stream<Item = TurnResult<ConversationEvent>> + Send {
    async_stream::stream! {
        tracing::info!("[Orchestrator] Turn started");

        let system = config.system();
        let definitions = tools.definitions();
        let mut messages = vec![Message::user(user_message)];
        let mut iterations = 0;

        'turn: loop {
            iterations += 1;
            if iterations > config.max_tool_iterations {
                tracing::warn!(
                    "[Orchestrator] Max tool iterations ({}) reached",
                    config.max_tool_iterations
                );
                yield Ok(ConversationEvent::Done);
                break 'turn;
            }

            tracing::info!(
                "[Orchestrator] Calling {} with {} messages (iteration {})",
                llm.provider_name(),
                messages.len(),
                iterations
            );

            // Sent
            let request = llm.stream_with_tools_and_system(
                messages.clone(),
                system.clone(),
                definitions.clone(),
            );
            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                opened = request => Some(opened),
            };
            let mut backend = match opened {
                None => break 'turn,
                Some(Ok(stream)) => stream,
                Some(Err(e)) => {
                    tracing::error!("[Orchestrator] Backend request failed: {:#}", e);
                    yield Err(TurnError::backend(format!("{:#}", e)));
                    break 'turn;
                }
            };

            // Streaming
            let mut assembler = ResponseAssembler::new();
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    next = backend.next() => Some(next),
                };
                let event = match next {
                    None => break 'turn,
                    Some(None) => break,
                    Some(Some(Ok(event))) => event,
                    Some(Some(Err(e))) => {
                        tracing::error!("[Orchestrator] Backend stream failed: {:#}", e);
                        yield Err(TurnError::backend(format!("{:#}", e)));
                        break 'turn;
                    }
                };

                match assembler.apply(event) {
                    Ok(Some(text)) => {
                        yield Ok(ConversationEvent::TextDelta { content: text });
                    }
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        break 'turn;
                    }
                }
            }
            drop(backend);

            let response = assembler.finish();
            let calls = response.tool_calls();
            tracing::info!(
                "[Orchestrator] Response complete: stop_reason={:?}, {} tool call(s)",
                response.stop_reason,
                calls.len()
            );

            if calls.is_empty() {
                // Completed
                yield Ok(ConversationEvent::Done);
                break 'turn;
            }

            // AwaitingToolResult
            messages.push(Message::assistant_with_blocks(response.blocks));
            let mut results = Vec::with_capacity(calls.len());

            for (call_id, tool_name, arguments) in calls {
                tracing::info!("[Orchestrator] Tool use: {} ({})", tool_name, call_id);

                if config.emit_tool_events {
                    yield Ok(ConversationEvent::ToolCallRequest {
                        tool_name: tool_name.clone(),
                        arguments: arguments.clone(),
                        call_id: call_id.clone(),
                    });
                }

                let dispatch = tools.dispatch(&tool_name, arguments);
                let dispatched = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = dispatch => Some(result),
                };
                let Some(result) = dispatched else {
                    break 'turn;
                };

                results.push(ContentBlock::tool_result(
                    call_id.clone(),
                    result.to_feedback(),
                    !result.success,
                ));

                if config.emit_tool_events {
                    yield Ok(ConversationEvent::ToolCallResult {
                        call_id,
                        payload: result,
                    });
                }
            }

            messages.push(Message::user_with_blocks(results));
        }

        if cancel.is_cancelled() {
            tracing::info!("[Orchestrator] Turn cancelled");
        } else {
            tracing::info!("[Orchestrator] Turn finished");
        }
    }
}
