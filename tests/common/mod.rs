//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use futures::StreamExt;
use relay_agent::llm::{
    ContentBlockDeltaEvent, ContentBlockStart, ContentBlockStartEvent, ContentBlockStopEvent,
    ContentDelta, EventStream, LlmProvider, Message, StreamEvent, ToolDefinition,
};
use relay_agent::mcp::{OperationSpec, ProviderChannel, ProviderConfig, ProviderLauncher};
use relay_agent::tools::ToolInvocationResult;
use serde_json::{json, Map, Value};

/// Operation that never completes
pub const HANGING_OPERATION: &str = "hang";

/// Channel reporting fixed operation names and counting its releases
pub struct FakeChannel {
    name: String,
    operations: Vec<String>,
    releases: AtomicUsize,
    fail_release: bool,
    list_delay: Option<Duration>,
    release_log: Arc<Mutex<Vec<String>>>,
    listed_log: Arc<Mutex<Vec<String>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeChannel {
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderChannel for FakeChannel {
    async fn list_operations(&self) -> Result<Vec<OperationSpec>> {
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        self.listed_log.lock().unwrap().push(self.name.clone());
        Ok(self
            .operations
            .iter()
            .map(|name| OperationSpec {
                name: name.clone(),
                description: format!("{} from {}", name, self.name),
                input_schema: json!({"type": "object", "properties": {}}),
            })
            .collect())
    }

    async fn invoke(&self, operation: &str, arguments: Map<String, Value>) -> Result<ToolInvocationResult> {
        self.calls.lock().unwrap().push(operation.to_string());
        if operation == HANGING_OPERATION {
            futures::future::pending::<()>().await;
        }
        Ok(ToolInvocationResult::success(
            json!({"provider": self.name, "operation": operation, "arguments": arguments}),
            format!("{} handled {}", self.name, operation),
        ))
    }

    async fn close(&self) -> Result<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.release_log.lock().unwrap().push(self.name.clone());
        if self.fail_release {
            bail!("pipe already closed");
        }
        Ok(())
    }
}

/// Launcher that hands out `FakeChannel`s and remembers them
#[derive(Default)]
pub struct FakeLauncher {
    operations: HashMap<String, Vec<String>>,
    fail_launch: Option<String>,
    fail_release: Option<String>,
    list_delays: HashMap<String, Duration>,
    launched: Mutex<Vec<Arc<FakeChannel>>>,
    release_log: Arc<Mutex<Vec<String>>>,
    listed_log: Arc<Mutex<Vec<String>>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operations(mut self, provider: &str, operations: &[&str]) -> Self {
        self.operations.insert(
            provider.to_string(),
            operations.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn failing_launch(mut self, provider: &str) -> Self {
        self.fail_launch = Some(provider.to_string());
        self
    }

    pub fn failing_release(mut self, provider: &str) -> Self {
        self.fail_release = Some(provider.to_string());
        self
    }

    /// Delay every listing of `provider`'s operations
    pub fn with_list_delay(mut self, provider: &str, delay: Duration) -> Self {
        self.list_delays.insert(provider.to_string(), delay);
        self
    }

    pub fn launched(&self) -> Vec<Arc<FakeChannel>> {
        self.launched.lock().unwrap().clone()
    }

    pub fn launched_names(&self) -> Vec<String> {
        self.launched().iter().map(|c| c.name.clone()).collect()
    }

    pub fn release_log(&self) -> Vec<String> {
        self.release_log.lock().unwrap().clone()
    }

    /// Providers in the order their listings completed
    pub fn listed_log(&self) -> Vec<String> {
        self.listed_log.lock().unwrap().clone()
    }

    pub fn total_releases(&self) -> usize {
        self.launched().iter().map(|c| c.releases()).sum()
    }
}

#[async_trait]
impl ProviderLauncher for FakeLauncher {
    async fn launch(&self, config: &ProviderConfig) -> Result<Arc<dyn ProviderChannel>> {
        if self.fail_launch.as_deref() == Some(config.name.as_str()) {
            return Err(anyhow!("command not found: {}", config.command));
        }

        let channel = Arc::new(FakeChannel {
            name: config.name.clone(),
            operations: self.operations.get(&config.name).cloned().unwrap_or_default(),
            releases: AtomicUsize::new(0),
            fail_release: self.fail_release.as_deref() == Some(config.name.as_str()),
            list_delay: self.list_delays.get(&config.name).copied(),
            release_log: self.release_log.clone(),
            listed_log: self.listed_log.clone(),
            calls: Mutex::new(Vec::new()),
        });
        self.launched.lock().unwrap().push(channel.clone());
        Ok(channel)
    }
}

pub fn configs(names: &[&str]) -> Vec<ProviderConfig> {
    names
        .iter()
        .map(|name| ProviderConfig::new(*name, format!("{}-provider", name)))
        .collect()
}

/// One scripted backend response
pub enum Reply {
    /// Stream these events, then end
    Events(Vec<StreamEvent>),
    /// Stream these events, then stay open without sending more
    EventsThenStall(Vec<StreamEvent>),
    /// Stream these events, then fail with this message
    EventsThenError(Vec<StreamEvent>, &'static str),
}

/// Backend answering each request with the next scripted reply
pub struct ScriptedBackend {
    replies: Mutex<Vec<Reply>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedBackend {
    pub fn new(mut replies: Vec<Reply>) -> Self {
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedBackend {
    async fn stream_with_tools_and_system(
        &self,
        messages: Vec<Message>,
        _system: Option<String>,
        _tools: Vec<ToolDefinition>,
    ) -> Result<EventStream> {
        self.requests.lock().unwrap().push(messages);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| anyhow!("HTTP 529: overloaded"))?;

        Ok(match reply {
            Reply::Events(events) => Box::pin(futures::stream::iter(events.into_iter().map(Ok))),
            Reply::EventsThenStall(events) => Box::pin(
                futures::stream::iter(events.into_iter().map(Ok)).chain(futures::stream::pending()),
            ),
            Reply::EventsThenError(events, message) => Box::pin(
                futures::stream::iter(events.into_iter().map(Ok))
                    .chain(futures::stream::once(async move { Err(anyhow!(message)) })),
            ),
        })
    }

    fn model(&self) -> String {
        "scripted".to_string()
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

pub fn text_block(index: usize, text: &str) -> Vec<StreamEvent> {
    vec![
        StreamEvent::ContentBlockStart(ContentBlockStartEvent {
            index,
            content_block: ContentBlockStart::Text { text: String::new() },
        }),
        StreamEvent::ContentBlockDelta(ContentBlockDeltaEvent {
            index,
            delta: ContentDelta::TextDelta { text: text.to_string() },
        }),
        StreamEvent::ContentBlockStop(ContentBlockStopEvent { index }),
    ]
}

pub fn tool_block(index: usize, id: &str, name: &str, input: Value) -> Vec<StreamEvent> {
    vec![
        StreamEvent::ContentBlockStart(ContentBlockStartEvent {
            index,
            content_block: ContentBlockStart::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input: json!({}),
            },
        }),
        StreamEvent::ContentBlockDelta(ContentBlockDeltaEvent {
            index,
            delta: ContentDelta::InputJsonDelta { partial_json: input.to_string() },
        }),
        StreamEvent::ContentBlockStop(ContentBlockStopEvent { index }),
    ]
}
