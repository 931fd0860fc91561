//! Stdio MCP server for built-in providers
//!
//! Serves a `ToolRegistry` as line-delimited JSON-RPC 2.0 (one JSON object
//! per line) over any reader/writer pair, normally the process's stdin and
//! stdout. Only the methods a tool provider needs are implemented:
//! `initialize`, `notifications/initialized`, `ping`, `tools/list` and
//! `tools/call`.
//!
//! stdout carries the protocol, so nothing else may write to it while the
//! server runs; logs go to stderr.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::tools::{ToolInvocationResult, ToolRegistry};

/// Protocol revision answered when the client does not ask for one
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// Incoming JSON-RPC message (request or notification)
#[derive(Debug, Deserialize)]
struct IncomingMessage {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct OutgoingResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

impl OutgoingResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Server answering MCP requests from one `ToolRegistry`
pub struct StdioServer {
    registry: ToolRegistry,
    version: String,
}

impl StdioServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serve on the process's stdin/stdout until stdin closes
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve until the reader reaches end of input
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(
            "[StdioServer] Serving provider '{}' ({} tools)",
            self.registry.name(),
            self.registry.len()
        );

        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await.context("Failed to read request line")? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let Some(response) = self.handle_line(trimmed) else {
                continue;
            };

            let mut json = serde_json::to_string(&response).context("Failed to serialize response")?;
            json.push('\n');
            writer
                .write_all(json.as_bytes())
                .await
                .context("Failed to write response")?;
            writer.flush().await.context("Failed to flush response")?;
        }

        tracing::info!("[StdioServer] Input closed, shutting down '{}'", self.registry.name());
        Ok(())
    }

    /// Handle one line; `None` for notifications and stray responses
    fn handle_line(&self, line: &str) -> Option<OutgoingResponse> {
        let message: IncomingMessage = match serde_json::from_str(line) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("[StdioServer] Unparseable message: {}", e);
                return Some(OutgoingResponse::error(Value::Null, PARSE_ERROR, e.to_string()));
            }
        };

        let Some(method) = message.method else {
            // A response to a request we never sent, or garbage; nothing to answer
            return match message.id {
                Some(id) => Some(OutgoingResponse::error(id, INVALID_REQUEST, "Missing method")),
                None => None,
            };
        };

        let Some(id) = message.id else {
            tracing::debug!("[StdioServer] Notification: {}", method);
            return None;
        };

        tracing::debug!("[StdioServer] Request {}: {}", id, method);

        Some(match method.as_str() {
            "initialize" => OutgoingResponse::result(id, self.initialize(message.params.as_ref())),
            "ping" => OutgoingResponse::result(id, json!({})),
            "tools/list" => OutgoingResponse::result(id, self.list_tools()),
            "tools/call" => match message.params.map(serde_json::from_value::<CallToolParams>) {
                Some(Ok(params)) => OutgoingResponse::result(id, self.call_tool(params)),
                Some(Err(e)) => OutgoingResponse::error(id, INVALID_PARAMS, e.to_string()),
                None => OutgoingResponse::error(id, INVALID_PARAMS, "Missing params"),
            },
            other => {
                tracing::warn!("[StdioServer] Unsupported method: {}", other);
                OutgoingResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", other))
            }
        })
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let protocol_version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        json!({
            "protocolVersion": protocol_version,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": self.registry.name(), "version": self.version},
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .registry
            .tools()
            .iter()
            .map(|t| {
                json!({
                    "name": t.name(),
                    "description": t.description(),
                    "inputSchema": t.input_schema(),
                })
            })
            .collect();

        json!({ "tools": tools })
    }

    fn call_tool(&self, params: CallToolParams) -> Value {
        let arguments = params.arguments.unwrap_or(Value::Null);
        let result = self.registry.execute(&params.name, &arguments);
        call_tool_result(&result)
    }
}

/// Encode a tool result as an MCP `tools/call` result
///
/// The full `ToolInvocationResult` travels both as structured content and as
/// its JSON text, so clients that ignore structured content still see it.
pub fn call_tool_result(result: &ToolInvocationResult) -> Value {
    json!({
        "content": [{"type": "text", "text": result.to_feedback()}],
        "structuredContent": result,
        "isError": !result.success,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{BuiltinProvider, OrderIdStrategy};

    fn server() -> StdioServer {
        StdioServer::new(BuiltinProvider::Grocery.registry(OrderIdStrategy::Counter))
    }

    async fn exchange(requests: &[Value]) -> Vec<Value> {
        let mut input = String::new();
        for r in requests {
            input.push_str(&r.to_string());
            input.push('\n');
        }

        let mut output = Vec::new();
        server().serve(input.as_bytes(), &mut output).await.unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_handshake_and_listing() {
        let responses = exchange(&[
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": {"name": "t", "version": "0"}}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list", "params": {}}),
        ])
        .await;

        // The notification gets no answer
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "grocery");

        let tools = responses[1]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 5);
        assert_eq!(tools[0]["name"], "search_products");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn test_call_tool_encodes_result() {
        let responses = exchange(&[json!({
            "jsonrpc": "2.0", "id": 7, "method": "tools/call",
            "params": {"name": "get_product_details", "arguments": {"product_id": "nope"}}
        })])
        .await;

        let result = &responses[0]["result"];
        assert_eq!(result["isError"], true);
        assert_eq!(result["structuredContent"]["success"], false);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("not found"));
    }

    #[tokio::test]
    async fn test_unknown_method_and_garbage() {
        let mut input = String::from("not json\n");
        input.push_str(&json!({"jsonrpc": "2.0", "id": "a", "method": "resources/list"}).to_string());
        input.push('\n');

        let mut output = Vec::new();
        server().serve(input.as_bytes(), &mut output).await.unwrap();
        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(responses[0]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[1]["id"], "a");
        assert_eq!(responses[1]["error"]["code"], METHOD_NOT_FOUND);
    }
}
