//! MCP server loop and tool registry.

use super::{
    CallToolParams, CallToolResult, Implementation, InitializeResult, JsonRpcError,
    JsonRpcMessage, JsonRpcResponse, ListToolsResult, McpTool, RequestId, ServerCapabilities,
    ToolsCapability,
};
use crate::error::Result;
use async_trait::async_trait;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Protocol revision this server speaks
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Trait for MCP tool handlers.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> McpTool;

    /// Handle a tool call.
    async fn call(&self, arguments: JsonValue) -> Result<CallToolResult>;
}

/// MCP server exposing a fixed set of tools.
pub struct McpServer {
    info: Implementation,
    tools: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: Implementation::new(name, version),
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool handler under its definition's name
    pub fn tool(mut self, handler: impl ToolHandler + 'static) -> Self {
        let name = handler.definition().name;
        self.tools.insert(name, Arc::new(handler));
        self
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Serve on the process' stdin and stdout
    pub async fn run_stdio(&self) -> Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve newline-delimited JSON-RPC until `reader` reaches EOF.
    ///
    /// Requests are handled concurrently, so responses may be written in a
    /// different order than the requests arrived. Every pending request is
    /// answered before returning.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = %self.info.name, tools = self.tool_count(), "MCP server ready");
        let mut lines = reader.split(b'\n');
        let mut in_flight = FuturesUnordered::new();
        let mut reading = true;

        loop {
            tokio::select! {
                line = lines.next_segment(), if reading => match line? {
                    Some(line) if line.iter().all(u8::is_ascii_whitespace) => {}
                    Some(line) => in_flight.push(self.handle_line(line)),
                    None => {
                        info!("MCP client disconnected");
                        reading = false;
                    }
                },
                Some(response) = in_flight.next(), if !in_flight.is_empty() => {
                    if let Some(response) = response {
                        let json = serde_json::to_string(&response)?;
                        writer.write_all(json.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;
                    }
                }
                else => break,
            }
        }

        Ok(())
    }

    async fn handle_line(&self, line: Vec<u8>) -> Option<JsonRpcResponse> {
        match std::str::from_utf8(&line) {
            Ok(text) => self.handle_message(text.trim()).await,
            Err(e) => {
                warn!(error = %e, "undecodable message");
                Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        }
    }

    /// Handle one raw message, returning the response if one is owed
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let value: JsonValue = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        let id = value
            .get("id")
            .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
        let message: JsonRpcMessage = match serde_json::from_value(value) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "not a JSON-RPC message");
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ));
            }
        };

        let request = match message {
            JsonRpcMessage::Notification(notification) => {
                debug!(method = %notification.method, "ignoring notification");
                return None;
            }
            JsonRpcMessage::Request(request) => request,
        };

        debug!(method = %request.method, "handling request");
        let id = request.id;

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                id,
                InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    capabilities: ServerCapabilities {
                        tools: Some(ToolsCapability {
                            list_changed: false,
                        }),
                    },
                    server_info: self.info.clone(),
                },
            ),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => {
                let tools = self.tools.values().map(|h| h.definition()).collect();
                JsonRpcResponse::success(id, ListToolsResult { tools })
            }
            "tools/call" => {
                let params: CallToolParams = match request.params.map(serde_json::from_value) {
                    Some(Ok(params)) => params,
                    Some(Err(e)) => {
                        return Some(JsonRpcResponse::error(
                            Some(id),
                            JsonRpcError::INVALID_PARAMS,
                            format!("Invalid params: {}", e),
                        ));
                    }
                    None => {
                        return Some(JsonRpcResponse::error(
                            Some(id),
                            JsonRpcError::INVALID_PARAMS,
                            "Missing params",
                        ));
                    }
                };

                let Some(handler) = self.tools.get(&params.name) else {
                    return Some(JsonRpcResponse::error(
                        Some(id),
                        JsonRpcError::INVALID_PARAMS,
                        format!("Tool not found: {}", params.name),
                    ));
                };

                let result = match handler.call(params.arguments).await {
                    Ok(output) => output,
                    Err(e) => CallToolResult::error(e.to_string()),
                };
                JsonRpcResponse::success(id, result)
            }
            other => JsonRpcResponse::error(
                Some(id),
                JsonRpcError::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        };

        Some(response)
    }
}
