//! Tests for the MCP server

use super::*;
use crate::backend::{CompletionBackend, CompletionRequest};
use crate::completion::{ChainOfThought, ChainOfThoughtTool};
use crate::config::CotConfig;
use crate::error::ThinkError;
use crate::streaming::{Fragment, FragmentStream};
use async_trait::async_trait;
use futures_util::stream;
use serde_json::json;
use std::time::Duration;

struct EchoTool;

#[async_trait]
impl ToolHandler for EchoTool {
    fn definition(&self) -> McpTool {
        McpTool::new("echo", json!({"type": "object"})).with_description("Echo the input")
    }

    async fn call(&self, arguments: JsonValue) -> crate::Result<CallToolResult> {
        match arguments.get("text").and_then(JsonValue::as_str) {
            Some(text) => Ok(CallToolResult::text(text)),
            None => Err(ThinkError::InvalidArguments("missing text".to_string())),
        }
    }
}

/// Answers after a pause, to keep a call in flight
struct SlowTool;

#[async_trait]
impl ToolHandler for SlowTool {
    fn definition(&self) -> McpTool {
        McpTool::new("slow", json!({"type": "object"}))
    }

    async fn call(&self, _arguments: JsonValue) -> crate::Result<CallToolResult> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(CallToolResult::text("done"))
    }
}

/// Backend streaming "4" then "2" as reasoning
struct FortyTwo;

#[async_trait]
impl CompletionBackend for FortyTwo {
    async fn stream_completion(&self, _request: CompletionRequest) -> crate::Result<FragmentStream> {
        Ok(Box::pin(stream::iter(vec![
            Ok(Fragment::reasoning("4")),
            Ok(Fragment::reasoning("2")),
        ])))
    }
}

fn server() -> McpServer {
    McpServer::new("think", "0.1.0").tool(EchoTool)
}

async fn serve_input(server: &McpServer, input: &[u8]) -> Vec<JsonRpcResponse> {
    let mut output = Vec::new();
    server.serve(input, &mut output).await.unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_server_creation() {
    assert_eq!(server().tool_count(), 1);
}

#[tokio::test]
async fn test_handle_initialize() {
    let response = server()
        .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
        .await
        .unwrap();

    assert!(!response.is_error());
    let result = response.result.unwrap();
    assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(result["serverInfo"]["name"], "think");
    assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
}

#[tokio::test]
async fn test_handle_tools_list() {
    let response = server()
        .handle_message(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#)
        .await
        .unwrap();

    assert_eq!(response.id, Some(RequestId::from("a")));
    let tools = &response.result.unwrap()["tools"];
    assert_eq!(tools[0]["name"], "echo");
    assert_eq!(tools[0]["inputSchema"]["type"], "object");
}

#[tokio::test]
async fn test_handle_tools_call() {
    let response = server()
        .handle_message(
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"text":"hi"}}}"#,
        )
        .await
        .unwrap();

    let result = response.result.unwrap();
    assert_eq!(result["content"][0]["type"], "text");
    assert_eq!(result["content"][0]["text"], "hi");
    assert_eq!(result["isError"], false);
}

#[tokio::test]
async fn test_handler_error_becomes_error_result() {
    let response = server()
        .handle_message(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"echo","arguments":{}}}"#,
        )
        .await
        .unwrap();

    let result: CallToolResult = serde_json::from_value(response.result.unwrap()).unwrap();
    assert!(result.is_error);
    assert_eq!(result.first_text(), Some("Invalid arguments: missing text"));
}

#[tokio::test]
async fn test_unknown_tool() {
    let response = server()
        .handle_message(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"nope"}}"#)
        .await
        .unwrap();

    let error = response.error.unwrap();
    assert_eq!(error.code, JsonRpcError::INVALID_PARAMS);
    assert_eq!(error.message, "Tool not found: nope");
}

#[tokio::test]
async fn test_missing_params() {
    let response = server()
        .handle_message(r#"{"jsonrpc":"2.0","id":5,"method":"tools/call"}"#)
        .await
        .unwrap();

    assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
}

#[tokio::test]
async fn test_unknown_method() {
    let response = server()
        .handle_message(r#"{"jsonrpc":"2.0","id":6,"method":"resources/list"}"#)
        .await
        .unwrap();

    assert_eq!(response.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn test_notifications_get_no_response() {
    let response = server()
        .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;

    assert!(response.is_none());
}

#[tokio::test]
async fn test_parse_error_has_null_id() {
    let response = server().handle_message("{not json").await.unwrap();

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["id"], JsonValue::Null);
    assert_eq!(json["error"]["code"], JsonRpcError::PARSE_ERROR);
}

#[tokio::test]
async fn test_valid_json_that_is_not_a_request() {
    let response = server()
        .handle_message(r#"{"jsonrpc":"2.0","id":1}"#)
        .await
        .unwrap();

    assert_eq!(response.id, Some(RequestId::Number(1)));
    assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
}

#[tokio::test]
async fn test_undecodable_line_does_not_stop_the_server() {
    let input = b"\xff\xfe garbage\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n";

    let responses = serve_input(&server(), input).await;

    assert_eq!(responses.len(), 2);
    let parse_error = responses.iter().find(|r| r.id.is_none()).unwrap();
    assert_eq!(parse_error.error.as_ref().unwrap().code, JsonRpcError::PARSE_ERROR);
    let pong = responses
        .iter()
        .find(|r| r.id == Some(RequestId::Number(1)))
        .unwrap();
    assert!(!pong.is_error());
}

#[tokio::test]
async fn test_ping_answered_while_a_call_is_running() {
    let server = McpServer::new("think", "0.1.0").tool(SlowTool);
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"slow"}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
        "\n",
    );

    let responses = serve_input(&server, input.as_bytes()).await;

    let ids: Vec<_> = responses.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec![Some(RequestId::Number(2)), Some(RequestId::Number(1))]);
}

#[tokio::test]
async fn test_serve_answers_each_request_line() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"chain_of_thought","arguments":{"prompt":"what is 6*7"}}}"#,
        "\n",
    );
    let tool = ChainOfThoughtTool::new(ChainOfThought::new(FortyTwo, CotConfig::default()));
    let server = McpServer::new("think", "0.1.0").tool(tool);

    let responses = serve_input(&server, input.as_bytes()).await;

    assert_eq!(responses.len(), 2);
    let initialized = responses
        .iter()
        .find(|r| r.id == Some(RequestId::Number(1)))
        .unwrap();
    assert_eq!(initialized.result.as_ref().unwrap()["serverInfo"]["name"], "think");

    let answered = responses
        .iter()
        .find(|r| r.id == Some(RequestId::Number(2)))
        .unwrap();
    let result: CallToolResult = serde_json::from_value(answered.result.clone().unwrap()).unwrap();
    assert_eq!(
        result.first_text(),
        Some("Hmmm, let me think for a second... 42")
    );
}
