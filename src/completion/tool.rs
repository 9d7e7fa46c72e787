//! The `chain_of_thought` tool.

use super::ChainOfThought;
use crate::backend::CompletionBackend;
use crate::error::{Result, ThinkError};
use crate::mcp::{CallToolResult, McpTool, ToolHandler};
use crate::prompt::{TOOL_DESCRIPTION, TOOL_NAME};
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

/// Exposes [`ChainOfThought::run`] as a single-argument tool.
///
/// Takes `{"prompt": "<text>"}` and answers with one text item. Backend
/// failures are part of that text, never a tool error.
pub struct ChainOfThoughtTool<B> {
    inner: Arc<ChainOfThought<B>>,
}

impl<B> Clone for ChainOfThoughtTool<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: CompletionBackend> ChainOfThoughtTool<B> {
    pub fn new(chain: ChainOfThought<B>) -> Self {
        Self {
            inner: Arc::new(chain),
        }
    }

    /// Run the tool on a prompt, returning the result text
    pub async fn invoke(&self, prompt: &str) -> String {
        self.inner.run(prompt).await.into_text()
    }

    fn prompt_argument(arguments: &JsonValue) -> Result<&str> {
        arguments
            .get("prompt")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                ThinkError::InvalidArguments("expected a string field named \"prompt\"".to_string())
            })
    }
}

#[async_trait]
impl<B: CompletionBackend + 'static> ToolHandler for ChainOfThoughtTool<B> {
    fn definition(&self) -> McpTool {
        McpTool::new(
            TOOL_NAME,
            json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "What to think about"
                    }
                },
                "required": ["prompt"]
            }),
        )
        .with_description(TOOL_DESCRIPTION)
    }

    async fn call(&self, arguments: JsonValue) -> Result<CallToolResult> {
        let prompt = Self::prompt_argument(&arguments)?;
        Ok(CallToolResult::text(self.invoke(prompt).await))
    }
}
