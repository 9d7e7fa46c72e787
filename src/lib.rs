//! Think: streaming chain-of-thought for reasoning LLM backends
//!
//! This crate asks a reasoning-capable model to deliberate over a prompt,
//! consumes the streamed reasoning fragments, and hands back the whole
//! deliberation as a single string. It is small enough to embed as a library
//! and ships a stdio MCP server exposing it as the `chain_of_thought` tool.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use think::{ChainOfThought, Config, GroqBackend};
//!
//! let config = Config::load(None)?;
//! let backend = GroqBackend::from_config(&config.backend)?;
//! let cot = ChainOfThought::new(backend, config.cot);
//!
//! // Never fails: errors come back as text
//! let result = cot.run("Why is the sky blue?").await;
//! println!("{result}");
//! ```
//!
//! ## Pieces
//!
//! 1. **Stream aggregation** ([`streaming`]): buffers fragment text and flushes
//!    it to an [`OutputSink`] in threshold-sized batches
//! 2. **Orchestration** ([`completion`]): one request/response cycle that
//!    converts every failure into an error string
//! 3. **Backend** ([`backend`]): the streaming completion capability, with an
//!    OpenAI-compatible Groq client
//! 4. **Tool boundary** ([`mcp`]): JSON-RPC over stdio for host processes

use serde::{Deserialize, Serialize};

pub mod backend;
pub mod completion;
pub mod config;
pub mod error;
pub mod mcp;
pub mod prompt;
pub mod streaming;

pub use backend::{CompletionBackend, CompletionRequest, GroqBackend};
pub use completion::{ChainOfThought, ChainOfThoughtTool, CompletionResult};
pub use config::{BackendConfig, Config, CotConfig};
pub use error::{Result, ThinkError};
pub use streaming::{Fragment, FragmentStream, OutputSink, StreamAggregator};

// ============================================================================
// Core Message Types
// ============================================================================

/// A role-tagged chat message sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message role (system or user)
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: text.into(),
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: text.into(),
        }
    }
}

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System-level instructions
    System,
    /// User input
    User,
}

impl MessageRole {
    /// Convert to string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
