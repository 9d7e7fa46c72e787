//! Error types shared by the aggregator, the backend and the orchestrator.

use thiserror::Error;

/// Errors raised while requesting, streaming or aggregating a completion.
#[derive(Debug, Error)]
pub enum ThinkError {
    /// A fragment did not carry the expected choice/delta structure.
    #[error("Malformed fragment: {0}")]
    MalformedFragment(String),

    /// The backend connection failed before or during streaming.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// The event stream could not be parsed.
    #[error("SSE error: {0}")]
    Sse(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to the output sink failed.
    #[error("Sink error: {0}")]
    Sink(#[source] std::io::Error),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A tool was called with arguments it cannot use.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ThinkError {
    /// Create a transport error from anything printable.
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for ThinkError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, ThinkError>;
