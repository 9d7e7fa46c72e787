//! Streaming completion backends.
//!
//! A backend turns a [`CompletionRequest`] into a [`FragmentStream`]. The
//! stream is pulled lazily; failures may surface either from the initial call
//! or as an `Err` item mid-stream.

mod groq;

pub use groq::GroqBackend;

use crate::error::Result;
use crate::streaming::FragmentStream;
use crate::Message;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// A streaming chat completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    /// Backend model identifier
    pub model: String,
    /// Conversation sent to the model
    pub messages: Vec<Message>,
    /// Only stream the model's reasoning, never its final answer
    pub thoughts_only: bool,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            thoughts_only: false,
        }
    }

    pub fn with_thoughts_only(mut self, thoughts_only: bool) -> Self {
        self.thoughts_only = thoughts_only;
        self
    }
}

/// Capability to request a streaming completion.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Issue the request and return the fragment stream
    async fn stream_completion(&self, request: CompletionRequest) -> Result<FragmentStream>;
}

#[async_trait]
impl<B: CompletionBackend + ?Sized> CompletionBackend for Arc<B> {
    async fn stream_completion(&self, request: CompletionRequest) -> Result<FragmentStream> {
        (**self).stream_completion(request).await
    }
}

#[async_trait]
impl<B: CompletionBackend + ?Sized> CompletionBackend for Box<B> {
    async fn stream_completion(&self, request: CompletionRequest) -> Result<FragmentStream> {
        (**self).stream_completion(request).await
    }
}
