//! Chain-of-thought orchestration.
//!
//! [`ChainOfThought`] runs one request/response cycle against a
//! [`CompletionBackend`]: it asks the configured model for reasoning only,
//! aggregates the stream and wraps the text. It never returns an error to its
//! caller; failures come back as [`CompletionResult::Failed`] text.

mod tool;

pub use tool::ChainOfThoughtTool;

use crate::backend::{CompletionBackend, CompletionRequest};
use crate::config::CotConfig;
use crate::error::Result;
use crate::streaming::{null_sink, OutputSink, StreamAggregator};
use crate::Message;
use tiktoken_rs::cl100k_base;
use tracing::{debug, info, info_span, warn, Instrument};
use ulid::Ulid;

/// Final value of one orchestration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionResult {
    /// Deliberation text, prefixed
    Succeeded(String),
    /// Description of what went wrong
    Failed(String),
}

impl CompletionResult {
    fn success(prefix: &str, text: &str) -> Self {
        Self::Succeeded(format!("{prefix}{text}"))
    }

    fn failure(err: &impl std::fmt::Display) -> Self {
        Self::Failed(format!("Error: {err}"))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// The text handed back to the caller, whichever way the run ended
    pub fn text(&self) -> &str {
        match self {
            Self::Succeeded(text) | Self::Failed(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Succeeded(text) | Self::Failed(text) => text,
        }
    }
}

impl std::fmt::Display for CompletionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// Asks a reasoning model to think about a prompt.
pub struct ChainOfThought<B> {
    backend: B,
    config: CotConfig,
}

impl<B: CompletionBackend> ChainOfThought<B> {
    pub fn new(backend: B, config: CotConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &CotConfig {
        &self.config
    }

    /// Deliberate silently and return the wrapped reasoning or an error text
    pub async fn run(&self, prompt: &str) -> CompletionResult {
        let aggregator = self.aggregator().with_emit(false);
        self.run_with(prompt, aggregator, &mut null_sink()).await
    }

    /// Like [`ChainOfThought::run`], but forwards the reasoning to `sink` as it arrives
    pub async fn run_streaming<K>(&self, prompt: &str, sink: &mut K) -> CompletionResult
    where
        K: OutputSink + Send + ?Sized,
    {
        let aggregator = self.aggregator().with_emit(true);
        self.run_with(prompt, aggregator, sink).await
    }

    fn aggregator(&self) -> StreamAggregator {
        StreamAggregator::new().with_flush_threshold(self.config.flush_threshold)
    }

    async fn run_with<K>(
        &self,
        prompt: &str,
        aggregator: StreamAggregator,
        sink: &mut K,
    ) -> CompletionResult
    where
        K: OutputSink + Send + ?Sized,
    {
        let span = info_span!("chain_of_thought", invocation = %Ulid::new());

        async {
            match self.deliberate(prompt, aggregator, sink).await {
                Ok(text) => {
                    info!(
                        chars = text.chars().count(),
                        tokens = estimate_tokens(&text),
                        "deliberation succeeded"
                    );
                    CompletionResult::success(&self.config.prefix, &text)
                }
                Err(err) => {
                    warn!(error = %err, "deliberation failed");
                    CompletionResult::failure(&err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn deliberate<K>(
        &self,
        prompt: &str,
        aggregator: StreamAggregator,
        sink: &mut K,
    ) -> Result<String>
    where
        K: OutputSink + Send + ?Sized,
    {
        let model = self.config.selected_model()?;
        info!(model, "Thinking about {prompt}");

        let request = CompletionRequest::new(
            model,
            vec![
                Message::system(self.config.system_prompt.as_str()),
                Message::user(prompt),
            ],
        )
        .with_thoughts_only(true);

        debug!(state = "requesting");
        let fragments = self.backend.stream_completion(request).await?;

        debug!(state = "streaming", emit = aggregator.emits());
        aggregator.consume(fragments, sink).await
    }
}

/// Approximate token count of `text` in the cl100k encoding, 0 if unavailable
pub fn estimate_tokens(text: &str) -> usize {
    match cl100k_base() {
        Ok(bpe) => bpe.encode_with_special_tokens(text).len(),
        Err(_) => 0,
    }
}
