//! Groq (OpenAI-compatible) streaming backend.

use super::{CompletionBackend, CompletionRequest};
use crate::config::BackendConfig;
use crate::error::{Result, ThinkError};
use crate::streaming::sse::fragments_from_bytes;
use crate::streaming::{Fragment, FragmentStream};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Streams chat completions from Groq's OpenAI-compatible endpoint.
///
/// With `thoughts_only` the request asks for parsed reasoning and every
/// delta's answer text is dropped, so only reasoning reaches the caller.
#[derive(Debug, Clone)]
pub struct GroqBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl GroqBackend {
    /// Create a backend for `base_url` (e.g. `https://api.groq.com/openai/v1`)
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a backend from configuration, reading the key from the environment
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            ThinkError::Config(format!("environment variable {} is not set", config.api_key_env))
        })?;
        Self::with_api_key(config, api_key)
    }

    /// Build a backend from configuration with an explicit key
    pub fn with_api_key(config: &BackendConfig, api_key: impl Into<String>) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            api_key: api_key.into(),
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body(request: &CompletionRequest) -> serde_json::Value {
        let mut body = json!({
            "model": request.model,
            "messages": request.messages,
            "stream": true,
        });
        if request.thoughts_only {
            body["reasoning_format"] = json!("parsed");
        }
        body
    }
}

#[async_trait]
impl CompletionBackend for GroqBackend {
    async fn stream_completion(&self, request: CompletionRequest) -> Result<FragmentStream> {
        debug!(model = %request.model, thoughts_only = request.thoughts_only, "requesting completion");

        let response = self
            .http_client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&Self::request_body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "completion request rejected");
            return Err(ThinkError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let fragments = fragments_from_bytes(response.bytes_stream());
        if request.thoughts_only {
            Ok(Box::pin(
                fragments.map(|fragment| fragment.map(Fragment::into_thoughts_only)),
            ))
        } else {
            Ok(fragments)
        }
    }
}
