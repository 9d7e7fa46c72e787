//! Type definitions for streamed completion fragments.

use crate::error::{Result, ThinkError};
use serde::{Deserialize, Serialize};

/// One element of a streamed chat completion.
///
/// Mirrors the OpenAI-compatible `chat.completion.chunk` shape. Only the
/// first choice is ever consumed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fragment {
    /// Chunk identifier, when the backend sends one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Model that produced the chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Choice entries carried by this chunk
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A single choice within a fragment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Delta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Incremental text carried by a choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Final-answer text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Intermediate "thinking" text. Groq's parsed reasoning format names it `reasoning`.
    #[serde(
        default,
        alias = "reasoning",
        skip_serializing_if = "Option::is_none"
    )]
    pub reasoning_content: Option<String>,
}

impl Delta {
    /// Create a delta carrying answer text
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Default::default()
        }
    }

    /// Create a delta carrying reasoning text
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            reasoning_content: Some(text.into()),
            ..Default::default()
        }
    }

    /// Text contributed by this delta.
    ///
    /// `content` wins when non-empty, otherwise `reasoning_content` is used.
    pub fn text(&self) -> Option<&str> {
        non_empty(self.content.as_deref()).or_else(|| non_empty(self.reasoning_content.as_deref()))
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}

impl Fragment {
    /// Create a fragment with a single choice holding `delta`
    pub fn from_delta(delta: Delta) -> Self {
        Self {
            choices: vec![Choice {
                index: 0,
                delta: Some(delta),
                finish_reason: None,
            }],
            ..Default::default()
        }
    }

    /// Shorthand for a fragment carrying answer text
    pub fn content(text: impl Into<String>) -> Self {
        Self::from_delta(Delta::content(text))
    }

    /// Shorthand for a fragment carrying reasoning text
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::from_delta(Delta::reasoning(text))
    }

    /// Delta of the first choice.
    ///
    /// Fails when the fragment has no choices or the first choice has no delta.
    pub fn first_delta(&self) -> Result<&Delta> {
        let choice = self
            .choices
            .first()
            .ok_or_else(|| ThinkError::MalformedFragment("fragment has no choices".to_string()))?;

        choice.delta.as_ref().ok_or_else(|| {
            ThinkError::MalformedFragment("first choice has no delta".to_string())
        })
    }

    /// Text contributed by this fragment, if any
    pub fn text(&self) -> Result<Option<&str>> {
        Ok(self.first_delta()?.text())
    }

    /// Drop answer text, leaving only reasoning in every delta
    pub fn into_thoughts_only(mut self) -> Self {
        for choice in &mut self.choices {
            if let Some(delta) = choice.delta.as_mut() {
                delta.content = None;
            }
        }
        self
    }
}
