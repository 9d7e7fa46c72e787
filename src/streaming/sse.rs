//! Server-Sent Events parsing for streamed chat completions.

use super::types::Fragment;
use super::FragmentStream;
use crate::error::{Result, ThinkError};
use futures_util::{Stream, StreamExt};
use std::fmt::Display;

const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// A parsed SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    /// Create an event with just data
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
            id: None,
        }
    }

    /// Check if this is the `[DONE]` terminator
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }

    /// Parse the event data as a fragment.
    ///
    /// An `error` object in the payload is reported as a transport failure.
    pub fn parse_fragment(&self) -> Result<Fragment> {
        let value: serde_json::Value = serde_json::from_str(&self.data)?;
        if let Some(error) = value.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ThinkError::Transport(message));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Incremental parser for `text/event-stream` bodies.
///
/// Bytes are buffered until a blank-line boundary is seen. Boundaries are
/// ASCII, so a multi-byte character split across network chunks is only
/// decoded once it is complete.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every event completed by them
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<SseEvent>> {
        self.buffer.extend_from_slice(bytes);

        if self.buffer.len() > MAX_BUFFER_SIZE {
            return Err(ThinkError::Sse(format!(
                "event exceeds {} bytes without a boundary",
                MAX_BUFFER_SIZE
            )));
        }

        let mut events = Vec::new();
        while let Some((pos, delimiter_len)) = self.find_event_boundary() {
            let block: Vec<u8> = self.buffer.drain(..pos + delimiter_len).collect();
            if let Some(event) = parse_event(&String::from_utf8_lossy(&block[..pos])) {
                events.push(event);
            }
        }

        Ok(events)
    }

    /// Parse whatever is left once the body has ended
    pub fn finish(&mut self) -> Result<Vec<SseEvent>> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = String::from_utf8_lossy(&rest);
        if rest.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(parse_event(rest.trim_end_matches(['\n', '\r'])).into_iter().collect())
    }

    fn find_event_boundary(&self) -> Option<(usize, usize)> {
        let newline = find(&self.buffer, b"\n\n").map(|pos| (pos, 2));
        let carriage = find(&self.buffer, b"\r\n\r\n").map(|pos| (pos, 4));

        match (newline, carriage) {
            (Some(nl), Some(cr)) => Some(if cr.0 < nl.0 { cr } else { nl }),
            (Some(nl), None) => Some(nl),
            (None, Some(cr)) => Some(cr),
            (None, None) => None,
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_event(block: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data_lines = Vec::new();
    let mut id = None;

    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        if let Some(value) = line.strip_prefix("event:") {
            event = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        } else if let Some(value) = line.strip_prefix("id:") {
            id = Some(value.trim().to_string());
        } else if line == "data" {
            data_lines.push(String::new());
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    Some(SseEvent {
        event,
        data: data_lines.join("\n"),
        id,
    })
}

/// Turn a raw response body into a stream of fragments.
///
/// The stream ends at `[DONE]` or when the body ends. Body errors are
/// yielded as [`ThinkError::Transport`] and end the stream.
pub fn fragments_from_bytes<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(parse_body(body))
}

fn parse_body<S, B, E>(body: S) -> impl Stream<Item = Result<Fragment>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    async_stream::try_stream! {
        let mut parser = SseParser::new();
        let mut done = false;
        futures_util::pin_mut!(body);

        while !done {
            let Some(chunk) = body.next().await else {
                break;
            };
            let chunk = chunk.map_err(ThinkError::transport)?;

            for event in parser.feed(chunk.as_ref())? {
                if event.is_done() {
                    done = true;
                    break;
                }
                yield event.parse_fragment()?;
            }
        }

        if !done {
            for event in parser.finish()? {
                if event.is_done() {
                    break;
                }
                yield event.parse_fragment()?;
            }
        }
    }
}
