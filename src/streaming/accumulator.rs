//! Threshold-flushing stream aggregator.

use super::sink::OutputSink;
use super::types::Fragment;
use crate::error::{Result, ThinkError};
use futures_util::{Stream, StreamExt};
use tracing::{debug, trace};

/// Default number of characters buffered before a flush
pub const DEFAULT_FLUSH_THRESHOLD: usize = 128;

/// Pending text pieces awaiting a flush.
///
/// `char_count` always equals the summed character length of `pieces`.
#[derive(Debug, Default)]
pub struct FlushBuffer {
    pieces: Vec<String>,
    char_count: usize,
}

impl FlushBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a piece of text
    pub fn push(&mut self, text: &str) {
        self.char_count += text.chars().count();
        self.pieces.push(text.to_string());
    }

    /// Buffered length in characters
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Concatenate and clear the buffered pieces
    pub fn take(&mut self) -> String {
        self.char_count = 0;
        std::mem::take(&mut self.pieces).concat()
    }
}

/// Consumes fragment streams, flushing buffered text to a sink in
/// threshold-sized batches and returning the full text.
///
/// The aggregator itself is only configuration; every call to
/// [`StreamAggregator::consume`] or [`StreamAggregator::start`] gets its own
/// buffer and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamAggregator {
    flush_threshold: usize,
    emit: bool,
}

impl Default for StreamAggregator {
    fn default() -> Self {
        Self {
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            emit: true,
        }
    }
}

impl StreamAggregator {
    /// Create an aggregator with a 128 character threshold that emits to its sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aggregator that accumulates without ever writing to the sink
    pub fn silent() -> Self {
        Self::default().with_emit(false)
    }

    /// Set the flush threshold in characters.
    ///
    /// A threshold of zero is treated as one, so every non-empty fragment flushes.
    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold.max(1);
        self
    }

    /// Choose whether flushed text is forwarded to the sink
    pub fn with_emit(mut self, emit: bool) -> Self {
        self.emit = emit;
        self
    }

    pub fn flush_threshold(&self) -> usize {
        self.flush_threshold
    }

    pub fn emits(&self) -> bool {
        self.emit
    }

    /// Begin a fresh aggregation
    pub fn start(&self) -> Aggregation {
        Aggregation {
            flush_threshold: self.flush_threshold,
            emit: self.emit,
            buffer: FlushBuffer::new(),
            output: String::new(),
            flushes: 0,
        }
    }

    /// Drain a fragment stream into `sink` and return the accumulated text.
    ///
    /// Fragments are processed strictly in arrival order. The first stream
    /// error or malformed fragment aborts the consumption; text already
    /// flushed stays flushed.
    pub async fn consume<S, K>(&self, fragments: S, sink: &mut K) -> Result<String>
    where
        S: Stream<Item = Result<Fragment>>,
        K: OutputSink + ?Sized,
    {
        futures_util::pin_mut!(fragments);

        let mut aggregation = self.start();
        while let Some(fragment) = fragments.next().await {
            aggregation.process_fragment(&fragment?, sink)?;
        }

        aggregation.finish(sink)
    }
}

/// State of a single stream consumption.
#[derive(Debug)]
pub struct Aggregation {
    flush_threshold: usize,
    emit: bool,
    buffer: FlushBuffer,
    output: String,
    flushes: usize,
}

impl Aggregation {
    /// Process one fragment, flushing if the buffer reaches the threshold
    pub fn process_fragment<K>(&mut self, fragment: &Fragment, sink: &mut K) -> Result<()>
    where
        K: OutputSink + ?Sized,
    {
        let Some(text) = fragment.text()? else {
            trace!("fragment carried no text");
            return Ok(());
        };

        self.buffer.push(text);
        self.output.push_str(text);

        if self.buffer.char_count() >= self.flush_threshold {
            let pending = self.buffer.take();
            if self.emit {
                write_through(sink, &pending)?;
            }
            self.flushes += 1;
            debug!(
                chars = pending.chars().count(),
                flushes = self.flushes,
                emitted = self.emit,
                "flushed buffer"
            );
        }

        Ok(())
    }

    /// Number of threshold flushes so far, emitted or not
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Characters waiting in the buffer
    pub fn buffered_chars(&self) -> usize {
        self.buffer.char_count()
    }

    /// Write out any remainder and return the accumulated text
    pub fn finish<K>(mut self, sink: &mut K) -> Result<String>
    where
        K: OutputSink + ?Sized,
    {
        if self.emit && !self.buffer.is_empty() {
            let remainder = self.buffer.take();
            write_through(sink, &remainder)?;
            debug!(chars = remainder.chars().count(), "flushed remainder");
        }

        Ok(self.output)
    }
}

fn write_through<K>(sink: &mut K, text: &str) -> Result<()>
where
    K: OutputSink + ?Sized,
{
    sink.write_text(text).map_err(ThinkError::Sink)?;
    sink.flush().map_err(ThinkError::Sink)
}
