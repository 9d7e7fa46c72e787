//! Streaming response aggregation.
//!
//! This module turns a lazily delivered sequence of completion fragments into
//! a single string, forwarding the text to an [`OutputSink`] in batches of at
//! least `flush_threshold` characters along the way.

mod accumulator;
mod sink;
pub mod sse;
mod types;

use std::pin::Pin;

pub use accumulator::{Aggregation, FlushBuffer, StreamAggregator, DEFAULT_FLUSH_THRESHOLD};
pub use sink::{null_sink, stdout_sink, OutputSink, WriterSink};
pub use types::{Choice, Delta, Fragment};

/// A pull-based, sendable stream of fragments as produced by a backend.
pub type FragmentStream =
    Pin<Box<dyn futures_util::Stream<Item = crate::Result<Fragment>> + Send + 'static>>;
