//! Output sinks that receive flushed text.

use std::io::{self, Write};

/// Destination for flushed text.
///
/// A write carries no implicit newline. The aggregator calls [`OutputSink::flush`]
/// right after every write so observers see partial output immediately.
pub trait OutputSink {
    /// Write a piece of text
    fn write_text(&mut self, text: &str) -> io::Result<()>;

    /// Push any buffered bytes to the underlying destination
    fn flush(&mut self) -> io::Result<()>;
}

/// Adapts any [`io::Write`] into an [`OutputSink`].
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap the sink, returning the writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.inner.write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Sink writing to the process' standard output
pub fn stdout_sink() -> WriterSink<io::Stdout> {
    WriterSink::new(io::stdout())
}

/// Sink that discards everything
pub fn null_sink() -> WriterSink<io::Sink> {
    WriterSink::new(io::sink())
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        (**self).write_text(text)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        (**self).write_text(text)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}
