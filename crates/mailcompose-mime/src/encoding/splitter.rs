//! Fixed-width line framing.

use super::Stage;
use crate::config::LineConfig;
use std::io::{self, Write};

/// Re-emits written bytes as lines of exactly `max_line_length` bytes.
///
/// Every line after the first is preceded by the delimiter. The final short
/// line is emitted by [`Stage::finish`]. At most one partial line is held in
/// memory regardless of how much data passes through.
#[derive(Debug)]
pub struct LineSplitter<W: Write> {
    sink: W,
    line: LineConfig,
    buf: Vec<u8>,
    started: bool,
}

impl<W: Write> LineSplitter<W> {
    /// Creates a splitter writing into `sink`.
    #[must_use]
    pub fn new(sink: W, line: LineConfig) -> Self {
        Self {
            buf: Vec::with_capacity(line.max_line_length),
            sink,
            line,
            started: false,
        }
    }

    fn emit(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.started {
            self.sink.write_all(&self.line.delimiter)?;
        }
        self.sink.write_all(chunk)?;
        self.started = true;
        Ok(())
    }
}

impl<W: Write> Write for LineSplitter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let width = self.line.max_line_length;
        let mut rest = data;

        if !self.buf.is_empty() {
            let take = (width - self.buf.len()).min(rest.len());
            self.buf.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.buf.len() < width {
                return Ok(data.len());
            }
            let mut line = std::mem::take(&mut self.buf);
            self.emit(&line)?;
            line.clear();
            self.buf = line;
        }

        while rest.len() >= width {
            let (chunk, tail) = rest.split_at(width);
            self.emit(chunk)?;
            rest = tail;
        }

        self.buf.extend_from_slice(rest);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

impl<W: Write> Stage for LineSplitter<W> {
    type Sink = W;

    fn finish(mut self) -> io::Result<W> {
        if !self.buf.is_empty() {
            let rest = std::mem::take(&mut self.buf);
            self.emit(&rest)?;
        }
        Ok(self.sink)
    }
}
