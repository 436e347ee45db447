//! Streaming base64 body encoder.

use super::{LineSplitter, Stage};
use crate::config::LineConfig;
use base64::engine::GeneralPurpose;
use base64::engine::general_purpose::STANDARD;
use base64::write::EncoderWriter;
use std::io::{self, Write};

/// Encodes written bytes to padded standard base64 and frames the output
/// into lines.
///
/// Pipeline: input → base64 → [`LineSplitter`] → sink.
pub struct Base64Encoder<W: Write> {
    inner: EncoderWriter<'static, GeneralPurpose, LineSplitter<W>>,
}

impl<W: Write> Base64Encoder<W> {
    /// Creates an encoder writing framed base64 into `sink`.
    #[must_use]
    pub fn new(sink: W, line: LineConfig) -> Self {
        Self {
            inner: EncoderWriter::new(LineSplitter::new(sink, line), &STANDARD),
        }
    }
}

impl<W: Write> Write for Base64Encoder<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.inner.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Stage for Base64Encoder<W> {
    type Sink = W;

    /// Writes the final quantum with padding, then the last line.
    fn finish(mut self) -> io::Result<W> {
        let splitter = self.inner.finish()?;
        splitter.finish()
    }
}

impl<W: Write> std::fmt::Debug for Base64Encoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Base64Encoder").finish_non_exhaustive()
    }
}
