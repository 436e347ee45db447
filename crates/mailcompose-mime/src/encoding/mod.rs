//! MIME encoding utilities.
//!
//! Body payloads pass through a pipeline of [`Stage`]s, each of which
//! accepts chunks through [`std::io::Write`] and is finalized exactly once
//! with [`Stage::finish`]. Finishing a stage flushes its own remainder and
//! then finishes the stage it wraps, so the innermost stage is always
//! finalized first:
//!
//! ```text
//! bytes → Base64Encoder → LineSplitter → sink
//! bytes → QuotedPrintableEncoder → sink
//! ```
//!
//! Header values use RFC 2047 encoded-words, see [`encode_rfc2047`].

mod base64_mime;
mod quoted_printable;
mod splitter;
mod word;

pub use base64_mime::Base64Encoder;
pub use quoted_printable::QuotedPrintableEncoder;
pub use splitter::LineSplitter;
pub use word::{
    MAX_ENCODED_WORD_LENGTH, decode_rfc2047, encode_rfc2047, encode_unstructured, fold_text,
    needs_encoding,
};

use crate::config::{LineConfig, TransferEncoding};
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::io::{self, Write};

/// A transform stage in an encoding pipeline.
pub trait Stage: Write {
    /// The writer this stage forwards to.
    type Sink;

    /// Flushes any buffered remainder and returns the underlying writer.
    ///
    /// Consumes the stage, so it cannot be finished twice.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the remainder fails.
    fn finish(self) -> io::Result<Self::Sink>;
}

/// Body encoder selected by [`TransferEncoding`].
#[derive(Debug)]
pub enum PartEncoder<W: Write> {
    /// Base64 with line framing.
    Base64(Base64Encoder<W>),
    /// Quoted-Printable.
    QuotedPrintable(QuotedPrintableEncoder<W>),
}

impl<W: Write> PartEncoder<W> {
    /// Creates the encoder for `encoding` writing into `sink`.
    #[must_use]
    pub fn new(encoding: TransferEncoding, sink: W, line: LineConfig) -> Self {
        match encoding {
            TransferEncoding::Base64 => Self::Base64(Base64Encoder::new(sink, line)),
            TransferEncoding::QuotedPrintable => {
                Self::QuotedPrintable(QuotedPrintableEncoder::new(sink, line))
            }
        }
    }
}

impl<W: Write> Write for PartEncoder<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self {
            Self::Base64(encoder) => encoder.write(data),
            Self::QuotedPrintable(encoder) => encoder.write(data),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Base64(encoder) => encoder.flush(),
            Self::QuotedPrintable(encoder) => encoder.flush(),
        }
    }
}

impl<W: Write> Stage for PartEncoder<W> {
    type Sink = W;

    fn finish(self) -> io::Result<W> {
        match self {
            Self::Base64(encoder) => encoder.finish(),
            Self::QuotedPrintable(encoder) => encoder.finish(),
        }
    }
}

/// Encodes data as Base64 without line framing.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data, skipping line breaks and other whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let compact: Vec<u8> = data
        .bytes()
        .filter(|byte| !byte.is_ascii_whitespace())
        .collect();
    STANDARD.decode(compact).map_err(Into::into)
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(text: &str) -> Result<String> {
    let mut result = Vec::new();
    let mut bytes = text.bytes().peekable();

    while let Some(byte) = bytes.next() {
        if byte == b'=' {
            // Soft line break
            if bytes.peek() == Some(&b'\r') {
                bytes.next();
                if bytes.peek() == Some(&b'\n') {
                    bytes.next();
                }
                continue;
            } else if bytes.peek() == Some(&b'\n') {
                bytes.next();
                continue;
            }

            let hex: Vec<u8> = bytes.by_ref().take(2).collect();
            let byte = std::str::from_utf8(&hex)
                .ok()
                .filter(|h| h.len() == 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| Error::InvalidEncoding("Invalid escape sequence".to_string()))?;
            result.push(byte);
        } else {
            result.push(byte);
        }
    }

    String::from_utf8(result).map_err(Into::into)
}
