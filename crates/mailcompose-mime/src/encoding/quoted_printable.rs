//! Streaming Quoted-Printable encoder (RFC 2045 section 6.7).

use super::Stage;
use crate::config::LineConfig;
use std::io::{self, Write};

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Encodes text as Quoted-Printable.
///
/// Line breaks in the input (CRLF or bare LF) become hard breaks using the
/// configured delimiter. Longer lines get soft breaks (`=` + delimiter) so no
/// output line exceeds the configured length. Whitespace before a break or
/// at the end of input is encoded.
#[derive(Debug)]
pub struct QuotedPrintableEncoder<W: Write> {
    sink: W,
    line: LineConfig,
    line_len: usize,
    pending_ws: Option<u8>,
    pending_cr: bool,
    out: Vec<u8>,
}

impl<W: Write> QuotedPrintableEncoder<W> {
    /// Creates an encoder writing into `sink`.
    #[must_use]
    pub const fn new(sink: W, line: LineConfig) -> Self {
        Self {
            sink,
            line,
            line_len: 0,
            pending_ws: None,
            pending_cr: false,
            out: Vec::new(),
        }
    }

    fn push_token(&mut self, token: &[u8]) {
        // Reserve one column for the soft break marker.
        let limit = self.line.max_line_length.saturating_sub(1);
        if self.line_len > 0 && self.line_len + token.len() > limit {
            self.out.push(b'=');
            self.out.extend_from_slice(&self.line.delimiter);
            self.line_len = 0;
        }
        self.out.extend_from_slice(token);
        self.line_len += token.len();
    }

    fn push_literal(&mut self, byte: u8) {
        self.push_token(&[byte]);
    }

    fn push_encoded(&mut self, byte: u8) {
        self.push_token(&[
            b'=',
            HEX[usize::from(byte >> 4)],
            HEX[usize::from(byte & 0x0f)],
        ]);
    }

    fn hard_break(&mut self) {
        if let Some(ws) = self.pending_ws.take() {
            self.push_encoded(ws);
        }
        self.out.extend_from_slice(&self.line.delimiter);
        self.line_len = 0;
    }

    fn push_byte(&mut self, byte: u8) {
        if self.pending_cr {
            self.pending_cr = false;
            if byte == b'\n' {
                self.hard_break();
                return;
            }
            if let Some(ws) = self.pending_ws.take() {
                self.push_literal(ws);
            }
            self.push_encoded(b'\r');
        }

        match byte {
            b'\r' => self.pending_cr = true,
            b'\n' => self.hard_break(),
            _ => {
                if let Some(ws) = self.pending_ws.take() {
                    self.push_literal(ws);
                }
                match byte {
                    b' ' | b'\t' => self.pending_ws = Some(byte),
                    b'!'..=b'<' | b'>'..=b'~' => self.push_literal(byte),
                    _ => self.push_encoded(byte),
                }
            }
        }
    }

    fn drain(&mut self) -> io::Result<()> {
        if !self.out.is_empty() {
            self.sink.write_all(&self.out)?;
            self.out.clear();
        }
        Ok(())
    }
}

impl<W: Write> Write for QuotedPrintableEncoder<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        for &byte in data {
            self.push_byte(byte);
        }
        self.drain()?;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

impl<W: Write> Stage for QuotedPrintableEncoder<W> {
    type Sink = W;

    fn finish(mut self) -> io::Result<W> {
        if let Some(ws) = self.pending_ws.take() {
            if self.pending_cr {
                self.push_literal(ws);
            } else {
                self.push_encoded(ws);
            }
        }
        if self.pending_cr {
            self.pending_cr = false;
            self.push_encoded(b'\r');
        }
        self.drain()?;
        Ok(self.sink)
    }
}
