//! Multipart envelopes and boundary tokens.

use crate::config::LineConfig;
use crate::content_type::ContentType;
use crate::error::{Error, Result};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::io::{self, Write};

/// Longest boundary RFC 2046 allows.
pub const MAX_BOUNDARY_LENGTH: usize = 70;

const BOUNDARY_ATTEMPTS: usize = 8;

/// Produces boundary tokens.
pub trait BoundarySource {
    /// Returns a fresh candidate boundary.
    fn next_boundary(&mut self) -> String;
}

/// Random boundaries of the form `=_` followed by 32 alphanumerics.
///
/// `=_` never occurs in base64 or quoted-printable output, so the token
/// cannot collide with encoded part content.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBoundary;

impl BoundarySource for RandomBoundary {
    fn next_boundary(&mut self) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        format!("=_{token}")
    }
}

/// An open multipart section.
///
/// Parts are started with [`Envelope::begin_part`]; [`Envelope::close`]
/// consumes the envelope and writes the closing delimiter, so a nested
/// envelope has to be closed before its parent can be.
#[derive(Debug)]
pub struct Envelope {
    sub_type: &'static str,
    boundary: String,
    parts: usize,
}

impl Envelope {
    /// Opens an envelope with a boundary distinct from every enclosing one.
    ///
    /// A candidate is rejected if it is empty, longer than 70 characters,
    /// or is a prefix of (or prefixed by) an enclosing boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BoundaryCollision`] if no acceptable boundary was
    /// produced after several attempts.
    pub fn open(
        sub_type: &'static str,
        source: &mut dyn BoundarySource,
        enclosing: &[&str],
    ) -> Result<Self> {
        for _ in 0..BOUNDARY_ATTEMPTS {
            let candidate = source.next_boundary();
            let usable = !candidate.is_empty()
                && candidate.len() <= MAX_BOUNDARY_LENGTH
                && !candidate.contains(['\r', '\n', '"'])
                && enclosing
                    .iter()
                    .all(|outer| !outer.starts_with(&candidate) && !candidate.starts_with(outer));
            if usable {
                return Ok(Self {
                    sub_type,
                    boundary: candidate,
                    parts: 0,
                });
            }
            tracing::warn!(sub_type, "Rejected colliding multipart boundary");
        }
        Err(Error::BoundaryCollision)
    }

    /// Returns the boundary token.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Returns the `multipart/<subtype>` content type for this envelope.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        ContentType::multipart(self.sub_type, self.boundary.as_str())
    }

    /// Writes the delimiter that starts the next part.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn begin_part<W: Write>(&mut self, sink: &mut W, line: &LineConfig) -> io::Result<()> {
        if self.parts > 0 {
            sink.write_all(&line.delimiter)?;
        }
        sink.write_all(b"--")?;
        sink.write_all(self.boundary.as_bytes())?;
        sink.write_all(&line.delimiter)?;
        self.parts += 1;
        Ok(())
    }

    /// Writes the closing delimiter.
    ///
    /// An envelope with no parts gets a single empty part first, since a
    /// multipart body needs at least one.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn close<W: Write>(mut self, sink: &mut W, line: &LineConfig) -> io::Result<()> {
        if self.parts == 0 {
            self.begin_part(sink, line)?;
        }
        sink.write_all(&line.delimiter)?;
        sink.write_all(b"--")?;
        sink.write_all(self.boundary.as_bytes())?;
        sink.write_all(b"--")?;
        sink.write_all(&line.delimiter)
    }
}
