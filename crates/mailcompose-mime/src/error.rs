//! Error types for MIME composition.

use std::io;
use std::string::FromUtf8Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No From address was set.
    #[error("No sender specified")]
    MissingSender,

    /// None of To, Cc or Bcc has an address.
    #[error("No recipient specified: at least one To, Cc, or Bcc recipient is required")]
    MissingRecipient,

    /// Address could not be parsed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Header name contains characters not allowed by RFC 5322.
    #[error("Invalid header name: {0:?}")]
    InvalidHeaderName(String),

    /// Extra header would override a header the composer writes itself.
    #[error("Header {0} is set by the composer and cannot be supplied as an extra header")]
    ReservedHeader(String),

    /// Header has several values and the active policy does not allow that.
    #[error("Unsupported multi-value header: {0}")]
    UnsupportedMultiValueHeader(String),

    /// Attachment has no file name.
    #[error("Attachment file name cannot be empty")]
    MissingFileName,

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Invalid encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// No boundary could be generated that is distinct from the enclosing ones.
    #[error("Could not generate a unique multipart boundary")]
    BoundaryCollision,

    /// Writing to the sink or reading an attachment failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),
}

impl Error {
    /// Returns true for errors caused by the message contents rather than I/O.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingSender
                | Self::MissingRecipient
                | Self::InvalidAddress(_)
                | Self::InvalidHeaderName(_)
                | Self::ReservedHeader(_)
                | Self::InvalidContentType(_)
                | Self::MissingFileName
        )
    }
}
