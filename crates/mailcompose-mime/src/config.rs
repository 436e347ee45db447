//! Composition configuration types.

use std::fmt;

/// Maximum encoded line length recommended by RFC 2045.
pub const DEFAULT_LINE_LENGTH: usize = 76;

/// Line framing shared by every encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineConfig {
    /// Maximum number of characters on an encoded line, excluding the delimiter.
    pub max_line_length: usize,
    /// Line delimiter bytes.
    pub delimiter: Vec<u8>,
}

impl LineConfig {
    /// Creates a line configuration.
    ///
    /// A zero length is raised to one so framing always makes progress.
    #[must_use]
    pub fn new(max_line_length: usize, delimiter: impl Into<Vec<u8>>) -> Self {
        Self {
            max_line_length: max_line_length.max(1),
            delimiter: delimiter.into(),
        }
    }

    /// Returns the delimiter as text, replacing invalid UTF-8.
    #[must_use]
    pub fn delimiter_str(&self) -> String {
        String::from_utf8_lossy(&self.delimiter).into_owned()
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_LENGTH, b"\r\n".to_vec())
    }
}

/// Content-Transfer-Encoding used for a body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferEncoding {
    /// Base64 encoding.
    #[default]
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
        }
    }
}

/// What the header writer does with a header holding several values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MultiValuePolicy {
    /// Fail with [`crate::Error::UnsupportedMultiValueHeader`].
    #[default]
    Reject,
    /// Join the values on one line with the given separator.
    Join(String),
    /// Emit one line per value.
    Repeat,
}

/// Message composition configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComposeConfig {
    /// Line framing for encoded bodies and header folding.
    pub line: LineConfig,
    /// Transfer encoding of the text/plain part.
    pub text_encoding: TransferEncoding,
    /// Transfer encoding of the text/html part.
    pub html_encoding: TransferEncoding,
    /// Charset declared for body parts and encoded-words.
    pub charset: String,
    /// Handling of headers with several values.
    pub multi_value: MultiValuePolicy,
    /// Adds a `Date` header with the current time unless one is supplied.
    pub date_header: bool,
}

impl ComposeConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ComposeConfigBuilder {
        ComposeConfigBuilder::default()
    }
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            line: LineConfig::default(),
            text_encoding: TransferEncoding::Base64,
            html_encoding: TransferEncoding::Base64,
            charset: "utf-8".to_string(),
            multi_value: MultiValuePolicy::Reject,
            date_header: false,
        }
    }
}

/// Builder for [`ComposeConfig`].
#[derive(Debug, Clone, Default)]
pub struct ComposeConfigBuilder {
    config: ComposeConfig,
}

impl ComposeConfigBuilder {
    /// Sets the maximum encoded line length.
    #[must_use]
    pub fn max_line_length(mut self, length: usize) -> Self {
        self.config.line.max_line_length = length.max(1);
        self
    }

    /// Sets the line delimiter.
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<Vec<u8>>) -> Self {
        self.config.line.delimiter = delimiter.into();
        self
    }

    /// Sets the transfer encoding of the plain text part.
    #[must_use]
    pub const fn text_encoding(mut self, encoding: TransferEncoding) -> Self {
        self.config.text_encoding = encoding;
        self
    }

    /// Sets the transfer encoding of the HTML part.
    #[must_use]
    pub const fn html_encoding(mut self, encoding: TransferEncoding) -> Self {
        self.config.html_encoding = encoding;
        self
    }

    /// Sets the transfer encoding of both body parts.
    #[must_use]
    pub const fn body_encoding(self, encoding: TransferEncoding) -> Self {
        self.text_encoding(encoding).html_encoding(encoding)
    }

    /// Sets the charset.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.config.charset = charset.into();
        self
    }

    /// Sets the multi-value header policy.
    #[must_use]
    pub fn multi_value(mut self, policy: MultiValuePolicy) -> Self {
        self.config.multi_value = policy;
        self
    }

    /// Enables or disables the automatic `Date` header.
    #[must_use]
    pub const fn date_header(mut self, enabled: bool) -> Self {
        self.config.date_header = enabled;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ComposeConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ComposeConfig::default();
        assert_eq!(config.line.max_line_length, 76);
        assert_eq!(config.line.delimiter, b"\r\n");
        assert_eq!(config.text_encoding, TransferEncoding::Base64);
        assert_eq!(config.multi_value, MultiValuePolicy::Reject);
        assert!(!config.date_header);
    }

    #[test]
    fn test_builder() {
        let config = ComposeConfig::builder()
            .max_line_length(64)
            .delimiter("\n")
            .text_encoding(TransferEncoding::QuotedPrintable)
            .multi_value(MultiValuePolicy::Join(", ".into()))
            .build();
        assert_eq!(config.line.max_line_length, 64);
        assert_eq!(config.line.delimiter_str(), "\n");
        assert_eq!(config.text_encoding, TransferEncoding::QuotedPrintable);
        assert_eq!(config.html_encoding, TransferEncoding::Base64);
    }

    #[test]
    fn test_zero_line_length_is_clamped() {
        assert_eq!(LineConfig::new(0, "\r\n").max_line_length, 1);
    }

    #[test]
    fn test_transfer_encoding_display() {
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
        assert_eq!(
            TransferEncoding::QuotedPrintable.to_string(),
            "quoted-printable"
        );
    }
}
