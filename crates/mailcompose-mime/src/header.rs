//! Header collection and header block serialization.

use crate::config::{LineConfig, MultiValuePolicy};
use crate::error::{Error, Result};
use std::io::Write;

/// Collection of email headers.
///
/// Names are matched case-insensitively and kept in first-insertion order,
/// so serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index].1.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Sets a header value, replacing any existing values.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index].1 = vec![value],
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|index| self.entries[index].1.first().map(String::as_str))
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.position(name)
            .map(|index| self.entries[index].1.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns true if the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.entries
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over header names with all their values.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Returns an iterator over all headers.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// Serializes the header block followed by the blank separator line.
    ///
    /// Values are sanitized with [`sanitize_value`]. A header with several
    /// values is handled according to `policy`. Nothing is written to
    /// `sink` if any header is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid header name, for a multi-value
    /// header under [`MultiValuePolicy::Reject`], or if writing fails.
    pub fn write_to<W: Write>(
        &self,
        sink: &mut W,
        line: &LineConfig,
        policy: &MultiValuePolicy,
    ) -> Result<()> {
        let delimiter = line.delimiter_str();
        let mut block = String::new();

        for (name, values) in &self.entries {
            validate_name(name)?;
            let values: Vec<String> = values
                .iter()
                .map(|value| sanitize_value(value, &delimiter))
                .collect();

            match (values.len(), policy) {
                (0, _) => {}
                (1, _) | (_, MultiValuePolicy::Repeat) => {
                    for value in &values {
                        push_line(&mut block, name, value, &delimiter);
                    }
                }
                (_, MultiValuePolicy::Join(separator)) => {
                    push_line(&mut block, name, &values.join(separator.as_str()), &delimiter);
                }
                (_, MultiValuePolicy::Reject) => {
                    return Err(Error::UnsupportedMultiValueHeader(name.clone()));
                }
            }
        }

        block.push_str(&delimiter);
        sink.write_all(block.as_bytes())?;
        Ok(())
    }
}

fn push_line(block: &mut String, name: &str, value: &str, delimiter: &str) {
    block.push_str(name);
    block.push_str(": ");
    block.push_str(value);
    block.push_str(delimiter);
}

/// Checks that a header name is printable ASCII without a colon.
///
/// # Errors
///
/// Returns [`Error::InvalidHeaderName`] otherwise.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b':');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidHeaderName(name.to_string()))
    }
}

/// Cleans a header value for output.
///
/// A line break followed by a space or tab is a fold and is rewritten with
/// `delimiter`. Every other CR or LF becomes a space, so a value can never
/// start a new header line. Other control characters except tab are
/// dropped. Surrounding whitespace is trimmed.
#[must_use]
pub fn sanitize_value(value: &str, delimiter: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\r' || c == '\n' {
            if c == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            if matches!(chars.peek(), Some(' ' | '\t')) {
                out.push_str(delimiter);
            } else {
                out.push(' ');
            }
        } else if c == '\t' || !c.is_control() {
            out.push(c);
        }
    }

    out.trim().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn render(headers: &Headers, policy: &MultiValuePolicy) -> Result<String> {
        let mut out = Vec::new();
        headers.write_to(&mut out, &LineConfig::default(), policy)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
    }

    #[test]
    fn test_headers_set() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com");
        headers.add("to", "bob@example.com");
        assert_eq!(headers.get_all("To").len(), 2);
        assert_eq!(headers.len(), 1);

        headers.set("To", "charlie@example.com");
        assert_eq!(headers.get_all("To"), vec!["charlie@example.com"]);
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test");
        assert!(headers.contains("subject"));

        headers.remove("SUBJECT");
        assert!(headers.get("Subject").is_none());
        assert!(headers.is_empty());
    }

    #[test]
    fn test_write_block_in_insertion_order() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com");
        headers.add("To", "recipient@example.com");

        let block = render(&headers, &MultiValuePolicy::Reject).unwrap();
        assert_eq!(
            block,
            "From: sender@example.com\r\nTo: recipient@example.com\r\n\r\n"
        );
    }

    #[test]
    fn test_empty_block_is_blank_line() {
        let block = render(&Headers::new(), &MultiValuePolicy::Reject).unwrap();
        assert_eq!(block, "\r\n");
    }

    #[test]
    fn test_multi_value_rejected() {
        let mut headers = Headers::new();
        headers.add("Keywords", "a");
        headers.add("Keywords", "b");

        let mut out = Vec::new();
        let err = headers
            .write_to(&mut out, &LineConfig::default(), &MultiValuePolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedMultiValueHeader(name) if name == "Keywords"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_multi_value_join_and_repeat() {
        let mut headers = Headers::new();
        headers.add("Keywords", "a");
        headers.add("Keywords", "b");

        let joined = render(&headers, &MultiValuePolicy::Join(", ".into())).unwrap();
        assert_eq!(joined, "Keywords: a, b\r\n\r\n");

        let repeated = render(&headers, &MultiValuePolicy::Repeat).unwrap();
        assert_eq!(repeated, "Keywords: a\r\nKeywords: b\r\n\r\n");
    }

    #[test]
    fn test_sanitize_blocks_header_injection() {
        assert_eq!(
            sanitize_value("  Hello\r\nBcc: evil@example.com ", "\r\n"),
            "Hello Bcc: evil@example.com"
        );
        assert_eq!(sanitize_value("a\nb\rc", "\r\n"), "a b c");
    }

    #[test]
    fn test_sanitize_drops_control_characters() {
        assert_eq!(sanitize_value("a\u{0}b\u{1b}c\u{7f}\td", "\r\n"), "abc\td");
        assert_eq!(sanitize_value("x\r\n y", ""), "x y");
    }

    #[test]
    fn test_sanitize_keeps_folding() {
        assert_eq!(
            sanitize_value("a@x.com,\r\n b@y.com", "\r\n"),
            "a@x.com,\r\n b@y.com"
        );
        assert_eq!(sanitize_value("a,\n\tb", "\r\n"), "a,\r\n\tb");
    }

    #[test]
    fn test_invalid_header_name() {
        let mut headers = Headers::new();
        headers.add("Bad Name", "x");
        assert!(matches!(
            render(&headers, &MultiValuePolicy::Reject),
            Err(Error::InvalidHeaderName(_))
        ));
        assert!(validate_name("X-Ok").is_ok());
        assert!(validate_name("X:No").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn test_headers_iter() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com");
        headers.add("To", "recipient@example.com");

        let mut count = 0;
        for (name, value) in headers.iter() {
            assert!(!name.is_empty());
            assert!(!value.is_empty());
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
