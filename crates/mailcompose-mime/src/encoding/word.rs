//! RFC 2047 encoded-words for header values.

use super::{decode_base64, decode_quoted_printable};
use crate::config::LineConfig;
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Longest allowed encoded-word, markers included (RFC 2047 section 2).
pub const MAX_ENCODED_WORD_LENGTH: usize = 75;

/// Returns true if `text` cannot appear verbatim in an unstructured header.
#[must_use]
pub fn needs_encoding(text: &str) -> bool {
    text.contains("=?")
        || text
            .chars()
            .any(|c| !c.is_ascii() || (c.is_ascii_control() && c != '\t'))
}

/// Encodes a header value as one or more B-encoded words when required.
///
/// Same as [`encode_unstructured`] for a value that starts its own line.
///
/// # Errors
///
/// Returns an error if the charset name is too long to leave room for a
/// single character in an encoded-word.
pub fn encode_rfc2047(text: &str, charset: &str, line: &LineConfig) -> Result<String> {
    encode_unstructured(text, charset, 0, line)
}

/// Encodes and folds an unstructured header value.
///
/// `offset` is the width already taken on the first line, usually the
/// length of `Name: `. Plain printable ASCII is folded at spaces with
/// [`fold_text`]. Anything else is split on character boundaries into
/// `=?charset?B?...?=` words of at most 75 characters, sized so that no
/// line exceeds the configured length, and joined by the delimiter and a
/// single space.
///
/// # Errors
///
/// Returns an error if the charset name is too long to leave room for a
/// single character in an encoded-word.
pub fn encode_unstructured(
    text: &str,
    charset: &str,
    offset: usize,
    line: &LineConfig,
) -> Result<String> {
    if !needs_encoding(text) {
        return Ok(fold_text(text, offset, line));
    }

    let overhead = charset.len() + 7;
    let full = raw_capacity(MAX_ENCODED_WORD_LENGTH, overhead).ok_or_else(|| {
        Error::InvalidEncoding(format!("charset {charset:?} leaves no room in an encoded-word"))
    })?;
    let width = line.max_line_length;
    // Continuation lines begin with the folding space.
    let continued =
        raw_capacity(MAX_ENCODED_WORD_LENGTH.min(width.saturating_sub(1)), overhead).unwrap_or(full);
    let mut budget =
        raw_capacity(MAX_ENCODED_WORD_LENGTH.min(width.saturating_sub(offset)), overhead)
            .unwrap_or(continued);

    let fold = format!("{} ", line.delimiter_str());
    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;
    for (index, ch) in text.char_indices() {
        let next = index + ch.len_utf8();
        if next - start > budget {
            words.push(encode_fragment(&text[start..end], charset));
            start = end;
            budget = continued;
        }
        end = next;
    }
    if start < end {
        words.push(encode_fragment(&text[start..end], charset));
    }

    Ok(words.join(&fold))
}

/// Folds plain text at spaces so lines stay within the configured length.
///
/// A fold is the delimiter inserted before an existing space, so removing
/// the delimiters gives back `text`. A run of characters longer than a line
/// is never broken.
#[must_use]
pub fn fold_text(text: &str, offset: usize, line: &LineConfig) -> String {
    let width = line.max_line_length;
    let delimiter = line.delimiter_str();
    let mut out = String::with_capacity(text.len());
    let mut column = offset;
    let mut has_text = offset > 0;

    for (index, piece) in text.split(' ').enumerate() {
        if index > 0 {
            if has_text && !piece.is_empty() && column + 1 + piece.len() > width {
                out.push_str(&delimiter);
                column = 0;
                has_text = false;
            }
            out.push(' ');
            column += 1;
        }
        out.push_str(piece);
        column += piece.len();
        has_text |= !piece.is_empty();
    }
    out
}

/// Raw bytes that fit in an encoded-word of at most `limit` characters.
fn raw_capacity(limit: usize, overhead: usize) -> Option<usize> {
    // "=?" + charset + "?B?" + text + "?="
    let raw = limit.checked_sub(overhead)? / 4 * 3;
    // The widest UTF-8 character has to fit.
    (raw >= 4).then_some(raw)
}

fn encode_fragment(fragment: &str, charset: &str) -> String {
    format!("=?{charset}?B?{}?=", STANDARD.encode(fragment.as_bytes()))
}

/// Decodes a header value that may contain RFC 2047 encoded-words.
///
/// Whitespace between adjacent encoded-words is dropped, as RFC 2047
/// section 6.2 requires.
///
/// # Errors
///
/// Returns an error if an encoded-word is malformed or does not decode to
/// UTF-8.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut result = String::new();
    let mut pending: Vec<u8> = Vec::new();
    let mut previous_encoded = false;

    for token in text.split_whitespace() {
        if let Some(bytes) = decode_word(token)? {
            if !previous_encoded && !result.is_empty() {
                result.push(' ');
            }
            pending.extend_from_slice(&bytes);
            previous_encoded = true;
        } else {
            if !pending.is_empty() {
                result.push_str(&String::from_utf8(std::mem::take(&mut pending))?);
            }
            if !result.is_empty() {
                result.push(' ');
            }
            result.push_str(token);
            previous_encoded = false;
        }
    }
    if !pending.is_empty() {
        result.push_str(&String::from_utf8(pending)?);
    }

    Ok(result)
}

fn decode_word(token: &str) -> Result<Option<Vec<u8>>> {
    let Some(inner) = token
        .strip_prefix("=?")
        .and_then(|rest| rest.strip_suffix("?="))
    else {
        return Ok(None);
    };

    let parts: Vec<&str> = inner.split('?').collect();
    if parts.len() != 3 {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    }

    let encoding = parts[1].to_uppercase();
    let encoded_text = parts[2];

    match encoding.as_str() {
        "B" => decode_base64(encoded_text).map(Some),
        "Q" => {
            let text_with_spaces = encoded_text.replace('_', " ");
            decode_quoted_printable(&text_with_spaces).map(|s| Some(s.into_bytes()))
        }
        _ => Err(Error::InvalidEncoding(format!(
            "Unknown encoding: {encoding}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode(text: &str) -> String {
        encode_rfc2047(text, "utf-8", &LineConfig::default()).unwrap()
    }

    #[test]
    fn test_ascii_unchanged() {
        assert_eq!(encode("Hello"), "Hello");
        assert_eq!(encode("\"Hi World\""), "\"Hi World\"");
        assert_eq!(encode(""), "");
    }

    #[test]
    fn test_short_non_ascii_single_word() {
        assert_eq!(encode("Héllo"), "=?utf-8?B?SMOpbGxv?=");
    }

    #[test]
    fn test_encoded_word_marker_forces_encoding() {
        let encoded = encode("a =?b?= c");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert_eq!(decode_rfc2047(&encoded).unwrap(), "a =?b?= c");
    }

    #[test]
    fn test_long_subject_is_folded() {
        let subject = "Réunion trimestrielle: résultats, prévisions et décisions à prendre";
        let encoded = encode(subject);
        let words: Vec<&str> = encoded.split("\r\n ").collect();
        assert!(words.len() > 1);
        for word in &words {
            assert!(word.len() <= MAX_ENCODED_WORD_LENGTH);
            assert!(word.starts_with("=?utf-8?B?") && word.ends_with("?="));
        }
        assert_eq!(decode_rfc2047(&encoded).unwrap(), subject);
    }

    #[test]
    fn test_multibyte_characters_never_split() {
        let subject = "日本語".repeat(20);
        let encoded = encode(&subject);
        for word in encoded.split("\r\n ") {
            let inner = &word[10..word.len() - 2];
            let bytes = decode_base64(inner).unwrap();
            assert!(String::from_utf8(bytes).is_ok());
        }
    }

    #[test]
    fn test_first_word_leaves_room_for_header_name() {
        let line = LineConfig::default();
        let encoded = encode_unstructured(&"é".repeat(80), "utf-8", "Subject: ".len(), &line).unwrap();
        let mut lines = encoded.split("\r\n");
        assert!("Subject: ".len() + lines.next().unwrap().len() <= 76);
        assert!(lines.all(|l| l.len() <= 76));
        assert_eq!(decode_rfc2047(&encoded).unwrap(), "é".repeat(80));
    }

    #[test]
    fn test_plain_text_folded_at_spaces() {
        let line = LineConfig::default();
        let text = "word ".repeat(300);
        let folded = encode_unstructured(&text, "utf-8", "Subject: ".len(), &line).unwrap();

        let mut lines = folded.split("\r\n");
        assert!("Subject: ".len() + lines.next().unwrap().len() <= 76);
        for l in lines {
            assert!(l.len() <= 76);
            assert!(l.starts_with(' ') && l.trim() != "");
        }
        assert_eq!(folded.replace("\r\n", ""), text);
    }

    #[test]
    fn test_fold_keeps_long_runs_whole() {
        let line = LineConfig::new(10, "\n");
        assert_eq!(fold_text("a bbbbbbbbbbbbbb c", 0, &line), "a\n bbbbbbbbbbbbbb\n c");
        assert_eq!(fold_text("x  y", 0, &line), "x  y");
    }

    #[test]
    fn test_oversized_charset_rejected() {
        let charset = "x".repeat(70);
        assert!(encode_rfc2047("é", &charset, &LineConfig::default()).is_err());
    }

    #[test]
    fn test_decode_plain_and_q() {
        assert_eq!(decode_rfc2047("Hello").unwrap(), "Hello");
        assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo_x?=").unwrap(), "Héllo x");
        assert_eq!(
            decode_rfc2047("Re: =?utf-8?B?SMOpbGxv?= there").unwrap(),
            "Re: Héllo there"
        );
    }
}
