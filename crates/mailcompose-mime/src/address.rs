//! Mailbox parsing and address list encoding.

use crate::config::LineConfig;
use crate::encoding::{encode_rfc2047, needs_encoding};
use crate::error::{Error, Result};
use std::fmt;

/// Mailbox (optional display name + address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name (optional).
    pub name: Option<String>,
    /// Bare address, e.g. `user@example.com`.
    pub address: String,
}

impl Mailbox {
    /// Parses `Display Name <addr>`, `"Quoted, Name" <addr>`, `<addr>` or
    /// a bare `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the input is empty, has
    /// unbalanced angle brackets, or the address part is malformed.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        let (name, address) = match input.rfind('<') {
            Some(open) => {
                let address = input[open + 1..]
                    .strip_suffix('>')
                    .ok_or_else(|| Error::InvalidAddress(format!("Unclosed '<' in {input:?}")))?
                    .trim();
                (unquote(input[..open].trim()), address)
            }
            None => (None, input),
        };

        validate_address(address)?;
        Ok(Self {
            name,
            address: address.to_string(),
        })
    }

    /// Returns the bare address used for the SMTP envelope.
    #[must_use]
    pub fn bare(&self) -> &str {
        &self.address
    }

    /// Formats the mailbox for a header value.
    ///
    /// Display names made of atoms are written as-is, other ASCII names are
    /// quoted, and names that need it become RFC 2047 encoded-words.
    ///
    /// # Errors
    ///
    /// Returns an error if the display name cannot be encoded in `charset`.
    pub fn to_header_value(&self, charset: &str, line: &LineConfig) -> Result<String> {
        let Some(name) = &self.name else {
            return Ok(self.address.clone());
        };

        let name = if needs_encoding(name) {
            encode_rfc2047(name, charset, line)?
        } else if name.chars().all(|c| c == ' ' || is_atext(c)) {
            name.clone()
        } else {
            quote(name)
        };
        Ok(format!("{name} <{}>", self.address))
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", quote(name), self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c)
}

fn quote(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn unquote(name: &str) -> Option<String> {
    let name = match name.strip_prefix('"').and_then(|n| n.strip_suffix('"')) {
        Some(inner) => {
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else {
                    out.push(c);
                }
            }
            out
        }
        None => name.to_string(),
    };
    (!name.is_empty()).then_some(name)
}

/// Validates an email address (basic validation).
fn validate_address(addr: &str) -> Result<()> {
    if addr.is_empty() {
        return Err(Error::InvalidAddress("Address cannot be empty".into()));
    }

    if addr
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || "<>(),;:\"[]\\".contains(c))
    {
        return Err(Error::InvalidAddress(format!(
            "Address contains invalid characters: {addr:?}"
        )));
    }

    let parts: Vec<&str> = addr.split('@').collect();
    if parts.len() != 2 {
        return Err(Error::InvalidAddress(format!(
            "Address must have exactly one @: {addr:?}"
        )));
    }

    if parts[0].is_empty() || parts[1].is_empty() {
        return Err(Error::InvalidAddress(format!(
            "Local and domain parts cannot be empty: {addr:?}"
        )));
    }

    Ok(())
}

/// Joins header-ready addresses into one folded header value.
///
/// Entries are separated by `,` followed by the delimiter and a space.
/// Blank entries are skipped; an empty list yields an empty string.
#[must_use]
pub fn encode_address_list<S: AsRef<str>>(addresses: &[S], line: &LineConfig) -> String {
    let separator = format!(",{} ", line.delimiter_str());
    addresses
        .iter()
        .map(|address| address.as_ref().trim())
        .filter(|address| !address.is_empty())
        .collect::<Vec<_>>()
        .join(&separator)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn header(input: &str) -> String {
        Mailbox::parse(input)
            .unwrap()
            .to_header_value("utf-8", &LineConfig::default())
            .unwrap()
    }

    #[test]
    fn test_parse_bare() {
        let mailbox = Mailbox::parse("user@example.com").unwrap();
        assert_eq!(mailbox.bare(), "user@example.com");
        assert!(mailbox.name.is_none());
    }

    #[test]
    fn test_parse_display_name() {
        let mailbox = Mailbox::parse("Barry Gibbs <bg@example.com>").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("Barry Gibbs"));
        assert_eq!(mailbox.bare(), "bg@example.com");
    }

    #[test]
    fn test_parse_angle_only() {
        let mailbox = Mailbox::parse("<bg@example.com>").unwrap();
        assert!(mailbox.name.is_none());
        assert_eq!(mailbox.bare(), "bg@example.com");
    }

    #[test]
    fn test_parse_quoted_name() {
        let mailbox = Mailbox::parse(r#""Gibbs, \"Barry\"" <bg@example.com>"#).unwrap();
        assert_eq!(mailbox.name.as_deref(), Some(r#"Gibbs, "Barry""#));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(Mailbox::parse("").is_err());
        assert!(Mailbox::parse("userexample.com").is_err());
        assert!(Mailbox::parse("@example.com").is_err());
        assert!(Mailbox::parse("user@").is_err());
        assert!(Mailbox::parse("a@b@c").is_err());
        assert!(Mailbox::parse("Name <user@example.com").is_err());
        assert!(Mailbox::parse("Name <us er@example.com>").is_err());
    }

    #[test]
    fn test_header_value_forms() {
        assert_eq!(header("user@example.com"), "user@example.com");
        assert_eq!(header("Don't reply <noreply@domain.com>"), "Don't reply <noreply@domain.com>");
        assert_eq!(header("\"Doe, Jane\" <jane@example.com>"), "\"Doe, Jane\" <jane@example.com>");
        assert_eq!(header("Jürgen <j@example.com>"), "=?utf-8?B?SsO8cmdlbg==?= <j@example.com>");
    }

    #[test]
    fn test_address_list() {
        let line = LineConfig::default();
        assert_eq!(encode_address_list::<&str>(&[], &line), "");
        assert_eq!(
            encode_address_list(&["a@x.com", "b@y.com"], &line),
            "a@x.com,\r\n b@y.com"
        );
        assert_eq!(encode_address_list(&["a@x.com", "", "  "], &line), "a@x.com");
    }
}
