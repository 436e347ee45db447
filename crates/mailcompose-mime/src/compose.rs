//! Multipart message composition.
//!
//! A message is written in one pass:
//!
//! ```text
//! top-level headers (From, Reply-To, To, Cc, Subject, extras, MIME-Version,
//!                    Content-Type: multipart/mixed)
//! --mixed
//!   Content-Type: multipart/alternative      (only if a body is present)
//!   --alternative  text/plain part
//!   --alternative  text/html part
//!   --alternative--
//! --mixed  attachment part (base64)          (one per attachment)
//! --mixed--
//! ```
//!
//! Every check that can fail without I/O (addresses, header names, content
//! types, boundaries) runs before the first byte is written. Bcc addresses
//! are validated but never written.

use crate::address::{Mailbox, encode_address_list};
use crate::config::{ComposeConfig, TransferEncoding};
use crate::content_type::{ContentType, attachment_disposition};
use crate::encoding::{Base64Encoder, PartEncoder, Stage, encode_unstructured};
use crate::error::{Error, Result};
use crate::header::{Headers, sanitize_value, validate_name};
use crate::message::{Attachment, Message};
use crate::multipart::{BoundarySource, Envelope, RandomBoundary};
use chrono::Utc;
use std::io::{self, Write};
use tracing::{debug, trace};

/// Headers the composer writes itself; extra headers may not set them.
const RESERVED_HEADERS: &[&str] = &[
    "From",
    "Reply-To",
    "To",
    "Cc",
    "Bcc",
    "Subject",
    "MIME-Version",
    "Content-Type",
    "Content-Transfer-Encoding",
];

/// Writes [`Message`]s as multipart/mixed MIME.
#[derive(Debug)]
pub struct Composer<B: BoundarySource = RandomBoundary> {
    config: ComposeConfig,
    boundaries: B,
}

impl Composer {
    /// Creates a composer with random boundaries.
    #[must_use]
    pub const fn new(config: ComposeConfig) -> Self {
        Self {
            config,
            boundaries: RandomBoundary,
        }
    }
}

impl<B: BoundarySource> Composer<B> {
    /// Creates a composer drawing boundaries from `boundaries`.
    #[must_use]
    pub const fn with_boundary_source(config: ComposeConfig, boundaries: B) -> Self {
        Self { config, boundaries }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ComposeConfig {
        &self.config
    }

    /// Composes `message` into a byte vector.
    ///
    /// # Errors
    ///
    /// See [`Composer::write_message`].
    pub fn compose(&mut self, message: &mut Message) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_message(message, &mut out)?;
        Ok(out)
    }

    /// Streams `message` into `sink`, consuming its attachment data.
    ///
    /// Attachments are encoded as they are read, so memory use does not
    /// depend on attachment size.
    ///
    /// # Errors
    ///
    /// Returns a validation or encoding error before anything is written,
    /// or an I/O error from the sink or an attachment. After an I/O error
    /// the bytes already written are incomplete and must be discarded.
    pub fn write_message<W: Write>(&mut self, message: &mut Message, sink: &mut W) -> Result<()> {
        let mut headers = self.top_headers(message)?;
        let attachment_headers = message
            .attachments
            .iter()
            .map(attachment_headers)
            .collect::<Result<Vec<_>>>()?;

        let mut mixed = Envelope::open("mixed", &mut self.boundaries, &[])?;
        let alternative = if has_body(message) {
            Some(Envelope::open(
                "alternative",
                &mut self.boundaries,
                &[mixed.boundary()],
            )?)
        } else {
            None
        };

        headers.add("MIME-Version", "1.0");
        headers.add("Content-Type", mixed.content_type().to_string());

        debug!(
            attachments = message.attachments.len(),
            has_body = alternative.is_some(),
            "Composing message"
        );

        let line = &self.config.line;
        headers.write_to(sink, line, &self.config.multi_value)?;

        if let Some(alternative) = alternative {
            mixed.begin_part(sink, line)?;
            self.write_bodies(message, alternative, sink)?;
        }

        for (attachment, part_headers) in message.attachments.iter_mut().zip(attachment_headers) {
            mixed.begin_part(sink, line)?;
            self.write_attachment(attachment, &part_headers, sink)?;
        }

        mixed.close(sink, line)?;
        debug!("Message composed");
        Ok(())
    }

    fn top_headers(&self, message: &Message) -> Result<Headers> {
        message.validate()?;

        let line = &self.config.line;
        let charset = self.config.charset.as_str();
        let mut headers = Headers::new();

        headers.add(
            "From",
            Mailbox::parse(&message.from)?.to_header_value(charset, line)?,
        );

        if let Some(reply_to) = message.reply_to.as_deref().filter(|r| !r.trim().is_empty()) {
            headers.add(
                "Reply-To",
                Mailbox::parse(reply_to)?.to_header_value(charset, line)?,
            );
        }

        for (name, addresses) in [("To", &message.to), ("Cc", &message.cc)] {
            let formatted = addresses
                .iter()
                .filter(|address| !address.trim().is_empty())
                .map(|address| Mailbox::parse(address)?.to_header_value(charset, line))
                .collect::<Result<Vec<_>>>()?;
            let value = encode_address_list(&formatted, line);
            if !value.is_empty() {
                headers.add(name, value);
            }
        }

        for address in message.bcc.iter().filter(|a| !a.trim().is_empty()) {
            Mailbox::parse(address)?;
        }

        if let Some(subject) = message.subject.as_deref().filter(|s| !s.is_empty()) {
            headers.add(
                "Subject",
                encode_unstructured(subject, charset, "Subject: ".len(), line)?,
            );
        }

        if self.config.date_header && !message.headers.contains("Date") {
            headers.add("Date", Utc::now().to_rfc2822());
        }

        for (name, values) in message.headers.entries() {
            validate_name(name)?;
            if RESERVED_HEADERS.iter().any(|r| r.eq_ignore_ascii_case(name)) {
                return Err(Error::ReservedHeader(name.to_string()));
            }
            for value in values {
                let unfolded = sanitize_value(value, "");
                headers.add(
                    name,
                    encode_unstructured(&unfolded, charset, name.len() + 2, line)?,
                );
            }
        }

        Ok(headers)
    }

    fn write_bodies<W: Write>(
        &self,
        message: &Message,
        mut alternative: Envelope,
        sink: &mut W,
    ) -> Result<()> {
        let line = &self.config.line;
        let charset = self.config.charset.as_str();

        let mut envelope_headers = Headers::new();
        envelope_headers.add("Content-Type", alternative.content_type().to_string());
        envelope_headers.write_to(sink, line, &self.config.multi_value)?;

        let variants = [
            (
                message.text_body.as_deref(),
                ContentType::text_plain(charset),
                self.config.text_encoding,
            ),
            (
                message.html_body.as_deref(),
                ContentType::text_html(charset),
                self.config.html_encoding,
            ),
        ];

        for (body, content_type, encoding) in variants {
            let Some(body) = body.filter(|b| !b.is_empty()) else {
                continue;
            };
            trace!(content_type = %content_type, %encoding, "Writing body part");

            alternative.begin_part(sink, line)?;
            let mut part = Headers::new();
            part.add("Content-Type", content_type.to_string());
            part.add("Content-Transfer-Encoding", encoding.to_string());
            part.write_to(sink, line, &self.config.multi_value)?;

            let mut encoder = PartEncoder::new(encoding, &mut *sink, line.clone());
            encoder.write_all(body.as_bytes())?;
            encoder.finish()?;
        }

        alternative.close(sink, line)?;
        Ok(())
    }

    fn write_attachment<W: Write>(
        &self,
        attachment: &mut Attachment,
        part: &Headers,
        sink: &mut W,
    ) -> Result<()> {
        let line = &self.config.line;
        part.write_to(sink, line, &self.config.multi_value)?;

        let mut encoder = Base64Encoder::new(&mut *sink, line.clone());
        let copied = io::copy(attachment.reader(), &mut encoder)?;
        encoder.finish()?;

        trace!(name = %attachment.name, bytes = copied, "Attachment encoded");
        Ok(())
    }
}

fn has_body(message: &Message) -> bool {
    [&message.text_body, &message.html_body]
        .into_iter()
        .any(|body| body.as_deref().is_some_and(|b| !b.is_empty()))
}

fn attachment_headers(attachment: &Attachment) -> Result<Headers> {
    if attachment.name.trim().is_empty() {
        return Err(Error::MissingFileName);
    }
    let mut headers = Headers::new();
    headers.add(
        "Content-Type",
        attachment.resolved_content_type()?.to_string(),
    );
    headers.add("Content-Disposition", attachment_disposition(&attachment.name));
    headers.add(
        "Content-Transfer-Encoding",
        TransferEncoding::Base64.to_string(),
    );
    Ok(headers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::MultiValuePolicy;

    struct Counter(usize);

    impl BoundarySource for Counter {
        fn next_boundary(&mut self) -> String {
            self.0 += 1;
            format!("=_b{}", self.0)
        }
    }

    fn compose(message: &mut Message, config: ComposeConfig) -> Result<String> {
        let mut composer = Composer::with_boundary_source(config, Counter(0));
        Ok(String::from_utf8(composer.compose(message)?).unwrap())
    }

    #[test]
    fn test_exact_layout() {
        let mut message = Message::new()
            .from("s@d.com")
            .to("r@d.com")
            .subject("Hello")
            .text_body("Hi")
            .attach(Attachment::from_bytes("a.txt", b"abc".to_vec()));

        let output = compose(&mut message, ComposeConfig::default()).unwrap();
        let expected = concat!(
            "From: s@d.com\r\n",
            "To: r@d.com\r\n",
            "Subject: Hello\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"=_b1\"\r\n",
            "\r\n",
            "--=_b1\r\n",
            "Content-Type: multipart/alternative; boundary=\"=_b2\"\r\n",
            "\r\n",
            "--=_b2\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "SGk=\r\n",
            "--=_b2--\r\n",
            "\r\n",
            "--=_b1\r\n",
            "Content-Type: text/plain\r\n",
            "Content-Disposition: attachment; filename=\"a.txt\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "YWJj\r\n",
            "--=_b1--\r\n",
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn test_quoted_printable_bodies() {
        let mut message = Message::new()
            .from("s@d.com")
            .to("r@d.com")
            .text_body("Héllo")
            .html_body("<p>Héllo</p>");
        let config = ComposeConfig::builder()
            .body_encoding(TransferEncoding::QuotedPrintable)
            .build();

        let output = compose(&mut message, config).unwrap();
        assert!(output.contains("Content-Transfer-Encoding: quoted-printable\r\n\r\nH=C3=A9llo\r\n"));
        assert!(output.contains("\r\n\r\n<p>H=C3=A9llo</p>\r\n--=_b2--"));
    }

    #[test]
    fn test_reserved_extra_header_rejected() {
        let mut message = Message::new()
            .from("s@d.com")
            .to("r@d.com")
            .header("bcc", "leak@d.com");
        let err = compose(&mut message, ComposeConfig::default()).unwrap_err();
        assert!(matches!(err, Error::ReservedHeader(name) if name == "bcc"));
    }

    #[test]
    fn test_multi_value_extra_header_policy() {
        let message = || {
            Message::new()
                .from("s@d.com")
                .to("r@d.com")
                .header("Keywords", "a")
                .header("Keywords", "b")
        };

        let mut out = Vec::new();
        let mut composer = Composer::with_boundary_source(ComposeConfig::default(), Counter(0));
        let err = composer.write_message(&mut message(), &mut out).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMultiValueHeader(_)));
        assert!(out.is_empty());

        let config = ComposeConfig::builder()
            .multi_value(MultiValuePolicy::Join(", ".into()))
            .build();
        let output = compose(&mut message(), config).unwrap();
        assert!(output.contains("Keywords: a, b\r\n"));
    }

    #[test]
    fn test_date_header() {
        let mut message = Message::new().from("s@d.com").to("r@d.com");
        let config = ComposeConfig::builder().date_header(true).build();
        let output = compose(&mut message, config.clone()).unwrap();
        assert!(output.contains("\r\nDate: "));

        let mut message = Message::new()
            .from("s@d.com")
            .to("r@d.com")
            .header("Date", "Mon, 1 Jan 2024 00:00:00 +0000");
        let output = compose(&mut message, config).unwrap();
        assert_eq!(output.matches("Date: ").count(), 1);
        assert!(output.contains("Date: Mon, 1 Jan 2024 00:00:00 +0000\r\n"));
    }

    #[test]
    fn test_empty_attachment_name_rejected_before_output() {
        let mut message = Message::new()
            .from("s@d.com")
            .to("r@d.com")
            .attach(Attachment::from_bytes("  ", b"data".to_vec()));

        let mut out = Vec::new();
        let mut composer = Composer::with_boundary_source(ComposeConfig::default(), Counter(0));
        let err = composer.write_message(&mut message, &mut out).unwrap_err();
        assert!(matches!(err, Error::MissingFileName));
        assert!(err.is_validation());
        assert!(out.is_empty());
    }

    #[test]
    fn test_attachment_read_error_propagates() {
        struct Failing;
        impl io::Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("disk gone"))
            }
        }

        let mut message = Message::new()
            .from("s@d.com")
            .to("r@d.com")
            .attach(Attachment::new("x.bin", Failing));
        assert!(matches!(
            compose(&mut message, ComposeConfig::default()),
            Err(Error::Io(_))
        ));
    }
}
