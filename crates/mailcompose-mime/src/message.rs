//! Outgoing message and attachment types.

use crate::address::Mailbox;
use crate::compose::Composer;
use crate::config::ComposeConfig;
use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

/// An attachment: a file name plus a data source read once during
/// composition.
pub struct Attachment {
    /// File name used in `Content-Disposition` and for type inference.
    pub name: String,
    /// Explicit content type (optional).
    pub content_type: Option<String>,
    data: Box<dyn Read + Send>,
}

impl Attachment {
    /// Creates an attachment reading from `data`.
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Read + Send + 'static) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            data: Box::new(data),
        }
    }

    /// Creates an attachment from in-memory bytes.
    #[must_use]
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::new(name, Cursor::new(data.into()))
    }

    /// Opens a file as an attachment named after its final path component.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or(Error::MissingFileName)?;
        Ok(Self::new(name, File::open(path)?))
    }

    /// Sets an explicit content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Resolves the content type: explicit value, else file extension,
    /// else `application/octet-stream`.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit content type is malformed.
    pub fn resolved_content_type(&self) -> Result<ContentType> {
        match self.content_type.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => ContentType::parse(explicit),
            _ => Ok(ContentType::from_file_name(&self.name)),
        }
    }

    pub(crate) fn reader(&mut self) -> &mut (dyn Read + Send + 'static) {
        &mut *self.data
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Addresses for the SMTP envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Bare sender address for `MAIL FROM`.
    pub sender: String,
    /// Bare To, Cc and Bcc addresses for `RCPT TO`, without duplicates.
    pub recipients: Vec<String>,
}

/// An email message to compose.
///
/// Addresses may be of any form accepted by [`Mailbox::parse`].
#[derive(Debug, Default)]
pub struct Message {
    /// Sender address.
    pub from: String,
    /// Reply-To address (optional).
    pub reply_to: Option<String>,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// CC addresses.
    pub cc: Vec<String>,
    /// BCC addresses. Used for delivery only, never written to headers.
    pub bcc: Vec<String>,
    /// Subject line (optional).
    pub subject: Option<String>,
    /// Plain text body (optional).
    pub text_body: Option<String>,
    /// HTML body (optional).
    pub html_body: Option<String>,
    /// Attachments in output order.
    pub attachments: Vec<Attachment>,
    /// Extra headers such as `Date` or `In-Reply-To`.
    pub headers: Headers,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, sender: impl Into<String>) -> Self {
        self.from = sender.into();
        self
    }

    /// Sets the Reply-To address.
    #[must_use]
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<String>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: impl Into<String>) -> Self {
        self.bcc.push(recipient.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the plain text body.
    #[must_use]
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.text_body = Some(body.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Adds an extra header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Returns true if any of To, Cc or Bcc holds a non-blank address.
    #[must_use]
    pub fn has_recipient(&self) -> bool {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .any(|address| !address.trim().is_empty())
    }

    /// Checks the sender and recipient requirements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRecipient`] or [`Error::MissingSender`].
    pub fn validate(&self) -> Result<()> {
        if !self.has_recipient() {
            return Err(Error::MissingRecipient);
        }
        if self.from.trim().is_empty() {
            return Err(Error::MissingSender);
        }
        Ok(())
    }

    /// Returns the bare sender and recipient addresses for SMTP.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the sender or recipients are missing
    /// or any address cannot be parsed.
    pub fn delivery(&self) -> Result<Delivery> {
        self.validate()?;
        let sender = Mailbox::parse(&self.from)?.address;

        let mut recipients: Vec<String> = Vec::new();
        for address in self.to.iter().chain(&self.cc).chain(&self.bcc) {
            if address.trim().is_empty() {
                continue;
            }
            let bare = Mailbox::parse(address)?.address;
            if !recipients.iter().any(|r| r.eq_ignore_ascii_case(&bare)) {
                recipients.push(bare);
            }
        }

        Ok(Delivery { sender, recipients })
    }

    /// Composes the message with the default configuration.
    ///
    /// Attachment data sources are consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if validation, encoding or reading an attachment
    /// fails.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        Composer::new(ComposeConfig::default()).compose(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let message = Message::new()
            .from("Domain Sender <sender@domain.com>")
            .reply_to("noreply@domain.com")
            .to("to_1@domain.com")
            .cc("to_2@domain.com")
            .bcc("to_3@domain.com")
            .subject("My Subject")
            .text_body("My Plain Text Body")
            .header("In-Reply-To", "<abc@domain.com>");

        assert_eq!(message.to, vec!["to_1@domain.com"]);
        assert_eq!(message.subject.as_deref(), Some("My Subject"));
        assert_eq!(message.headers.get("in-reply-to"), Some("<abc@domain.com>"));
    }

    #[test]
    fn test_validate_order() {
        assert!(matches!(Message::new().validate(), Err(Error::MissingRecipient)));
        assert!(matches!(
            Message::new().bcc("x@y.com").validate(),
            Err(Error::MissingSender)
        ));
        assert!(matches!(
            Message::new().from("s@d.com").to("  ").validate(),
            Err(Error::MissingRecipient)
        ));
    }

    #[test]
    fn test_delivery_includes_bcc_once() {
        let message = Message::new()
            .from("Sender <s@d.com>")
            .to("A <a@d.com>")
            .cc("b@d.com")
            .bcc("Hidden <c@d.com>")
            .bcc("A@d.com");

        let delivery = message.delivery().unwrap();
        assert_eq!(delivery.sender, "s@d.com");
        assert_eq!(delivery.recipients, vec!["a@d.com", "b@d.com", "c@d.com"]);
    }

    #[test]
    fn test_delivery_rejects_bad_address() {
        let message = Message::new().from("s@d.com").to("not-an-address");
        assert!(matches!(message.delivery(), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_attachment_content_type_resolution() {
        let pdf = Attachment::from_bytes("report.pdf", b"%PDF".to_vec());
        assert_eq!(pdf.resolved_content_type().unwrap().essence(), "application/pdf");

        let explicit = Attachment::from_bytes("data.bin", Vec::new()).with_content_type("text/csv");
        assert_eq!(explicit.resolved_content_type().unwrap().essence(), "text/csv");

        let unknown = Attachment::from_bytes("blob", Vec::new());
        assert_eq!(
            unknown.resolved_content_type().unwrap().essence(),
            "application/octet-stream"
        );

        let bad = Attachment::from_bytes("x", Vec::new()).with_content_type("nonsense");
        assert!(bad.resolved_content_type().is_err());
    }

    #[test]
    fn test_attachment_from_missing_path() {
        assert!(matches!(
            Attachment::from_path("/nonexistent/dir/file.txt"),
            Err(Error::Io(_))
        ));
    }
}
