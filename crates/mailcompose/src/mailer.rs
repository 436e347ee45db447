//! Compose-and-send service.

use crate::error::Result;
use mailcompose_mime::{ComposeConfig, Composer, Message};
use mailcompose_smtp::{Config, Credentials, Reply};
use tracing::info;

/// Sends messages through one SMTP server.
///
/// Holds the compose configuration, the server configuration and
/// optional credentials. A `Mailer` can be reused for any number of
/// messages; each send opens its own SMTP session.
#[derive(Debug, Clone)]
pub struct Mailer {
    compose: ComposeConfig,
    smtp: Config,
    credentials: Option<Credentials>,
}

impl Mailer {
    /// Creates a mailer for `smtp` with the default compose configuration
    /// and no credentials.
    #[must_use]
    pub fn new(smtp: Config) -> Self {
        Self {
            compose: ComposeConfig::default(),
            smtp,
            credentials: None,
        }
    }

    /// Sets the credentials used when the server advertises AUTH.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the compose configuration.
    #[must_use]
    pub fn compose_config(mut self, config: ComposeConfig) -> Self {
        self.compose = config;
        self
    }

    /// Returns the SMTP configuration.
    #[must_use]
    pub const fn smtp_config(&self) -> &Config {
        &self.smtp
    }

    /// Composes `message` and delivers it.
    ///
    /// See [`send_mail`].
    ///
    /// # Errors
    ///
    /// Returns an error if the message is invalid, composing fails or
    /// delivery fails.
    pub async fn send(&self, message: &mut Message) -> Result<Reply> {
        deliver(&self.compose, &self.smtp, self.credentials.as_ref(), message).await
    }
}

/// Composes `message` with the default configuration and delivers it.
///
/// The envelope sender is the bare From address. Every bare To, Cc and
/// Bcc address receives its own `RCPT TO`; Bcc addresses never appear in
/// the composed headers. Attachment data sources are consumed, and are read
/// on the calling task.
///
/// Returns the server's reply accepting the message.
///
/// # Errors
///
/// Returns [`crate::Error::Mime`] for validation and composition errors,
/// raised before any connection is made, and [`crate::Error::Smtp`] if
/// delivery fails.
pub async fn send_mail(
    config: &Config,
    credentials: Option<&Credentials>,
    message: &mut Message,
) -> Result<Reply> {
    deliver(&ComposeConfig::default(), config, credentials, message).await
}

async fn deliver(
    compose: &ComposeConfig,
    smtp: &Config,
    credentials: Option<&Credentials>,
    message: &mut Message,
) -> Result<Reply> {
    let delivery = message.delivery()?;
    let bytes = Composer::new(compose.clone()).compose(message)?;
    info!(
        sender = %delivery.sender,
        recipients = delivery.recipients.len(),
        bytes = bytes.len(),
        "Message composed for delivery"
    );

    let reply = mailcompose_smtp::send(
        smtp,
        credentials,
        &delivery.sender,
        delivery.recipients.as_slice(),
        &bytes,
    )
    .await?;
    Ok(reply)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailcompose_smtp::Security;

    #[test]
    fn test_mailer_builder() {
        let smtp = Config::builder("smtp.example.com")
            .security(Security::Implicit)
            .build();
        let mailer = Mailer::new(smtp.clone())
            .credentials(Credentials::new("user", "pass"))
            .compose_config(ComposeConfig::builder().charset("iso-8859-1").build());

        assert_eq!(mailer.smtp_config(), &smtp);
        assert!(mailer.credentials.is_some());
        assert_eq!(mailer.compose.charset, "iso-8859-1");
    }

    #[tokio::test]
    async fn test_invalid_message_fails_before_connecting() {
        let config = Config::builder("127.0.0.1").port(1).build();
        let mut message = Message::new().from("s@d.com").text_body("Hi");

        let err = send_mail(&config, None, &mut message).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Mime(mailcompose_mime::Error::MissingRecipient)
        ));
    }
}
