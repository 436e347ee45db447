//! One-shot delivery of a composed message.

use crate::command::data_payload;
use crate::config::{Config, Credentials, Security};
use crate::connection::{Client, SmtpConnection, connect};
use crate::error::{Error, Result};
use crate::types::{Address, Reply};
use tracing::{debug, info, warn};

/// Delivers `message` to `recipients` through the server in `config`.
///
/// The session runs greeting, EHLO, STARTTLS when configured and offered,
/// AUTH when credentials are given and the server advertises AUTH, then
/// MAIL FROM, one RCPT TO per recipient, DATA and QUIT. Addresses must be
/// bare (`user@example.com`).
///
/// Credentials are never sent over an unencrypted connection unless
/// `config.security` is [`Security::None`].
///
/// Returns the server's reply accepting the message.
///
/// # Errors
///
/// Returns an error if an address is invalid, the message exceeds the
/// advertised SIZE limit, a command is rejected, or the connection fails
/// or times out. A failing QUIT after the message was accepted is only
/// logged.
pub async fn send<S: AsRef<str>>(
    config: &Config,
    credentials: Option<&Credentials>,
    sender: &str,
    recipients: &[S],
    message: &[u8],
) -> Result<Reply> {
    let from = Address::new(sender)?;
    let to = recipients
        .iter()
        .map(|recipient| Address::new(recipient.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let Some((first, rest)) = to.split_first() else {
        return Err(Error::InvalidAddress(
            "At least one recipient is required".into(),
        ));
    };
    let payload = data_payload(message);

    info!(
        host = %config.host,
        port = config.port,
        recipients = to.len(),
        bytes = payload.len(),
        "Delivering message"
    );

    let stream = connect(config).await?;
    let mut client = Client::from_stream(stream, config.io_timeout)
        .await?
        .ehlo(&config.client_hostname)
        .await?;

    if config.security == Security::StartTls {
        if client.server_info().supports_starttls() {
            client = client
                .starttls(&config.host, &config.client_hostname)
                .await?;
        } else {
            warn!(host = %config.host, "Server does not offer STARTTLS, continuing without TLS");
        }
    }

    let info = client.server_info();
    if let Some(limit) = info.max_message_size() {
        if payload.len() > limit {
            return Err(Error::MessageTooLarge {
                size: payload.len(),
                limit,
            });
        }
    }
    let size = info.supports_size().then_some(payload.len());

    let transaction = match credentials {
        Some(credentials) if client.server_info().supports_auth() => {
            if !client.is_encrypted() && config.security != Security::None {
                return Err(Error::NotSupported(
                    "STARTTLS, required before sending credentials".into(),
                ));
            }
            client
                .authenticate(credentials)
                .await?
                .mail_from(from, size)
                .await?
        }
        Some(_) => {
            debug!("Server does not advertise AUTH, sending unauthenticated");
            client.mail_from(from, size).await?
        }
        None => client.mail_from(from, size).await?,
    };

    let mut transaction = transaction.rcpt_to(first.clone()).await?;
    for recipient in rest {
        transaction = transaction.rcpt_to(recipient.clone()).await?;
    }

    let (client, accepted) = transaction.data().await?.send_payload(&payload).await?;
    info!(reply = %accepted.message_text(), "Message accepted");

    if let Err(error) = client.quit().await {
        warn!(%error, "QUIT failed after message was accepted");
    }

    Ok(accepted)
}
