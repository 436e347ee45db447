//! Type-state SMTP client.

use super::{ServerInfo, SmtpStream, with_timeout};
use crate::command::Command;
use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, trace};

/// Longest reply accepted, in lines.
const MAX_REPLY_LINES: usize = 256;

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// States in which a mail transaction may be started.
pub trait Ready {}

impl Ready for Connected {}
impl Ready for Authenticated {}

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    io_timeout: Duration,
    _state: PhantomData<State>,
}

/// Connection trait for all states.
pub trait SmtpConnection {
    /// Returns the server information.
    fn server_info(&self) -> &ServerInfo;

    /// Returns true once the session is encrypted.
    fn is_encrypted(&self) -> bool;
}

impl<S> SmtpConnection for Client<S> {
    fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    fn is_encrypted(&self) -> bool {
        self.stream.is_tls()
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server returns an error.
    pub async fn from_stream(mut stream: SmtpStream, io_timeout: Duration) -> Result<Self> {
        let greeting = with_timeout(io_timeout, "greeting", read_reply(&mut stream))
            .await?
            .success()?;

        let hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        debug!(server = %hostname, "Connected");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                extensions: HashSet::new(),
            },
            io_timeout,
            _state: PhantomData,
        })
    }

    /// Sends EHLO and discovers server capabilities.
    ///
    /// Falls back to HELO, with no extensions, if the server rejects EHLO
    /// as unrecognized.
    ///
    /// # Errors
    ///
    /// Returns an error if both greetings fail.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let reply = self
            .send_command(Command::Ehlo {
                hostname: client_hostname.to_string(),
            })
            .await?;

        if reply.code.is_permanent() {
            debug!(code = %reply.code, "EHLO rejected, falling back to HELO");
            self.send_command(Command::Helo {
                hostname: client_hostname.to_string(),
            })
            .await?
            .success()?;
            self.server_info.extensions.clear();
            return Ok(self);
        }

        let reply = reply.success()?;
        self.server_info.extensions = parse_extensions(&reply);
        Ok(self)
    }

    /// Upgrades the connection to TLS using STARTTLS and greets again.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not supported or if the upgrade fails.
    pub async fn starttls(mut self, server_host: &str, client_hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        self.send_command(Command::StartTls)
            .await?
            .require(ReplyCode::SERVICE_READY)?;

        let io_timeout = self.io_timeout;
        self.stream = with_timeout(
            io_timeout,
            "TLS handshake",
            self.stream.upgrade_to_tls(server_host),
        )
        .await?;
        debug!(server = server_host, "STARTTLS negotiated");

        // Capabilities must be discarded and queried again over TLS.
        self.server_info.extensions.clear();
        self.ehlo(client_hostname).await
    }

    /// Authenticates with PLAIN, or LOGIN if PLAIN is not offered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if neither mechanism is advertised,
    /// or the server's error if authentication fails.
    pub async fn authenticate(mut self, credentials: &Credentials) -> Result<Client<Authenticated>> {
        let mechanisms = self.server_info.auth_mechanisms();

        if mechanisms.contains(&AuthMechanism::Plain) {
            let token = format!("\0{}\0{}", credentials.username, credentials.password);
            self.send_command(Command::Auth {
                mechanism: AuthMechanism::Plain,
                initial_response: Some(STANDARD.encode(token.as_bytes())),
            })
            .await?
            .success()?;
        } else if mechanisms.contains(&AuthMechanism::Login) {
            self.send_command(Command::Auth {
                mechanism: AuthMechanism::Login,
                initial_response: None,
            })
            .await?
            .require(ReplyCode::AUTH_CONTINUE)?;
            self.send_command(Command::AuthResponse(
                STANDARD.encode(credentials.username.as_bytes()),
            ))
            .await?
            .require(ReplyCode::AUTH_CONTINUE)?;
            self.send_command(Command::AuthResponse(
                STANDARD.encode(credentials.password.as_bytes()),
            ))
            .await?
            .success()?;
        } else {
            return Err(Error::NotSupported("AUTH PLAIN or LOGIN".into()));
        }

        debug!(username = %credentials.username, "Authenticated");
        Ok(self.transition())
    }
}

impl<S: Ready> Client<S> {
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(
        mut self,
        from: Address,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction>> {
        self.send_command(Command::MailFrom { from, size })
            .await?
            .success()?;
        Ok(self.transition())
    }
}

impl Client<MailTransaction> {
    /// Adds the first recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded>> {
        self.send_command(Command::RcptTo { to }).await?.success()?;
        Ok(self.transition())
    }
}

impl Client<RecipientAdded> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Self> {
        self.send_command(Command::RcptTo { to }).await?.success()?;
        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command fails.
    pub async fn data(mut self) -> Result<Client<Data>> {
        self.send_command(Command::Data)
            .await?
            .require(ReplyCode::START_DATA)?;
        Ok(self.transition())
    }
}

impl Client<Data> {
    /// Sends a payload prepared by [`crate::command::data_payload`] and
    /// completes the transaction.
    ///
    /// Returns the server's acceptance reply, which often carries a queue id.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the message fails or server rejects it.
    pub async fn send_payload(mut self, payload: &[u8]) -> Result<(Client<Connected>, Reply)> {
        let io_timeout = self.io_timeout;
        with_timeout(io_timeout, "message data", self.stream.write_all(payload)).await?;
        trace!(bytes = payload.len(), "Message data sent");

        let reply = with_timeout(io_timeout, "data reply", read_reply(&mut self.stream))
            .await?
            .success()?;
        Ok((self.transition(), reply))
    }
}

// Common implementation for all states
impl<S> Client<S> {
    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        trace!(command = %cmd.redacted(), "C:");
        let data = cmd.serialize();
        let io_timeout = self.io_timeout;
        with_timeout(io_timeout, "command", self.stream.write_all(&data)).await?;
        let reply = with_timeout(io_timeout, "reply", read_reply(&mut self.stream)).await?;
        trace!(code = %reply.code, "S:");
        Ok(reply)
    }

    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            io_timeout: self.io_timeout,
            _state: PhantomData,
        }
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        self.send_command(Command::Quit).await?.success()?;
        debug!("Session closed");
        Ok(())
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }

        let is_last = is_last_reply_line(&line);
        lines.push(line);

        if is_last {
            break;
        }
        if lines.len() >= MAX_REPLY_LINES {
            return Err(Error::Protocol("Reply has too many lines".into()));
        }
    }

    parse_reply(&lines)
}

/// Extensions from an EHLO reply; the first line is the greeting.
fn parse_extensions(reply: &Reply) -> HashSet<Extension> {
    reply
        .message
        .iter()
        .skip(1)
        .map(|line| Extension::parse(line))
        .collect()
}
