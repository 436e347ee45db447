//! # mailcompose-smtp
//!
//! Async SMTP delivery (RFC 5321) for messages composed by
//! `mailcompose-mime`.
//!
//! ## Features
//!
//! - **Type-state connection management**: Compile-time enforcement of valid
//!   SMTP state transitions
//! - **TLS support**: Implicit TLS (port 465) and opportunistic STARTTLS
//! - **Authentication**: PLAIN, with LOGIN as fallback
//! - **Timeouts**: Separate connect and per-operation I/O deadlines
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailcompose_smtp::{Config, Credentials, send};
//!
//! # async fn run() -> mailcompose_smtp::Result<()> {
//! let config = Config::builder("smtp.example.com")
//!     .client_hostname("client.example.com")
//!     .build();
//! let credentials = Credentials::new("user@example.com", "password");
//!
//! let message = b"Subject: Test\r\n\r\nHello, World!\r\n";
//! send(
//!     &config,
//!     Some(&credentials),
//!     "user@example.com",
//!     &["recipient@example.com"],
//!     message,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌──────────────┐
//! │  Connected   │ ─── authenticate() ───→ Authenticated
//! └──────────────┘                               │
//!        │                                        │
//!        └─── mail_from() ───→ MailTransaction ←──┘
//!                                   │
//!                          rcpt_to() → RecipientAdded ─── data() ───→ Data
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
mod config;
pub mod connection;
mod error;
pub mod parser;
mod session;
pub mod types;

pub use config::{
    Config, ConfigBuilder, Credentials, DEFAULT_CONNECT_TIMEOUT, DEFAULT_IO_TIMEOUT, Security,
};
pub use connection::{
    Authenticated, Client, Connected, Data, MailTransaction, Ready, RecipientAdded, ServerInfo,
    SmtpConnection,
};
pub use error::{Error, Result};
pub use session::send;
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
