//! # mailcompose
//!
//! Compose multipart MIME email and deliver it over SMTP.
//!
//! This crate ties together:
//! - [`mailcompose_mime`]: streaming message composition
//! - [`mailcompose_smtp`]: the async SMTP session
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailcompose::{Attachment, Config, Credentials, Mailer, Message};
//!
//! # async fn run() -> mailcompose::Result<()> {
//! let mailer = Mailer::new(Config::new("smtp.example.com"))
//!     .credentials(Credentials::new("sender@example.com", "password"));
//!
//! let mut message = Message::new()
//!     .from("Sender <sender@example.com>")
//!     .to("recipient@example.com")
//!     .bcc("archive@example.com")
//!     .subject("Quarterly report")
//!     .text_body("See attached.")
//!     .html_body("<p>See attached.</p>")
//!     .attach(Attachment::from_path("report.pdf")?);
//!
//! let reply = mailer.send(&mut message).await?;
//! println!("{}", reply.message_text());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod mailer;

pub use error::{Error, Result};
pub use mailer::{Mailer, send_mail};

pub use mailcompose_mime::{
    Attachment, ComposeConfig, ComposeConfigBuilder, Composer, Delivery, LineConfig, Message,
    MultiValuePolicy, TransferEncoding,
};
pub use mailcompose_smtp::{Config, ConfigBuilder, Credentials, Reply, Security};

pub use mailcompose_mime;
pub use mailcompose_smtp;
