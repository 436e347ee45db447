//! # mailcompose-mime
//!
//! Streaming composition of multipart MIME email messages.
//!
//! ## Features
//!
//! - **Composition**: `multipart/mixed` messages with an optional
//!   `multipart/alternative` body (text and HTML) and any number of
//!   attachments
//! - **Streaming encoders**: base64 with line framing and quoted-printable,
//!   fed in arbitrary chunks
//! - **Headers**: RFC 2047 encoded-word subjects and display names, folded
//!   address lists, header injection protection
//! - **Attachments**: content type inference from the file extension and
//!   RFC 2231 file names
//!
//! ## Quick Start
//!
//! ```
//! use mailcompose_mime::{Attachment, Message};
//!
//! let mut message = Message::new()
//!     .from("Sender <sender@example.com>")
//!     .to("recipient@example.com")
//!     .subject("Quarterly report")
//!     .text_body("See attached.")
//!     .attach(Attachment::from_bytes("report.csv", b"a,b\n1,2\n".to_vec()));
//!
//! let bytes = message.to_bytes()?;
//! assert!(bytes.starts_with(b"From: Sender <sender@example.com>\r\n"));
//! # Ok::<(), mailcompose_mime::Error>(())
//! ```
//!
//! ### Custom Line Framing
//!
//! ```
//! use mailcompose_mime::encoding::{Base64Encoder, Stage};
//! use mailcompose_mime::LineConfig;
//! use std::io::Write;
//!
//! let mut encoder = Base64Encoder::new(Vec::new(), LineConfig::new(8, "\n"));
//! encoder.write_all(b"Hello ")?;
//! encoder.write_all(b"World!")?;
//! assert_eq!(encoder.finish()?, b"SGVsbG8g\nV29ybGQh");
//! # Ok::<(), std::io::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod compose;
mod config;
mod content_type;
mod error;
mod header;
mod message;
mod multipart;

pub mod encoding;

pub use address::{Mailbox, encode_address_list};
pub use compose::Composer;
pub use config::{
    ComposeConfig, ComposeConfigBuilder, DEFAULT_LINE_LENGTH, LineConfig, MultiValuePolicy,
    TransferEncoding,
};
pub use content_type::{ContentType, OCTET_STREAM, attachment_disposition};
pub use error::{Error, Result};
pub use header::{Headers, sanitize_value, validate_name};
pub use message::{Attachment, Delivery, Message};
pub use multipart::{BoundarySource, Envelope, MAX_BOUNDARY_LENGTH, RandomBoundary};
