//! Error types for composing and sending.

use thiserror::Error;

/// Errors that can occur while composing or delivering a message.
#[derive(Debug, Error)]
pub enum Error {
    /// The message could not be composed.
    #[error("Compose error: {0}")]
    Mime(#[from] mailcompose_mime::Error),

    /// Delivery failed.
    #[error("SMTP error: {0}")]
    Smtp(#[from] mailcompose_smtp::Error),
}

impl Error {
    /// Returns true if the message itself is invalid and retrying cannot help.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        match self {
            Self::Mime(err) => err.is_validation(),
            Self::Smtp(mailcompose_smtp::Error::InvalidAddress(_)) => true,
            Self::Smtp(_) => false,
        }
    }

    /// Returns true if delivery may succeed when attempted again later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Mime(_) => false,
            Self::Smtp(err) => err.is_transient(),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors() {
        let err = Error::from(mailcompose_mime::Error::MissingRecipient);
        assert!(err.is_validation());
        assert!(!err.is_transient());

        let err = Error::from(mailcompose_smtp::Error::InvalidAddress("x".into()));
        assert!(err.is_validation());
    }

    #[test]
    fn test_transient_smtp_error() {
        let err = Error::from(mailcompose_smtp::Error::smtp_error(421, "Try later"));
        assert!(err.is_transient());
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "SMTP error: SMTP error 421: Try later");
    }
}
