use std::fmt;
use thiserror::Error;

/// The error type for edgesign operations
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The designated credential header is absent or empty
    CredentialMissing,

    /// Credential is present but failed verification
    CredentialInvalid,

    /// Request body was truncated by the transport layer
    BodyTruncated,

    /// Request cannot be signed (missing required fields, etc.)
    RequestInvalid,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// Unexpected errors (encoding, formatting, etc.)
    Unexpected,
}

/// How an error affects the request that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// The request must be rejected and never reach the origin.
    Blocking,
    /// The request proceeds unmodified and the error is only reported.
    NonBlocking,
}

impl ErrorKind {
    /// Get the tier of this kind.
    pub fn tier(&self) -> Tier {
        match self {
            ErrorKind::CredentialMissing
            | ErrorKind::CredentialInvalid
            | ErrorKind::BodyTruncated => Tier::Blocking,
            ErrorKind::RequestInvalid | ErrorKind::ConfigInvalid | ErrorKind::Unexpected => {
                Tier::NonBlocking
            }
        }
    }
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error tier
    pub fn tier(&self) -> Tier {
        self.kind.tier()
    }

    /// Check if this error must block the request.
    pub fn is_blocking(&self) -> bool {
        self.tier() == Tier::Blocking
    }
}

// Convenience constructors
impl Error {
    /// Create a credential missing error
    pub fn credential_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialMissing, message)
    }

    /// Create a credential invalid error
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Create a body truncated error
    pub fn body_truncated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BodyTruncated, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::CredentialMissing => write!(f, "missing credential"),
            ErrorKind::CredentialInvalid => write!(f, "invalid credential"),
            ErrorKind::BodyTruncated => write!(f, "truncated body"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::method::InvalidMethod> for Error {
    fn from(err: http::method::InvalidMethod) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ErrorKind::CredentialMissing, Tier::Blocking)]
    #[test_case(ErrorKind::CredentialInvalid, Tier::Blocking)]
    #[test_case(ErrorKind::BodyTruncated, Tier::Blocking)]
    #[test_case(ErrorKind::RequestInvalid, Tier::NonBlocking)]
    #[test_case(ErrorKind::ConfigInvalid, Tier::NonBlocking)]
    #[test_case(ErrorKind::Unexpected, Tier::NonBlocking)]
    fn test_error_tier(kind: ErrorKind, tier: Tier) {
        let err = Error::new(kind, "boom");
        assert_eq!(err.tier(), tier);
        assert_eq!(err.is_blocking(), tier == Tier::Blocking);
    }

    #[test]
    fn test_error_display() {
        let err = Error::credential_missing("x-auth header not found");
        assert_eq!(err.to_string(), "missing credential: x-auth header not found");
    }
}
