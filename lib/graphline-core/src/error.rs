//! Error types for graphline.
//!
//! Non-2xx responses are not errors here: they come back as ordinary
//! [`Response`](crate::Response) values and the caller decides what they mean.

use derive_more::{Display, Error, From};

// ============================================================================
// Transport Error
// ============================================================================

/// Failure reported by the network layer.
///
/// The dispatcher never retries or reinterprets these; they reach the caller
/// exactly as the adapter produced them.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TransportError {
    /// Connection refused, reset, or otherwise not established.
    #[display("connection error: {_0}")]
    Connection(#[error(not(source))] String),

    /// Host name could not be resolved.
    #[display("DNS error: {_0}")]
    Dns(#[error(not(source))] String),

    /// TLS handshake or certificate failure.
    #[display("TLS error: {_0}")]
    Tls(#[error(not(source))] String),

    /// The request did not complete in time.
    #[display("request timeout")]
    Timeout,
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for graphline operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// An upload's backing source cannot produce bytes.
    #[display("invalid upload source '{origin}': {reason}")]
    #[from(skip)]
    InvalidUploadSource {
        /// Where the upload was supposed to come from (path, URL, ...).
        origin: String,
        /// Why it could not be used.
        reason: String,
    },

    /// A parameter could not be serialized for the wire.
    #[display("encoding error: {_0}")]
    #[from(skip)]
    Encoding(#[error(not(source))] String),

    /// The network layer failed.
    #[display("{_0}")]
    #[from]
    Transport(TransportError),

    /// Invalid request construction.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// Invalid configuration value.
    #[display("invalid configuration: {_0}")]
    #[from(skip)]
    Config(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "data.0.id").
        path: String,
        /// Error message.
        message: String,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid upload source error.
    #[must_use]
    pub fn invalid_upload_source(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUploadSource {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    /// Create an encoding error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Transport(TransportError::Connection(message.into()))
    }

    /// Create a DNS resolution error.
    #[must_use]
    pub fn dns(message: impl Into<String>) -> Self {
        Self::Transport(TransportError::Dns(message.into()))
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Transport(TransportError::Tls(message.into()))
    }

    /// Create a timeout error.
    #[must_use]
    pub const fn timeout() -> Self {
        Self::Transport(TransportError::Timeout)
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The transport failure, if this is one.
    #[must_use]
    pub const fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` if the network layer failed.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Timeout))
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Connection(_)))
    }

    /// Returns `true` if a parameter could not be serialized.
    #[must_use]
    pub const fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding(_) | Self::JsonSerialization(_))
    }

    /// Returns `true` if an upload source was unusable.
    #[must_use]
    pub const fn is_invalid_upload_source(&self) -> bool {
        matches!(self, Self::InvalidUploadSource { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::invalid_upload_source("/tmp/missing.png", "No such file or directory");
        assert_eq!(
            err.to_string(),
            "invalid upload source '/tmp/missing.png': No such file or directory"
        );

        let err = Error::encoding("stream closed");
        assert_eq!(err.to_string(), "encoding error: stream closed");

        let err = Error::timeout();
        assert_eq!(err.to_string(), "request timeout");

        let err = Error::connection("connection refused");
        assert_eq!(err.to_string(), "connection error: connection refused");

        let err = Error::json_deserialization("data.0.id", "invalid type");
        assert_eq!(
            err.to_string(),
            "JSON deserialization error at 'data.0.id': invalid type"
        );
    }

    #[test]
    fn transport_error_passes_through() {
        let err = Error::from(TransportError::Dns("no such host".to_string()));
        assert!(err.is_transport());
        assert_eq!(
            err.transport(),
            Some(&TransportError::Dns("no such host".to_string()))
        );
        assert_eq!(err.to_string(), "DNS error: no such host");
    }

    #[test]
    fn error_predicates() {
        assert!(Error::timeout().is_timeout());
        assert!(Error::timeout().is_transport());
        assert!(!Error::encoding("x").is_transport());

        assert!(Error::connection("refused").is_connection());
        assert!(!Error::tls("bad cert").is_connection());

        assert!(Error::encoding("x").is_encoding());
        assert!(!Error::timeout().is_encoding());

        assert!(Error::invalid_upload_source("a", "b").is_invalid_upload_source());
        assert!(Error::invalid_request("x").transport().is_none());
    }
}
