//! Error types for the kata-core library.

use std::time::Duration;

use thiserror::Error;

/// Main error type for the kata library.
#[derive(Error, Debug)]
pub enum KataError {
    /// Configuration error. Fatal for the session.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model client error.
    #[error("model error: {0}")]
    Client(ClientError),

    /// Response parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Image input error.
    #[error("image error: {0}")]
    Image(#[from] ImageInputError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ClientError> for KataError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::MissingCredential(var) => {
                KataError::Config(ConfigError::MissingCredential(var))
            }
            other => KataError::Client(other),
        }
    }
}

impl KataError {
    /// Whether the error ends the session rather than a single request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, KataError::Config(_))
    }

    /// Raw model text attached to the error, if any.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            KataError::Parse(ParseError::Malformed { text, .. }) => Some(text),
            _ => None,
        }
    }
}

/// Errors related to configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No API key is available.
    #[error("no API key configured; set the {0} environment variable")]
    MissingCredential(String),

    /// A configuration value is out of range or unreadable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by the model client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No API key is available; no request was sent.
    #[error("no API key configured; set the {0} environment variable")]
    MissingCredential(String),

    /// The model answered without any text.
    #[error("the model returned no text{}", suffix(.reason))]
    EmptyResponse { reason: Option<String> },

    /// The service answered with a non-success status.
    #[error("remote service returned {status}: {message}")]
    RemoteFailure { status: u16, message: String },

    /// The request could not be sent or the reply could not be read.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Timeout(_) | ClientError::Transport(_) => true,
            ClientError::RemoteFailure { status, .. } => {
                matches!(status, 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

fn suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default()
}

/// Errors related to response normalization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing was left after trimming and fence stripping.
    #[error("the response is empty")]
    Empty,

    /// The response is not a JSON object.
    #[error("the response is not a JSON object: {reason}")]
    Malformed {
        /// The response text as received.
        text: String,
        /// Parser diagnostic.
        reason: String,
    },
}

/// Errors related to the uploaded image.
#[derive(Error, Debug)]
pub enum ImageInputError {
    /// The image is neither JPEG nor PNG.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Decoding or encoding failed.
    #[error("failed to process image: {0}")]
    Codec(#[from] image::ImageError),

    /// I/O error while reading image bytes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the kata library.
pub type Result<T> = std::result::Result<T, KataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_is_configuration_error() {
        let err = KataError::from(ClientError::MissingCredential("GEMINI_API_KEY".into()));
        assert!(matches!(err, KataError::Config(ConfigError::MissingCredential(_))));
        assert!(err.is_fatal());
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ClientError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(ClientError::RemoteFailure { status: 503, message: String::new() }.is_transient());
        assert!(!ClientError::RemoteFailure { status: 400, message: String::new() }.is_transient());
        assert!(!ClientError::EmptyResponse { reason: None }.is_transient());
    }

    #[test]
    fn test_empty_response_message() {
        let err = ClientError::EmptyResponse { reason: Some("SAFETY".into()) };
        assert_eq!(err.to_string(), "the model returned no text (SAFETY)");
        let err = ClientError::EmptyResponse { reason: None };
        assert_eq!(err.to_string(), "the model returned no text");
    }

    #[test]
    fn test_malformed_exposes_raw_text() {
        let err = KataError::from(ParseError::Malformed {
            text: "not json at all".into(),
            reason: "expected value".into(),
        });
        assert_eq!(err.raw_text(), Some("not json at all"));
        assert!(!err.is_fatal());
    }
}
