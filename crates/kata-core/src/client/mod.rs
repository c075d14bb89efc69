//! Model client abstraction and request/response types.

mod gemini;

pub use gemini::GeminiClient;

use std::fmt;

use async_trait::async_trait;

use crate::error::ClientError;
use crate::extraction::prompt::{EXTRACTION_PROMPT, IMAGE_MIME_TYPE};

/// API key for the remote model. Never printed.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key. Blank keys count as missing.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let key = key.trim();
        if key.is_empty() {
            None
        } else {
            Some(Self(key.to_string()))
        }
    }

    /// Read a key from the named environment variable.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().and_then(Self::new)
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// One image plus the fixed extraction instruction.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    image: Vec<u8>,
}

impl ExtractionRequest {
    /// Build a request for JPEG image bytes.
    pub fn new(image: Vec<u8>) -> Self {
        Self { image }
    }

    pub fn prompt(&self) -> &'static str {
        EXTRACTION_PROMPT
    }

    pub fn mime_type(&self) -> &'static str {
        IMAGE_MIME_TYPE
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }
}

/// Unprocessed text returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelResponse(String);

impl RawModelResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for RawModelResponse {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl From<String> for RawModelResponse {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for RawModelResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A multimodal model able to answer an extraction request.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Send one request and return the model's text.
    async fn generate(&self, request: &ExtractionRequest) -> Result<RawModelResponse, ClientError>;

    /// Ask the model to read the nameplate in `image_bytes` (JPEG).
    async fn extract(&self, image_bytes: &[u8]) -> Result<RawModelResponse, ClientError> {
        let request = ExtractionRequest::new(image_bytes.to_vec());
        self.generate(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_is_missing() {
        assert!(ApiKey::new("").is_none());
        assert!(ApiKey::new("  \n").is_none());
        assert_eq!(ApiKey::new(" abc ").unwrap().expose(), "abc");
    }

    #[test]
    fn test_key_is_redacted() {
        let key = ApiKey::new("secret-value").unwrap();
        let printed = format!("{:?}", key);
        assert!(!printed.contains("secret-value"));
    }

    #[test]
    fn test_unset_env_var() {
        assert!(ApiKey::from_env("KATA_TEST_SURELY_UNSET_VARIABLE").is_none());
    }

    #[test]
    fn test_request_carries_prompt() {
        let request = ExtractionRequest::new(vec![0xFF, 0xD8]);
        assert_eq!(request.mime_type(), "image/jpeg");
        assert!(request.prompt().contains("型番"));
        assert_eq!(request.image(), &[0xFF, 0xD8]);
    }
}
