//! Configuration structures for the extraction pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Main configuration for the kata pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KataConfig {
    /// Remote model configuration.
    pub model: ModelConfig,

    /// Image re-encoding configuration.
    pub image: ImageConfig,
}

/// Remote model configuration.
///
/// The API key itself is never stored here; only the name of the
/// environment variable it is read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Gemini model name.
    pub name: String,

    /// Base URL of the Generative Language API.
    pub endpoint: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Extra attempts on transient failures.
    pub max_retries: u32,

    /// Pause between attempts in milliseconds.
    pub retry_backoff_ms: u64,

    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 60,
            max_retries: 1,
            retry_backoff_ms: 500,
            temperature: 0.0,
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Image re-encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Maximum image dimension (longer side) sent to the model.
    pub max_dimension: u32,

    /// JPEG quality (1 - 100).
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_dimension: 2048,
            jpeg_quality: 90,
        }
    }
}

impl KataConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.name.trim().is_empty() {
            return Err(ConfigError::Invalid("model.name must not be empty".into()));
        }
        if self.model.api_key_env.trim().is_empty() {
            return Err(ConfigError::Invalid("model.api_key_env must not be empty".into()));
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::Invalid("model.timeout_secs must be positive".into()));
        }
        if !(1..=100).contains(&self.image.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "image.jpeg_quality must be within 1-100, got {}",
                self.image.jpeg_quality
            )));
        }
        if self.image.max_dimension == 0 {
            return Err(ConfigError::Invalid("image.max_dimension must be positive".into()));
        }
        Ok(())
    }
}
