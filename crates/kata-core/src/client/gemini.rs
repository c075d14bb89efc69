//! Gemini `generateContent` client.

use std::time::Instant;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::models::config::ModelConfig;

use super::{ApiKey, ExtractionRequest, ModelBackend, RawModelResponse};

const API_KEY_HEADER: &str = "x-goog-api-key";
const MAX_ERROR_BODY: usize = 300;

/// Client for the Gemini Generative Language API.
///
/// Holds only immutable settings; one instance can serve concurrent
/// requests.
pub struct GeminiClient {
    http: Client,
    api_key: ApiKey,
    config: ModelConfig,
}

impl GeminiClient {
    /// Create a client. Fails without a credential; nothing is sent.
    pub fn new(config: ModelConfig, api_key: Option<ApiKey>) -> Result<Self, ClientError> {
        let api_key = api_key
            .ok_or_else(|| ClientError::MissingCredential(config.api_key_env.clone()))?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            config,
        })
    }

    /// Create a client with the key read from `config.api_key_env`.
    pub fn from_config(config: &ModelConfig) -> Result<Self, ClientError> {
        let api_key = ApiKey::from_env(&config.api_key_env);
        Self::new(config.clone(), api_key)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.name
        )
    }

    async fn send_once(&self, body: &GenerateContentRequest<'_>) -> Result<RawModelResponse, ClientError> {
        let response = self
            .http
            .post(self.url())
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ClientError::RemoteFailure {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| ClientError::Transport(format!("undecodable response: {}", e)))?;

        parsed.into_text()
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.config.timeout())
        } else {
            ClientError::Transport(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn generate(&self, request: &ExtractionRequest) -> Result<RawModelResponse, ClientError> {
        let body = GenerateContentRequest::new(request, self.config.temperature);
        let start = Instant::now();

        debug!(
            model = %self.config.name,
            image_bytes = request.image().len(),
            "Sending request to Gemini"
        );

        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!("Gemini request failed ({}), retry {}", err, attempt);
                    tokio::time::sleep(self.config.retry_backoff()).await;
                }
                result => {
                    debug!(
                        "Gemini answered in {}ms after {} attempt(s)",
                        start.elapsed().as_millis(),
                        attempt + 1
                    );
                    return result;
                }
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(request: &'a ExtractionRequest, temperature: f32) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: request.prompt(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.mime_type(),
                            data: BASE64_STANDARD.encode(request.image()),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig { temperature },
        }
    }
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Result<RawModelResponse, ClientError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let candidate = self.candidates.into_iter().next();

        let finish_reason = candidate
            .as_ref()
            .and_then(|c| c.finish_reason.clone())
            .filter(|reason| reason != "STOP");

        let text: String = candidate
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ClientError::EmptyResponse {
                reason: block_reason.or(finish_reason),
            });
        }

        Ok(RawModelResponse::new(text))
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Human-readable message from an API error body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{} ({})", envelope.error.message, status),
            None => envelope.error.message,
        },
        Err(_) => {
            let body = body.trim();
            if body.is_empty() {
                "empty error body".to_string()
            } else {
                body.chars().take(MAX_ERROR_BODY).collect()
            }
        }
    }
}
