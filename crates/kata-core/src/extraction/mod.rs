//! Nameplate extraction pipeline.

mod mapper;
mod normalizer;
pub mod patterns;
pub mod prompt;

pub use mapper::to_record;
pub use normalizer::{normalize, parse_structured, strip_fences};

use std::time::Instant;

use tracing::{debug, warn};

use crate::client::{ModelBackend, RawModelResponse};
use crate::error::Result;
use crate::imaging;
use crate::models::config::ImageConfig;
use crate::models::record::ExtractionRecord;

/// Result of extracting one nameplate.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted nameplate fields.
    pub record: ExtractionRecord,
    /// Text returned by the model.
    pub raw_text: String,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Runs one image through re-encoding, the model and normalization.
pub struct NameplateExtractor<B> {
    backend: B,
    image: ImageConfig,
}

impl<B: ModelBackend> NameplateExtractor<B> {
    /// Create an extractor with default image settings.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            image: ImageConfig::default(),
        }
    }

    /// Set image re-encoding options.
    pub fn with_image_config(mut self, image: ImageConfig) -> Self {
        self.image = image;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Send the image to the model and return its text untouched.
    pub async fn extract_raw(&self, image_bytes: &[u8]) -> Result<RawModelResponse> {
        let jpeg = imaging::to_jpeg(image_bytes, &self.image)?;
        debug!(
            "Re-encoded upload to {} bytes of JPEG for {}",
            jpeg.len(),
            self.backend.name()
        );

        Ok(self.backend.extract(&jpeg).await?)
    }

    /// Extract nameplate fields from an uploaded JPEG or PNG image.
    pub async fn extract_from_image(&self, image_bytes: &[u8]) -> Result<ExtractionResult> {
        let start = Instant::now();

        let raw = self.extract_raw(image_bytes).await?;
        let record = normalize(&raw)?;

        let warnings: Vec<String> = record
            .missing_fields()
            .into_iter()
            .map(|field| format!("{} was not reported", field))
            .collect();
        if record.is_empty() {
            warn!("Model response contained none of the nameplate fields");
        }

        Ok(ExtractionResult {
            record,
            raw_text: raw.into_inner(),
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
