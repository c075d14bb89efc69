//! Core library for air-conditioner nameplate extraction.
//!
//! This crate provides:
//! - Image input handling (JPEG/PNG in, canonical JPEG out)
//! - A Gemini model client for multimodal extraction requests
//! - Response normalization (fence stripping, strict JSON parsing)
//! - Field mapping into the fixed seven-column nameplate record

pub mod client;
pub mod error;
pub mod extraction;
pub mod imaging;
pub mod models;

pub use client::{ApiKey, ExtractionRequest, GeminiClient, ModelBackend, RawModelResponse};
pub use error::{ClientError, ConfigError, ImageInputError, KataError, ParseError, Result};
pub use extraction::{ExtractionResult, NameplateExtractor, normalize, parse_structured, to_record};
pub use models::config::KataConfig;
pub use models::record::{ExtractionRecord, StructuredValue};
