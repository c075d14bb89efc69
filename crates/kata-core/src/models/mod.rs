//! Data models for nameplate extraction.

pub mod config;
pub mod record;

pub use config::{ImageConfig, KataConfig, ModelConfig};
pub use record::{ExtractionRecord, StructuredValue};
