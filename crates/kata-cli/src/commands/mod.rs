//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod extract;

use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use kata_core::{GeminiClient, KataConfig, KataError, NameplateExtractor};

/// Load the config file given on the command line, else the default one.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<KataConfig> {
    let config = match config_path {
        Some(path) => KataConfig::from_file(Path::new(path))?,
        None => {
            let default_path = config::default_config_path();
            if default_path.exists() {
                debug!("Using configuration from {}", default_path.display());
                KataConfig::from_file(&default_path)?
            } else {
                KataConfig::default()
            }
        }
    };

    config.validate().map_err(KataError::from)?;
    Ok(config)
}

/// Build the extraction pipeline. Fails before any request when no API key is set.
pub fn build_extractor(config: &KataConfig) -> anyhow::Result<NameplateExtractor<GeminiClient>> {
    let client = GeminiClient::from_config(&config.model).map_err(KataError::from)?;
    Ok(NameplateExtractor::new(client).with_image_config(config.image.clone()))
}

/// Whether the file extension is one the model accepts.
pub fn is_supported_image(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    matches!(extension.as_str(), "jpg" | "jpeg" | "png")
}

/// Print the model text attached to a parse failure, if any.
pub fn print_model_response(err: &KataError) {
    if let Some(raw) = err.raw_text() {
        eprintln!("{}", style("Model response:").yellow());
        eprintln!("{}", raw);
    }
}

/// Print the model text of a parse failure, then hand the error back.
pub fn report(err: KataError) -> anyhow::Error {
    print_model_response(&err);
    anyhow::Error::new(err)
}

pub fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb.set_message(message);
    pb
}
