//! Extract command - read the nameplate in a single image.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::{Alignment, measure_text_width, pad_str, style};
use tracing::{debug, info};

use kata_core::{ExtractionRecord, KataError};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input image (JPEG or PNG)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Gemini model to use instead of the configured one
    #[arg(short, long)]
    model: Option<String>,

    /// Print the model's answer as-is, without parsing it
    #[arg(long)]
    raw: bool,

    /// Report fields the model did not return
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Two-column table
    Table,
    /// JSON output
    Json,
    /// CSV output
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Table => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if let Some(model) = &args.model {
        config.model.name = model.clone();
        config.validate().map_err(KataError::from)?;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !super::is_supported_image(&args.input) {
        anyhow::bail!(
            "Unsupported file format: {} (expected .jpg, .jpeg or .png)",
            args.input.display()
        );
    }

    let extractor = super::build_extractor(&config)?;

    info!("Processing file: {}", args.input.display());
    let bytes = fs::read(&args.input)?;

    let pb = super::spinner("解析中...");

    if args.raw {
        let raw = extractor.extract_raw(&bytes).await;
        pb.finish_and_clear();
        let raw = raw.map_err(super::report)?;
        write_output(args.output.as_deref(), raw.as_str())?;
        return Ok(());
    }

    let result = extractor.extract_from_image(&bytes).await;
    pb.finish_and_clear();
    let result = result.map_err(super::report)?;

    if args.validate && !result.warnings.is_empty() {
        eprintln!("{}", style("Validation issues:").yellow());
        for warning in &result.warnings {
            eprintln!("  - {}", warning);
        }
    }

    let output = format_record(&result.record, args.format)?;
    write_output(args.output.as_deref(), &output)?;

    debug!(
        "Model round trip {}ms, total {:?}",
        result.processing_time_ms,
        start.elapsed()
    );

    Ok(())
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content)?;
            println!(
                "{} Output written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", content.trim_end()),
    }
    Ok(())
}

pub fn format_record(record: &ExtractionRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Table => Ok(format_table(record)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record),
    }
}

fn format_table(record: &ExtractionRecord) -> String {
    let width = ExtractionRecord::LABELS
        .iter()
        .map(|label| measure_text_width(label))
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    for (label, value) in record.columns() {
        output.push_str(&format!(
            "{}  {}\n",
            pad_str(label, width, Alignment::Left, None),
            value.unwrap_or("-")
        ));
    }
    output
}

fn format_csv(record: &ExtractionRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(ExtractionRecord::FIELD_NAMES)?;
    wtr.write_record(record.values().map(|value| value.unwrap_or_default()))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}
