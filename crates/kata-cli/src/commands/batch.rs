//! Batch command - read the nameplates in several images, one after another.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use kata_core::{ExtractionRecord, GeminiClient, KataError, NameplateExtractor};

use super::extract::{OutputFormat, format_record};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    record: Option<ExtractionRecord>,
    error: Option<String>,
    raw_response: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| super::is_supported_image(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    // Fails here, once, when no API key is configured.
    let extractor = super::build_extractor(&config)?;

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        overall_pb.set_message(display_name(&path).to_string());

        let result = process_single_file(&path, &extractor).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(record) => {
                results.push(ProcessResult {
                    path,
                    record: Some(record),
                    error: None,
                    raw_response: None,
                    processing_time_ms,
                });
            }
            Err(e) if e.is_fatal() || !args.continue_on_error => {
                overall_pb.abandon();
                error!("Failed to process {}: {}", path.display(), e);
                return Err(super::report(e));
            }
            Err(e) => {
                warn!("Failed to process {}: {}", path.display(), e);
                overall_pb.suspend(|| super::print_model_response(&e));
                results.push(ProcessResult {
                    path,
                    record: None,
                    error: Some(e.to_string()),
                    raw_response: e.raw_text().map(str::to_string),
                    processing_time_ms,
                });
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.record.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    for result in &successful {
        if let Some(record) = &result.record {
            let content = format_record(record, args.format)?;
            match &args.output_dir {
                Some(output_dir) => {
                    let output_name = result
                        .path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("nameplate");
                    let output_path =
                        output_dir.join(format!("{}.{}", output_name, args.format.extension()));
                    fs::write(&output_path, content)?;
                    debug!("Wrote output to {}", output_path.display());
                }
                None => {
                    println!();
                    println!("{}", style(display_name(&result.path)).bold());
                    println!("{}", content.trim_end());
                }
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

async fn process_single_file(
    path: &Path,
    extractor: &NameplateExtractor<GeminiClient>,
) -> Result<ExtractionRecord, KataError> {
    let bytes = fs::read(path)?;
    let result = extractor.extract_from_image(&bytes).await?;

    debug!(
        "{}: {} of 7 fields in {}ms",
        path.display(),
        7 - result.record.missing_fields().len(),
        result.processing_time_ms
    );

    Ok(result.record)
}

fn display_name(path: &Path) -> &str {
    path.file_name().and_then(|s| s.to_str()).unwrap_or("")
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename", "status"];
    header.extend(ExtractionRecord::FIELD_NAMES);
    header.extend(["processing_time_ms", "error", "raw_response"]);
    wtr.write_record(&header)?;

    for result in results {
        let filename = display_name(&result.path).to_string();
        let time = result.processing_time_ms.to_string();

        let mut row = vec![filename];
        match &result.record {
            Some(record) => {
                row.push("success".to_string());
                row.extend(record.values().map(|v| v.unwrap_or_default().to_string()));
                row.push(time);
                row.push(String::new());
                row.push(String::new());
            }
            None => {
                row.push("error".to_string());
                row.extend(std::iter::repeat_n(String::new(), ExtractionRecord::FIELD_NAMES.len()));
                row.push(time);
                row.push(result.error.clone().unwrap_or_default());
                row.push(result.raw_response.clone().unwrap_or_default());
            }
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        let results = vec![
            ProcessResult {
                path: PathBuf::from("a.jpg"),
                record: Some(ExtractionRecord {
                    model_number: Some("ABC".into()),
                    ..ExtractionRecord::default()
                }),
                error: None,
                raw_response: None,
                processing_time_ms: 12,
            },
            ProcessResult {
                path: PathBuf::from("b.png"),
                record: None,
                error: Some("the response is empty".into()),
                raw_response: None,
                processing_time_ms: 3,
            },
            ProcessResult {
                path: PathBuf::from("c.jpg"),
                record: None,
                error: Some("not JSON".into()),
                raw_response: Some("型番は AY-L22DH です。".into()),
                processing_time_ms: 5,
            },
        ];

        write_summary(&path, &results).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("filename,status,model_number"));
        assert!(lines[0].ends_with("processing_time_ms,error,raw_response"));
        assert_eq!(lines[1], "a.jpg,success,ABC,,,,,,,12,,");
        assert_eq!(lines[2], "b.png,error,,,,,,,,3,the response is empty,");
        assert_eq!(lines[3], "c.jpg,error,,,,,,,,5,not JSON,型番は AY-L22DH です。");
    }
}
