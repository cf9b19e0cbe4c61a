//! Batch command - extract records from many filings in parallel.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::{stream, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use filings_core::{DocumentKind, ExtractionOutcome, RecordSet};

use super::extract::{apply_overrides, extract_file, TextMode};
use super::load_config;
use super::output::{format_records, OutputFormat};

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

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Where PDF text comes from
    #[arg(long, value_enum)]
    text_mode: Option<TextMode>,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    records: Option<RecordSet>,
    error: Option<String>,
    diagnostics: usize,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args.model_dir.clone(), args.text_mode);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| DocumentKind::from_path(p).is_some())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!("{} Found {} files to process", style("ℹ").blue(), files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Each document gets its own extractor on a blocking thread; results
    // come back in input order.
    let mut pending = stream::iter(files.into_iter().map(|path| {
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            let file_start = Instant::now();
            let (outcome, diagnostics) = extract_file(path.clone(), config);
            let processing_time_ms = file_start.elapsed().as_millis() as u64;
            (path, outcome, diagnostics.len(), processing_time_ms)
        })
    }))
    .buffered(args.jobs.max(1));

    let mut results = Vec::new();
    while let Some(joined) = pending.next().await {
        let (path, outcome, diagnostics, processing_time_ms) = joined?;
        overall_pb.inc(1);

        let (records, error) = match outcome {
            Ok(ExtractionOutcome::Extracted(records)) => (Some(records), None),
            Ok(ExtractionOutcome::Unsupported { extension }) => {
                (None, Some(format!("unsupported file type '{}'", extension)))
            }
            Err(e) => {
                let error_msg = e.to_string();
                if !args.continue_on_error {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    overall_pb.abandon();
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
                warn!("Failed to process {}: {}", path.display(), error_msg);
                (None, Some(error_msg))
            }
        };

        results.push(FileResult {
            path,
            records,
            error,
            diagnostics,
            processing_time_ms,
        });
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.records.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            let Some(records) = &result.records else {
                continue;
            };
            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("filing");
            let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            fs::write(&output_path, format_records(records, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!("{} Summary written to {}", style("✓").green(), summary_path.display());
    }

    let contributions: usize = successful
        .iter()
        .filter_map(|r| r.records.as_ref())
        .map(|r| r.contributions.len())
        .sum();
    let expenditures: usize = successful
        .iter()
        .filter_map(|r| r.records.as_ref())
        .map(|r| r.expenditures.len())
        .sum();

    println!();
    println!(
        "{} Processed {} files in {:?}: {} contributions, {} expenditures",
        style("✓").green(),
        results.len(),
        start.elapsed(),
        contributions,
        expenditures
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

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "contributions",
        "expenditures",
        "diagnostics",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        match &result.records {
            Some(records) => wtr.write_record([
                filename,
                "success",
                &records.contributions.len().to_string(),
                &records.expenditures.len().to_string(),
                &result.diagnostics.to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?,
            None => wtr.write_record([
                filename,
                "error",
                "",
                "",
                &result.diagnostics.to_string(),
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
