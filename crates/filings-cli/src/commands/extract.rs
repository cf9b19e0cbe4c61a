//! Extract command - pull records out of a single filing.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use filings_core::models::config::{FilingsConfig, PdfTextMode};
use filings_core::{CollectingReporter, Diagnostic, ExtractionOutcome, Extractor, IngestError};

use super::load_config;
use super::output::{format_diagnostics, format_records, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (xlsx, xls, ods or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Where PDF text comes from
    #[arg(long, value_enum)]
    text_mode: Option<TextMode>,

    /// Print per-unit diagnostics even when records were found
    #[arg(long)]
    show_diagnostics: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum TextMode {
    /// Text layer when substantial, OCR otherwise
    Auto,
    /// Always OCR rendered pages
    Ocr,
    /// Only the embedded text layer
    Embedded,
}

impl From<TextMode> for PdfTextMode {
    fn from(mode: TextMode) -> Self {
        match mode {
            TextMode::Auto => PdfTextMode::Auto,
            TextMode::Ocr => PdfTextMode::Ocr,
            TextMode::Embedded => PdfTextMode::Embedded,
        }
    }
}

/// Apply command-line overrides shared by `extract` and `batch`.
pub fn apply_overrides(config: &mut FilingsConfig, model_dir: Option<PathBuf>, text_mode: Option<TextMode>) {
    if let Some(dir) = model_dir {
        config.ocr.model_dir = dir;
    }
    if let Some(mode) = text_mode {
        config.pdf.text_mode = mode.into();
    }
}

/// Run one document through a fresh extractor, collecting its diagnostics.
pub fn extract_file(
    path: PathBuf,
    config: FilingsConfig,
) -> (Result<ExtractionOutcome, IngestError>, Vec<Diagnostic>) {
    let extractor = Extractor::from_config(config);
    let reporter = CollectingReporter::new().with_tracing();
    let outcome = extractor.extract(&path, &reporter);
    (outcome, reporter.take())
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args.model_dir.clone(), args.text_mode);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Extracting records from {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Extracting {}...", args.input.display()));

    let input = args.input.clone();
    let (outcome, diagnostics) = tokio::task::spawn_blocking(move || extract_file(input, config)).await?;

    pb.finish_and_clear();

    let records = match outcome {
        Ok(ExtractionOutcome::Extracted(records)) => records,
        Ok(ExtractionOutcome::Unsupported { extension }) => {
            eprintln!(
                "{} Unsupported file type '{}': {}",
                style("⚠").yellow(),
                extension,
                args.input.display()
            );
            return Ok(());
        }
        Err(e) => anyhow::bail!("Failed to extract {}: {}", args.input.display(), e),
    };

    if records.is_empty() {
        eprintln!("{} No records found in {}", style("ℹ").blue(), args.input.display());
    }
    if !diagnostics.is_empty() && (records.is_empty() || args.show_diagnostics) {
        eprintln!("{}", format_diagnostics(&diagnostics));
    }

    let output = format_records(&records, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} {} contributions and {} expenditures written to {}",
            style("✓").green(),
            records.contributions.len(),
            records.expenditures.len(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
