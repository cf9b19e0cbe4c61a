//! Core library for campaign-finance disclosure extraction.
//!
//! This crate provides:
//! - Spreadsheet schedule mapping (calamine workbooks, Form 460 family sheets)
//! - Scanned PDF handling: page images via lopdf, text via an OCR service
//! - Schedule segmentation and record reconstruction from OCR text
//! - Canonical contribution and expenditure records
//!
//! Recoverable failures (bad rows, sheets, pages) are handed to a
//! [`Reporter`] passed into each call; only document-level failures are
//! returned as errors.

pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod report;
pub mod tabular;

use std::path::Path;

pub use error::{IngestError, Result};
pub use extract::{DocumentKind, ExtractionOutcome, Extractor};
pub use models::config::FilingsConfig;
pub use models::record::{CanonicalRecord, Contribution, Expenditure, RecordKind, RecordSet};
pub use ocr::OcrService;
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{PdfDocument, PdfProcessor, PdfType};
pub use report::{CollectingReporter, Diagnostic, DiagnosticKind, Reporter, Severity, TracingReporter, Unit};
pub use tabular::{MemoryWorkbook, TabularSource, WorkbookSource};

/// Extract one document with default configuration, logging diagnostics
/// through `tracing`.
pub fn extract(path: &Path) -> Result<ExtractionOutcome> {
    Extractor::from_config(FilingsConfig::default()).extract(path, &TracingReporter)
}
