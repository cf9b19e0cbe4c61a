//! Error types for the filings-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the filings library.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The document as a whole could not be read.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Document-level failures. These abort the extraction of one document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be opened or parsed.
    #[error("unreadable document {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },
}

/// Failures confined to one sheet of a tabular document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    /// The sheet could not be read from the workbook.
    #[error("failed to read sheet '{sheet}': {reason}")]
    Read { sheet: String, reason: String },

    /// A header cell is not text and cannot be normalized.
    #[error("sheet '{sheet}' has a non-text header in column {column}: {found}")]
    Header {
        sheet: String,
        column: usize,
        found: String,
    },
}

/// Failures confined to one row of a sheet.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    /// The amount cell could not be coerced to a non-negative decimal.
    #[error("column '{column}' holds a non-numeric amount: {value}")]
    Amount { column: String, value: String },

    /// The amount is numeric but negative.
    #[error("column '{column}' holds a negative amount: {value}")]
    NegativeAmount { column: String, value: String },

    /// A cell holds a spreadsheet error value.
    #[error("column '{column}' holds an error cell: {value}")]
    ErrorCell { column: String, value: String },
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The page carries no image that could be rendered.
    #[error("page {0} has no renderable image")]
    NoPageImage(u32),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// The page would rasterize to more pixels than the renderer allows.
    #[error("page {page} would render at {width}x{height} pixels")]
    PageTooLarge { page: u32, width: u64, height: u64 },
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// No OCR engine is configured but the document needs one.
    #[error("no OCR engine available")]
    Unavailable,
}

/// Result type for the filings library.
pub type Result<T> = std::result::Result<T, IngestError>;
