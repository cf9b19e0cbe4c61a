//! PDF page access for the OCR pipeline.

mod document;

pub use document::PdfDocument;

use image::DynamicImage;

use crate::error::PdfError;

/// Type of PDF content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfType {
    /// Contains extractable text.
    Text,
    /// Contains only images (scanned document).
    Image,
    /// Contains both text and images.
    Hybrid,
    /// Empty or unreadable.
    Empty,
}

impl PdfType {
    /// Classify from the length of the embedded text layer and image presence.
    pub fn classify(text_len: usize, has_images: bool, min_text_length: usize) -> Self {
        match (text_len >= min_text_length && text_len > 0, has_images) {
            (true, false) => PdfType::Text,
            (false, true) => PdfType::Image,
            (true, true) => PdfType::Hybrid,
            (false, false) => PdfType::Empty,
        }
    }

    /// Whether the embedded text layer is worth using instead of OCR.
    pub fn has_text(&self) -> bool {
        matches!(self, PdfType::Text | PdfType::Hybrid)
    }
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for paged documents the text pipeline can read.
pub trait PdfProcessor {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Whether any page carries an image.
    fn has_images(&self) -> bool;

    /// Text of the embedded text layer for the whole document.
    fn embedded_text(&self) -> Result<String>;

    /// Render a page (1-indexed) as an image at the given DPI.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage>;
}
