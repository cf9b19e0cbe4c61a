//! OCR service: page image in, plain text out.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// A box joins the current text row when its top is within this many
/// pixels of the row's first box.
const ROW_TOLERANCE_PX: f32 = 20.0;

/// An OCR engine turning one page image into plain text.
pub trait OcrService {
    /// Recognize a page. Lines of the result are in reading order.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

impl<T: OcrService + ?Sized> OcrService for Box<T> {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        (**self).recognize(image)
    }
}

/// A recognized text box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    /// Axis-aligned bounds (min_x, min_y, max_x, max_y).
    pub rect: (f32, f32, f32, f32),

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    pub fn new(rect: (f32, f32, f32, f32), text: impl Into<String>) -> Self {
        Self {
            rect,
            text: text.into(),
            confidence: 1.0,
        }
    }
}

/// Sort boxes top-to-bottom, then left-to-right within a row.
/// Rows are clustered relative to their first (topmost) box.
pub fn sort_by_reading_order(boxes: &mut [TextBox]) {
    boxes.sort_by(|a, b| a.rect.1.total_cmp(&b.rect.1));

    let mut start = 0;
    while start < boxes.len() {
        let anchor = boxes[start].rect.1;
        let end = boxes[start..]
            .iter()
            .position(|b| b.rect.1 - anchor > ROW_TOLERANCE_PX)
            .map_or(boxes.len(), |offset| start + offset);
        boxes[start..end].sort_by(|a, b| a.rect.0.total_cmp(&b.rect.0));
        start = end;
    }
}

/// Join boxes into page text, one box per line, in reading order.
pub fn boxes_to_text(mut boxes: Vec<TextBox>) -> String {
    sort_by_reading_order(&mut boxes);
    boxes
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
