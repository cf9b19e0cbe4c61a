//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::IngestError;

/// Main configuration for the filings pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilingsConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Record extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Where the text of a PDF comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfTextMode {
    /// Use the embedded text layer when it is substantial, otherwise OCR.
    #[default]
    Auto,
    /// Always render pages and run OCR.
    Ocr,
    /// Only use the embedded text layer.
    Embedded,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// Text source selection.
    pub text_mode: PdfTextMode,

    /// Minimum embedded text length for `auto` mode to skip OCR.
    pub min_text_length: usize,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            text_mode: PdfTextMode::Auto,
            min_text_length: 50,
            max_pages: 0,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Whether the detection and recognition models are present on disk.
    pub fn models_present(&self) -> bool {
        self.model_dir.join(&self.detection_model).exists()
            && self.model_dir.join(&self.recognition_model).exists()
    }
}

/// Record extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Filer name used when an OCR document has no filer anchor.
    pub unknown_filer: String,

    /// Additional sheet names treated as contribution schedules.
    pub extra_contribution_sheets: Vec<String>,

    /// Additional sheet names treated as expenditure schedules.
    pub extra_expenditure_sheets: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            unknown_filer: "Unknown Filer".to_string(),
            extra_contribution_sheets: Vec::new(),
            extra_expenditure_sheets: Vec::new(),
        }
    }
}

impl FilingsConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| IngestError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| IngestError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
