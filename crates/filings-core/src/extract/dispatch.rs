//! Document dispatch: picks the tabular or text pipeline for a file.

use std::path::Path;

use tracing::{debug, info, info_span};

use super::dictionary::FieldDictionary;
use super::tabular::TabularExtractor;
use super::text::TextExtractor;
use crate::error::{IngestError, OcrError, Result};
use crate::models::config::{FilingsConfig, PdfTextMode};
use crate::models::record::RecordSet;
use crate::ocr::OcrService;
use crate::pdf::{PdfDocument, PdfProcessor, PdfType};
use crate::report::{DiagnosticKind, DocumentReporter, Reporter, Severity, Unit};
use crate::tabular::{TabularSource, WorkbookSource};

/// Which pipeline handles a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Spreadsheet exports.
    Tabular,
    /// Scanned or printed PDFs.
    Text,
}

impl DocumentKind {
    /// Classify by file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Tabular),
            "pdf" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Outcome of extracting one document.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Extracted(RecordSet),
    /// The file type has no pipeline. Not an error.
    Unsupported { extension: String },
}

impl ExtractionOutcome {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// The records, empty for unsupported documents.
    pub fn into_records(self) -> RecordSet {
        match self {
            Self::Extracted(records) => records,
            Self::Unsupported { .. } => RecordSet::new(),
        }
    }
}

/// Base name of a path, used as `source_file` on every record.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extraction entry point holding configuration and collaborators.
pub struct Extractor {
    config: FilingsConfig,
    dictionary: FieldDictionary,
    ocr: Option<Box<dyn OcrService>>,
}

impl Extractor {
    /// Create an extractor without an OCR engine.
    pub fn new(config: FilingsConfig) -> Self {
        let dictionary = FieldDictionary::from_config(&config.extraction);
        Self {
            config,
            dictionary,
            ocr: None,
        }
    }

    /// Create an extractor, loading the OCR engine when its models are on disk.
    ///
    /// A failed model load is logged and leaves the extractor without OCR;
    /// spreadsheets and text-layer PDFs still work.
    pub fn from_config(config: FilingsConfig) -> Self {
        let extractor = Self::new(config);

        #[cfg(feature = "native")]
        {
            if extractor.config.ocr.models_present() {
                return match crate::ocr::PureOcrEngine::from_config(&extractor.config.ocr) {
                    Ok(engine) => extractor.with_ocr(engine),
                    Err(e) => {
                        tracing::warn!("OCR engine unavailable: {}", e);
                        extractor
                    }
                };
            }
            debug!(
                "No OCR models in {}, scanned PDFs will fail",
                extractor.config.ocr.model_dir.display()
            );
        }

        extractor
    }

    /// Use the given OCR service for scanned pages.
    pub fn with_ocr(mut self, ocr: impl OcrService + 'static) -> Self {
        self.ocr = Some(Box::new(ocr));
        self
    }

    pub fn config(&self) -> &FilingsConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &FieldDictionary {
        &self.dictionary
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract records from a document on disk.
    ///
    /// Document-level failures are reported as `DocumentUnreadable` and
    /// returned as errors. Unsupported extensions are an outcome, not an error.
    pub fn extract(&self, path: &Path, reporter: &dyn Reporter) -> Result<ExtractionOutcome> {
        let document = source_name(path);
        let span = info_span!("extract", document = %document);
        let _enter = span.enter();

        let scoped = DocumentReporter::new(&document, reporter);

        let Some(kind) = DocumentKind::from_path(path) else {
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            scoped.emit(
                Unit::Document,
                Severity::Info,
                DiagnosticKind::UnsupportedFileType,
                format!("unsupported file type '{}'", extension),
            );
            return Ok(ExtractionOutcome::Unsupported { extension });
        };

        debug!("Dispatching {} to the {:?} pipeline", document, kind);
        let result = match kind {
            DocumentKind::Tabular => WorkbookSource::open(path)
                .map_err(IngestError::from)
                .map(|mut source| self.extract_tabular(&mut source, &document, reporter)),
            DocumentKind::Text => PdfDocument::open(path)
                .map_err(IngestError::from)
                .and_then(|pdf| self.extract_paged(&pdf, &document, reporter)),
        };

        match result {
            Ok(records) => Ok(ExtractionOutcome::Extracted(records)),
            Err(e) => {
                scoped.emit(Unit::Document, Severity::Error, DiagnosticKind::DocumentUnreadable, e.to_string());
                Err(e)
            }
        }
    }

    /// Run the tabular pipeline over an already opened source.
    pub fn extract_tabular<S>(&self, source: &mut S, document: &str, reporter: &dyn Reporter) -> RecordSet
    where
        S: TabularSource + ?Sized,
    {
        TabularExtractor::new(&self.dictionary).extract(source, document, reporter)
    }

    /// Run the text pipeline over an already opened paged document.
    pub fn extract_paged<P>(&self, pdf: &P, document: &str, reporter: &dyn Reporter) -> Result<RecordSet>
    where
        P: PdfProcessor + ?Sized,
    {
        let pages = self.page_texts(pdf, &DocumentReporter::new(document, reporter))?;
        let extractor = TextExtractor::new(&self.dictionary, self.config.extraction.unknown_filer.clone());
        Ok(extractor.extract(&pages, document, reporter))
    }

    fn page_texts<P>(&self, pdf: &P, reporter: &DocumentReporter<'_>) -> Result<Vec<String>>
    where
        P: PdfProcessor + ?Sized,
    {
        let pdf_config = &self.config.pdf;

        match pdf_config.text_mode {
            PdfTextMode::Embedded => {
                let text = pdf.embedded_text().unwrap_or_else(|e| {
                    reporter.emit(
                        Unit::Page { number: 1 },
                        Severity::Warning,
                        DiagnosticKind::PageUnrecognizable,
                        e.to_string(),
                    );
                    String::new()
                });
                return Ok(vec![text]);
            }
            PdfTextMode::Auto => {
                let text = pdf.embedded_text().unwrap_or_else(|e| {
                    debug!("No usable text layer: {}", e);
                    String::new()
                });
                let pdf_type = PdfType::classify(text.trim().len(), pdf.has_images(), pdf_config.min_text_length);
                info!("PDF analyzed as {:?}", pdf_type);
                if pdf_type.has_text() {
                    return Ok(vec![text]);
                }
            }
            PdfTextMode::Ocr => {}
        }

        let ocr = self.ocr.as_deref().ok_or(OcrError::Unavailable)?;

        let page_count = pdf.page_count();
        let limit = match pdf_config.max_pages {
            0 => page_count,
            max => page_count.min(u32::try_from(max).unwrap_or(u32::MAX)),
        };

        let mut pages = Vec::with_capacity(limit as usize);
        for number in 1..=limit {
            let text = pdf
                .render_page(number, pdf_config.render_dpi)
                .map_err(IngestError::from)
                .and_then(|image| ocr.recognize(&image).map_err(IngestError::from));

            match text {
                Ok(text) => {
                    debug!("Page {}: {} characters recognized", number, text.len());
                    pages.push(text);
                }
                Err(e) => {
                    reporter.emit(
                        Unit::Page { number },
                        Severity::Warning,
                        DiagnosticKind::PageUnrecognizable,
                        e.to_string(),
                    );
                    pages.push(String::new());
                }
            }
        }

        info!("Recognized {} of {} pages", limit, page_count);
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DocumentError, PdfError};
    use crate::report::CollectingReporter;
    use crate::tabular::{MemoryWorkbook, RawSheet};
    use image::DynamicImage;
    use pretty_assertions::assert_eq;

    /// Pages render as 1-pixel-high images whose width is the page number;
    /// page numbers listed in `broken` fail to render.
    struct FakePdf {
        pages: u32,
        broken: Vec<u32>,
        text_layer: String,
    }

    impl PdfProcessor for FakePdf {
        fn page_count(&self) -> u32 {
            self.pages
        }

        fn has_images(&self) -> bool {
            true
        }

        fn embedded_text(&self) -> crate::pdf::Result<String> {
            Ok(self.text_layer.clone())
        }

        fn render_page(&self, page: u32, _dpi: u32) -> crate::pdf::Result<DynamicImage> {
            if self.broken.contains(&page) {
                return Err(PdfError::NoPageImage(page));
            }
            Ok(DynamicImage::new_luma8(page, 1))
        }
    }

    /// Returns the text for the page encoded in the image width.
    struct ScriptedOcr(Vec<&'static str>);

    impl OcrService for ScriptedOcr {
        fn recognize(&self, image: &DynamicImage) -> std::result::Result<String, OcrError> {
            self.0
                .get(image.width() as usize - 1)
                .map(|text| text.to_string())
                .ok_or_else(|| OcrError::Recognition("no script for page".to_string()))
        }
    }

    fn ocr_config() -> FilingsConfig {
        let mut config = FilingsConfig::default();
        config.pdf.text_mode = PdfTextMode::Ocr;
        config
    }

    #[test]
    fn test_document_kind_from_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("a/b/filing.XLSX")), Some(DocumentKind::Tabular));
        assert_eq!(DocumentKind::from_path(Path::new("report.ods")), Some(DocumentKind::Tabular));
        assert_eq!(DocumentKind::from_path(Path::new("scan.pdf")), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(DocumentKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_unsupported_file_is_an_outcome() {
        let extractor = Extractor::new(FilingsConfig::default());
        let reporter = CollectingReporter::new();

        let outcome = extractor.extract(Path::new("/nowhere/notes.txt"), &reporter).unwrap();

        assert_eq!(outcome, ExtractionOutcome::Unsupported { extension: "txt".to_string() });
        assert!(outcome.into_records().is_empty());
        assert_eq!(reporter.of_kind(DiagnosticKind::UnsupportedFileType).len(), 1);
    }

    #[test]
    fn test_missing_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Extractor::new(FilingsConfig::default());
        let reporter = CollectingReporter::new();

        let result = extractor.extract(&dir.path().join("absent.xlsx"), &reporter);

        assert!(matches!(result, Err(IngestError::Document(DocumentError::NotFound(_)))));
        let reported = reporter.of_kind(DiagnosticKind::DocumentUnreadable);
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].document, "absent.xlsx");
        assert_eq!(reported[0].severity, Severity::Error);
    }

    #[test]
    fn test_tabular_source_through_extractor() {
        let extractor = Extractor::new(FilingsConfig::default());
        let reporter = CollectingReporter::new();
        let mut book = MemoryWorkbook::new().with_sheet(
            RawSheet::new("A-Contributions")
                .with_headers(["filer_naml", "tran_namf", "tran_naml", "tran_amt1", "tran_date"])
                .with_row(["Acme PAC", "Jane", "Doe", "500.00", "2024-01-15"]),
        );

        let records = extractor.extract_tabular(&mut book, "filing.xlsx", &reporter);

        assert_eq!(records.contributions.len(), 1);
        assert_eq!(records.contributions[0].contributor_name, "Jane Doe");
    }

    #[test]
    fn test_failed_page_becomes_empty_text() {
        let extractor = Extractor::new(ocr_config()).with_ocr(ScriptedOcr(vec![
            "NAME OF FILER\nAcme PAC\nSCHEDULE A",
            "unreachable",
            "Jane Doe\n$10.00 1/2/2024",
        ]));
        let reporter = CollectingReporter::new();
        let pdf = FakePdf { pages: 3, broken: vec![2], text_layer: String::new() };

        let records = extractor.extract_paged(&pdf, "scan.pdf", &reporter).unwrap();

        assert_eq!(records.contributions.len(), 1);
        assert_eq!(records.contributions[0].filer_name, "Acme PAC");
        assert_eq!(records.contributions[0].contribution_date.as_deref(), Some("1/2/2024"));

        let failures = reporter.of_kind(DiagnosticKind::PageUnrecognizable);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].unit, Unit::Page { number: 2 });
        assert_eq!(failures[0].severity, Severity::Warning);
    }

    #[test]
    fn test_recognition_failure_is_page_level() {
        let extractor = Extractor::new(ocr_config()).with_ocr(ScriptedOcr(vec!["SCHEDULE E\nPrinter\n$5.00"]));
        let reporter = CollectingReporter::new();
        let pdf = FakePdf { pages: 2, broken: Vec::new(), text_layer: String::new() };

        let records = extractor.extract_paged(&pdf, "scan.pdf", &reporter).unwrap();

        assert_eq!(records.expenditures.len(), 1);
        assert_eq!(records.expenditures[0].filer_name, "Unknown Filer");
        assert_eq!(reporter.of_kind(DiagnosticKind::PageUnrecognizable).len(), 1);
    }

    #[test]
    fn test_max_pages_limits_ocr() {
        let mut config = ocr_config();
        config.pdf.max_pages = 1;
        let extractor = Extractor::new(config).with_ocr(ScriptedOcr(vec![
            "SCHEDULE A\nJane Doe\n$1.00",
            "John Roe\n$2.00",
        ]));
        let reporter = CollectingReporter::new();
        let pdf = FakePdf { pages: 2, broken: Vec::new(), text_layer: String::new() };

        let records = extractor.extract_paged(&pdf, "scan.pdf", &reporter).unwrap();

        assert_eq!(records.contributions.len(), 1);
        assert_eq!(records.contributions[0].contributor_name, "Jane Doe");
    }

    #[test]
    fn test_auto_mode_prefers_text_layer() {
        let extractor = Extractor::new(FilingsConfig::default());
        let reporter = CollectingReporter::new();
        let text_layer = "NAME OF FILER\nCitizens for Parks\nSCHEDULE A\nJane Doe\n$1,500.00 10/3/2022\n".to_string();
        let pdf = FakePdf { pages: 1, broken: Vec::new(), text_layer };

        let records = extractor.extract_paged(&pdf, "digital.pdf", &reporter).unwrap();

        assert_eq!(records.contributions.len(), 1);
        assert_eq!(records.contributions[0].filer_name, "Citizens for Parks");
    }

    #[test]
    fn test_scanned_pdf_without_ocr_fails() {
        let extractor = Extractor::new(FilingsConfig::default());
        let reporter = CollectingReporter::new();
        let pdf = FakePdf { pages: 1, broken: Vec::new(), text_layer: String::new() };

        let result = extractor.extract_paged(&pdf, "scan.pdf", &reporter);

        assert!(matches!(result, Err(IngestError::Ocr(OcrError::Unavailable))));
    }

    #[test]
    fn test_source_name_is_base_name() {
        assert_eq!(source_name(Path::new("/data/2024/filing.xlsx")), "filing.xlsx");
    }
}
