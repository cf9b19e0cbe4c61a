//! OCR text-to-record pipeline.

use tracing::{debug, info};

use super::dictionary::FieldDictionary;
use super::reconstructor::RecordReconstructor;
use super::segmenter::TextSegmenter;
use crate::models::record::RecordSet;
use crate::report::{DiagnosticKind, DocumentReporter, Reporter, Severity, Unit};

/// Turns recognized page texts into records.
pub struct TextExtractor<'d> {
    dictionary: &'d FieldDictionary,
    unknown_filer: String,
}

impl<'d> TextExtractor<'d> {
    /// `unknown_filer` is used when the text has no filer anchor.
    pub fn new(dictionary: &'d FieldDictionary, unknown_filer: impl Into<String>) -> Self {
        Self {
            dictionary,
            unknown_filer: unknown_filer.into(),
        }
    }

    /// Extract records from page texts, in page order. Unrecognizable pages
    /// are expected to be passed in as empty strings.
    pub fn extract(&self, pages: &[String], source_file: &str, reporter: &dyn Reporter) -> RecordSet {
        let reporter = DocumentReporter::new(source_file, reporter);
        let text = pages.join("\n");

        let segmented = TextSegmenter::new(self.dictionary).run(&text);
        let filer_name = match segmented.filer_name {
            Some(name) => name,
            None => {
                debug!("No filer anchor in {}, using '{}'", source_file, self.unknown_filer);
                self.unknown_filer.clone()
            }
        };

        let reconstructor = RecordReconstructor::new(&filer_name, source_file);
        let mut records = RecordSet::new();

        for segment in &segmented.segments {
            let outcome = reconstructor.reconstruct(segment);
            for record in outcome.records {
                records.push(record);
            }

            if let Some(buffer) = outcome.discarded {
                reporter.emit(
                    Unit::Segment { index: segment.index },
                    Severity::Info,
                    DiagnosticKind::BufferDiscarded,
                    format!(
                        "discarded {} buffered lines without an amount, starting with '{}'",
                        buffer.len(),
                        buffer.first().unwrap_or_default()
                    ),
                );
            }
        }

        info!(
            "Extracted {} contributions and {} expenditures from {} pages of {}",
            records.contributions.len(),
            records.expenditures.len(),
            pages.len(),
            source_file
        );
        records
    }
}
