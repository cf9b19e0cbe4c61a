//! Record extraction from filings.
//!
//! Two pipelines feed the same canonical records: spreadsheet exports go
//! through [`tabular`], scanned PDFs through [`segmenter`] and
//! [`reconstructor`]. [`dispatch`] picks one per document.

pub mod dictionary;
pub mod dispatch;
pub mod reconstructor;
pub mod rules;
pub mod segmenter;
pub mod tabular;
pub mod text;

pub use dictionary::{FieldDictionary, SegmentLabel, SheetClass};
pub use dispatch::{source_name, DocumentKind, ExtractionOutcome, Extractor};
pub use reconstructor::{LineBuffer, LineEvent, RecordReconstructor, RecordScanner, ScanState, Step};
pub use segmenter::{Segment, SegmentedText, TextSegmenter};
pub use tabular::TabularExtractor;
pub use text::TextExtractor;
