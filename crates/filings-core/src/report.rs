//! Scoped reporting of recoverable extraction failures.
//!
//! Extraction never stops on a bad row, sheet, or page. Instead it hands a
//! [`Diagnostic`] to the [`Reporter`] passed into the call, which decides
//! where it goes: the tracing pipeline, an in-memory list, or both.

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Unit of a document a diagnostic refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum Unit {
    Document,
    Sheet { index: usize, name: String },
    Row { sheet: String, index: usize },
    Page { number: u32 },
    Segment { index: usize },
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Document => write!(f, "document"),
            Unit::Sheet { index, name } => write!(f, "sheet {} '{}'", index, name),
            Unit::Row { sheet, index } => write!(f, "row {} of '{}'", index, sheet),
            Unit::Page { number } => write!(f, "page {}", number),
            Unit::Segment { index } => write!(f, "segment {}", index),
        }
    }
}

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

/// What happened to the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    DocumentUnreadable,
    UnsupportedFileType,
    SheetSkipped,
    SheetUnparseable,
    PageUnrecognizable,
    RowMalformed,
    BufferDiscarded,
}

/// A single recoverable event during extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Base name of the document.
    pub document: String,
    pub unit: Unit,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        document: impl Into<String>,
        unit: Unit,
        severity: Severity,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            unit,
            severity,
            kind,
            message: message.into(),
        }
    }
}

/// Receives diagnostics for one extraction call.
///
/// Implementations must be shareable across threads so that a batch run
/// can hand the same reporter to several documents at once.
pub trait Reporter: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn report(&self, diagnostic: Diagnostic) {
        (**self).report(diagnostic)
    }
}

/// Forwards diagnostics to `tracing` at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, d: Diagnostic) {
        match d.severity {
            Severity::Debug => debug!(document = %d.document, unit = %d.unit, kind = ?d.kind, "{}", d.message),
            Severity::Info => info!(document = %d.document, unit = %d.unit, kind = ?d.kind, "{}", d.message),
            Severity::Warning => warn!(document = %d.document, unit = %d.unit, kind = ?d.kind, "{}", d.message),
            Severity::Error => error!(document = %d.document, unit = %d.unit, kind = ?d.kind, "{}", d.message),
        }
    }
}

/// Keeps every diagnostic in memory, optionally forwarding to tracing too.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    diagnostics: Mutex<Vec<Diagnostic>>,
    forward: bool,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also emit each diagnostic through [`TracingReporter`].
    pub fn with_tracing(mut self) -> Self {
        self.forward = true;
        self
    }

    /// Snapshot of the collected diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    /// Diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<Diagnostic> {
        self.diagnostics()
            .into_iter()
            .filter(|d| d.kind == kind)
            .collect()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .map(|mut d| std::mem::take(&mut *d))
            .unwrap_or_default()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, diagnostic: Diagnostic) {
        if self.forward {
            TracingReporter.report(diagnostic.clone());
        }
        if let Ok(mut d) = self.diagnostics.lock() {
            d.push(diagnostic);
        }
    }
}

/// Reporter bound to one document, so call sites only name the unit.
pub(crate) struct DocumentReporter<'a> {
    document: &'a str,
    inner: &'a dyn Reporter,
}

impl<'a> DocumentReporter<'a> {
    pub(crate) fn new(document: &'a str, inner: &'a dyn Reporter) -> Self {
        Self { document, inner }
    }

    pub(crate) fn document(&self) -> &str {
        self.document
    }

    pub(crate) fn emit(&self, unit: Unit, severity: Severity, kind: DiagnosticKind, message: impl Into<String>) {
        self.inner
            .report(Diagnostic::new(self.document, unit, severity, kind, message));
    }
}
