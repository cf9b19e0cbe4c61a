//! Rebuilds records from the lines of one schedule segment.
//!
//! The scan is a small state machine. A boundary event moves it between
//! `Idle` and one of the two accumulating states; plain lines are buffered;
//! an amount line closes a record from whatever is buffered. Whatever is
//! still buffered when a boundary arrives is discarded, never flushed.
//!
//! The contributor or payee name is taken to be the first buffered line.
//! That is an approximation of the printed form layout: an OCR split of the
//! name, or a stray line above it, yields the wrong name.

use rust_decimal::Decimal;
use tracing::trace;

use super::dictionary::SegmentLabel;
use super::rules::{find_amount, find_date, strip_amounts};
use super::segmenter::Segment;
use crate::models::record::{CanonicalRecord, RecordDraft, RecordKind};

/// Description lines waiting for a closing amount line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
}

impl LineBuffer {
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn first(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Scanner state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    AccumulatingContribution(LineBuffer),
    AccumulatingExpenditure(LineBuffer),
}

impl ScanState {
    fn for_label(label: SegmentLabel) -> Self {
        match label {
            SegmentLabel::Contribution => Self::AccumulatingContribution(LineBuffer::default()),
            SegmentLabel::Expenditure => Self::AccumulatingExpenditure(LineBuffer::default()),
            SegmentLabel::None => Self::Idle,
        }
    }
}

/// A classified input line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent<'a> {
    /// Schedule boundary opening a segment with this label.
    Boundary(SegmentLabel),
    /// Line carrying an amount token; the first token's value.
    Amount { line: &'a str, amount: Decimal },
    /// Non-blank line without an amount, already trimmed.
    Text(&'a str),
    Blank,
}

impl<'a> LineEvent<'a> {
    /// Classify a line inside a segment.
    pub fn classify(line: &'a str) -> Self {
        if let Some(found) = find_amount(line) {
            return LineEvent::Amount { line, amount: found.value };
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            LineEvent::Blank
        } else {
            LineEvent::Text(trimmed)
        }
    }
}

/// What a single step did.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Nothing changed (blank line, or input while idle).
    Ignored,
    Buffered,
    /// An amount line closed a record that passed the required-field rule.
    Emitted(CanonicalRecord),
    /// An amount line closed a record that was dropped: empty buffer or
    /// missing required field.
    Dropped,
    /// A boundary arrived with lines still buffered.
    Discarded(LineBuffer),
    /// A boundary arrived with nothing buffered.
    Switched,
}

/// The record scanner for one document.
pub struct RecordScanner<'a> {
    state: ScanState,
    filer_name: &'a str,
    source_file: &'a str,
}

impl<'a> RecordScanner<'a> {
    pub fn new(filer_name: &'a str, source_file: &'a str) -> Self {
        Self {
            state: ScanState::Idle,
            filer_name,
            source_file,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Apply one event.
    pub fn step(&mut self, event: LineEvent<'_>) -> Step {
        match event {
            LineEvent::Boundary(label) => {
                let previous = std::mem::replace(&mut self.state, ScanState::for_label(label));
                match previous {
                    ScanState::AccumulatingContribution(buffer)
                    | ScanState::AccumulatingExpenditure(buffer)
                        if !buffer.is_empty() =>
                    {
                        Step::Discarded(buffer)
                    }
                    _ => Step::Switched,
                }
            }
            LineEvent::Blank => Step::Ignored,
            LineEvent::Text(text) => match &mut self.state {
                ScanState::Idle => Step::Ignored,
                ScanState::AccumulatingContribution(buffer)
                | ScanState::AccumulatingExpenditure(buffer) => {
                    buffer.push(text);
                    Step::Buffered
                }
            },
            LineEvent::Amount { line, amount } => {
                let (kind, buffer) = match &mut self.state {
                    ScanState::Idle => return Step::Ignored,
                    ScanState::AccumulatingContribution(buffer) => (RecordKind::Contribution, buffer),
                    ScanState::AccumulatingExpenditure(buffer) => (RecordKind::Expenditure, buffer),
                };
                let record = close_record(kind, buffer, line, amount, self.filer_name, self.source_file);
                buffer.clear();
                match record {
                    Some(record) => Step::Emitted(record),
                    None => Step::Dropped,
                }
            }
        }
    }
}

fn close_record(
    kind: RecordKind,
    buffer: &LineBuffer,
    line: &str,
    amount: Decimal,
    filer_name: &str,
    source_file: &str,
) -> Option<CanonicalRecord> {
    let Some(name) = buffer.first() else {
        trace!("Amount line without a buffered name: {}", line.trim());
        return None;
    };

    let mut context = buffer.lines().join(" ");
    context.push(' ');
    context.push_str(line);

    let mut draft = RecordDraft::new(kind, source_file);
    draft.filer_name = filer_name.to_string();
    draft.name = name.to_string();
    draft.amount = Some(amount);
    draft.date = find_date(&context);
    draft.description = strip_amounts(line);
    draft.finish()
}

/// Records and leftovers from one segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentOutcome {
    pub records: Vec<CanonicalRecord>,
    /// Lines buffered when the segment ended without a closing amount.
    pub discarded: Option<LineBuffer>,
}

/// Runs the scanner over whole segments.
pub struct RecordReconstructor<'a> {
    filer_name: &'a str,
    source_file: &'a str,
}

impl<'a> RecordReconstructor<'a> {
    pub fn new(filer_name: &'a str, source_file: &'a str) -> Self {
        Self {
            filer_name,
            source_file,
        }
    }

    /// Reconstruct the records of one segment. Unlabeled segments yield nothing.
    pub fn reconstruct(&self, segment: &Segment) -> SegmentOutcome {
        let mut outcome = SegmentOutcome::default();
        if segment.label == SegmentLabel::None {
            return outcome;
        }

        let mut scanner = RecordScanner::new(self.filer_name, self.source_file);
        scanner.step(LineEvent::Boundary(segment.label));

        for line in &segment.lines {
            if let Step::Emitted(record) = scanner.step(LineEvent::classify(line)) {
                outcome.records.push(record);
            }
        }

        if let Step::Discarded(buffer) = scanner.step(LineEvent::Boundary(SegmentLabel::None)) {
            outcome.discarded = Some(buffer);
        }
        outcome
    }
}
