//! Canonical contribution and expenditure records.
//!
//! Field names match the downstream `contributions` and `expenditures`
//! tables exactly, so a serialized record can be inserted as-is.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which schedule family a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Contribution,
    Expenditure,
}

/// A monetary contribution received by the filer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// Filer (candidate or committee). May be empty.
    pub filer_name: String,

    /// Person or entity that gave the contribution.
    pub contributor_name: String,

    /// Amount received.
    #[serde(with = "rust_decimal::serde::float")]
    pub contribution_amount: Decimal,

    /// Date as it appeared in the source. Not calendar-validated.
    pub contribution_date: Option<String>,

    /// Base name of the file the record came from.
    pub source_file: String,
}

/// A payment made by the filer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expenditure {
    /// Filer (candidate or committee). May be empty.
    pub filer_name: String,

    /// Person or entity that was paid.
    pub payee_name: String,

    /// Amount paid.
    #[serde(with = "rust_decimal::serde::float")]
    pub expenditure_amount: Decimal,

    /// Date as it appeared in the source. Not calendar-validated.
    pub expenditure_date: Option<String>,

    /// Free-form purpose of the payment. May be empty.
    pub expenditure_description: String,

    /// Base name of the file the record came from.
    pub source_file: String,
}

/// Either kind of canonical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CanonicalRecord {
    Contribution(Contribution),
    Expenditure(Expenditure),
}

impl CanonicalRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Contribution(_) => RecordKind::Contribution,
            Self::Expenditure(_) => RecordKind::Expenditure,
        }
    }
}

/// A record under construction, shared by the tabular and text pipelines.
///
/// [`RecordDraft::finish`] is the single place where the required-field
/// rule is applied: a draft without a non-blank name or without an amount
/// yields nothing.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub kind: RecordKind,
    pub filer_name: String,
    pub name: String,
    pub amount: Option<Decimal>,
    pub date: Option<String>,
    pub description: String,
    pub source_file: String,
}

impl RecordDraft {
    pub fn new(kind: RecordKind, source_file: impl Into<String>) -> Self {
        Self {
            kind,
            filer_name: String::new(),
            name: String::new(),
            amount: None,
            date: None,
            description: String::new(),
            source_file: source_file.into(),
        }
    }

    /// Convert into a canonical record, or `None` when a required field is missing.
    pub fn finish(self) -> Option<CanonicalRecord> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        let amount = self.amount?;

        let record = match self.kind {
            RecordKind::Contribution => CanonicalRecord::Contribution(Contribution {
                filer_name: self.filer_name,
                contributor_name: name.to_string(),
                contribution_amount: amount,
                contribution_date: self.date,
                source_file: self.source_file,
            }),
            RecordKind::Expenditure => CanonicalRecord::Expenditure(Expenditure {
                filer_name: self.filer_name,
                payee_name: name.to_string(),
                expenditure_amount: amount,
                expenditure_date: self.date,
                expenditure_description: self.description,
                source_file: self.source_file,
            }),
        };
        Some(record)
    }
}

/// The output of one extraction call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    pub contributions: Vec<Contribution>,
    pub expenditures: Vec<Expenditure>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the list matching its kind.
    pub fn push(&mut self, record: CanonicalRecord) {
        match record {
            CanonicalRecord::Contribution(c) => self.contributions.push(c),
            CanonicalRecord::Expenditure(e) => self.expenditures.push(e),
        }
    }

    pub fn len(&self) -> usize {
        self.contributions.len() + self.expenditures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty() && self.expenditures.is_empty()
    }
}
