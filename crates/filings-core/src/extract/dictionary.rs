//! Static lookup tables for known form layouts.
//!
//! Sheet names and column aliases come from the California Form 460 family
//! of electronic filing exports. Column alias lists are ordered: the first
//! column that is present and non-blank wins.

use crate::models::config::ExtractionConfig;
use crate::models::record::RecordKind;

/// Sheets holding contribution schedules.
pub static CONTRIBUTION_SHEETS: &[&str] = &[
    "A-Contributions",
    "C-Contributions",
    "I-Contributions",
    "F496P3-Contributions",
];

/// Sheets holding expenditure schedules.
pub static EXPENDITURE_SHEETS: &[&str] = &[
    "F465P3-Expenditure",
    "F461P5-Expenditure",
    "D-Expenditure",
    "G-Expenditure",
    "E-Expenditure",
    "F-Expenses",
];

/// Canonical fields a spreadsheet row is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    FilerName,
    /// First-name part of the contributor or payee.
    FirstName,
    /// Last-name (or organization) part of the contributor or payee.
    LastName,
    Amount,
    Date,
    Description,
}

/// Ordered source columns accepted for one canonical field.
#[derive(Debug, Clone, Copy)]
pub struct ColumnAlias {
    pub field: CanonicalField,
    pub columns: &'static [&'static str],
}

pub static CONTRIBUTION_COLUMNS: &[ColumnAlias] = &[
    ColumnAlias { field: CanonicalField::FilerName, columns: &["filer_naml"] },
    ColumnAlias { field: CanonicalField::FirstName, columns: &["tran_namf"] },
    ColumnAlias { field: CanonicalField::LastName, columns: &["tran_naml"] },
    ColumnAlias { field: CanonicalField::Amount, columns: &["tran_amt1"] },
    ColumnAlias { field: CanonicalField::Date, columns: &["tran_date"] },
];

pub static EXPENDITURE_COLUMNS: &[ColumnAlias] = &[
    ColumnAlias { field: CanonicalField::FilerName, columns: &["filer_naml"] },
    ColumnAlias { field: CanonicalField::FirstName, columns: &["payee_namf"] },
    ColumnAlias { field: CanonicalField::LastName, columns: &["payee_naml"] },
    // F-Expenses reports amt_paid / rpt_date instead of amount / expn_date.
    ColumnAlias { field: CanonicalField::Amount, columns: &["amount", "amt_paid"] },
    ColumnAlias { field: CanonicalField::Date, columns: &["expn_date", "rpt_date"] },
    ColumnAlias { field: CanonicalField::Description, columns: &["expn_dscr", "tran_dscr"] },
];

/// Label carried by a run of OCR lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentLabel {
    Contribution,
    Expenditure,
    None,
}

impl SegmentLabel {
    pub fn record_kind(self) -> Option<RecordKind> {
        match self {
            Self::Contribution => Some(RecordKind::Contribution),
            Self::Expenditure => Some(RecordKind::Expenditure),
            Self::None => None,
        }
    }
}

/// Schedule-boundary phrases, checked in order against upper-cased lines.
pub static SCHEDULE_MARKERS: &[(&str, SegmentLabel)] = &[
    ("SCHEDULE A", SegmentLabel::Contribution),
    ("SCHEDULE C", SegmentLabel::Contribution),
    ("SCHEDULE E", SegmentLabel::Expenditure),
    ("SUMMARY PAGE", SegmentLabel::None),
];

/// Classification of a sheet name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetClass {
    Contribution,
    Expenditure,
    Unknown,
}

impl SheetClass {
    pub fn record_kind(self) -> Option<RecordKind> {
        match self {
            Self::Contribution => Some(RecordKind::Contribution),
            Self::Expenditure => Some(RecordKind::Expenditure),
            Self::Unknown => None,
        }
    }
}

/// Sheet and column lookup, optionally extended with configured sheet names.
#[derive(Debug, Clone, Default)]
pub struct FieldDictionary {
    extra_contribution_sheets: Vec<String>,
    extra_expenditure_sheets: Vec<String>,
}

impl FieldDictionary {
    /// Dictionary with only the built-in tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dictionary extended with the sheet names listed in `config`.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            extra_contribution_sheets: config.extra_contribution_sheets.clone(),
            extra_expenditure_sheets: config.extra_expenditure_sheets.clone(),
        }
    }

    /// Register an additional sheet name for `class`. `Unknown` is ignored.
    pub fn with_sheet(mut self, name: impl Into<String>, class: SheetClass) -> Self {
        match class {
            SheetClass::Contribution => self.extra_contribution_sheets.push(name.into()),
            SheetClass::Expenditure => self.extra_expenditure_sheets.push(name.into()),
            SheetClass::Unknown => {}
        }
        self
    }

    /// Classify a sheet name. Matching ignores case and surrounding whitespace.
    pub fn classify_sheet(&self, name: &str) -> SheetClass {
        let name = name.trim();
        let matches = |candidate: &str| candidate.trim().eq_ignore_ascii_case(name);

        if CONTRIBUTION_SHEETS.iter().copied().any(matches)
            || self.extra_contribution_sheets.iter().any(|s| matches(s))
        {
            SheetClass::Contribution
        } else if EXPENDITURE_SHEETS.iter().copied().any(matches)
            || self.extra_expenditure_sheets.iter().any(|s| matches(s))
        {
            SheetClass::Expenditure
        } else {
            SheetClass::Unknown
        }
    }

    /// Column alias table for a record kind.
    pub fn columns(&self, kind: RecordKind) -> &'static [ColumnAlias] {
        match kind {
            RecordKind::Contribution => CONTRIBUTION_COLUMNS,
            RecordKind::Expenditure => EXPENDITURE_COLUMNS,
        }
    }

    /// Ordered source columns for one field, empty when the kind has none.
    pub fn aliases(&self, kind: RecordKind, field: CanonicalField) -> &'static [&'static str] {
        self.columns(kind)
            .iter()
            .find(|alias| alias.field == field)
            .map(|alias| alias.columns)
            .unwrap_or(&[])
    }

    /// Boundary label for a line, if the line is a schedule marker.
    pub fn classify_marker(&self, line: &str) -> Option<SegmentLabel> {
        let upper = line.to_uppercase();
        SCHEDULE_MARKERS
            .iter()
            .find(|(phrase, _)| upper.contains(phrase))
            .map(|(_, label)| *label)
    }
}
