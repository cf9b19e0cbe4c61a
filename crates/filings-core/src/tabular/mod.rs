//! Raw tabular document access.
//!
//! A tabular source yields sheet names and, per sheet, a header row and the
//! data rows beneath it. Nothing here knows about contributions or
//! expenditures; mapping happens in [`crate::extract::tabular`].

mod workbook;

pub use workbook::WorkbookSource;

use std::fmt;

use chrono::NaiveDateTime;

use crate::error::SheetError;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    /// Spreadsheet error value such as `#DIV/0!`.
    Error(String),
}

impl CellValue {
    /// True for empty cells, whitespace-only text, and NaN.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Text form used for string-typed canonical fields.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{:.0}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            CellValue::Error(e) => write!(f, "#{}", e),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Int(v)
    }
}

/// One sheet: header cells and data rows in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub headers: Vec<CellValue>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_headers<I, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_row<I, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_cells(mut self, row: Vec<CellValue>) -> Self {
        self.rows.push(row);
        self
    }
}

/// Trait for tabular document readers.
pub trait TabularSource {
    /// Sheet names in document order.
    fn sheet_names(&self) -> Vec<String>;

    /// Read one sheet. A failure affects only that sheet.
    fn read_sheet(&mut self, name: &str) -> Result<RawSheet, SheetError>;
}

/// In-memory tabular source, useful for callers that already hold rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<Result<RawSheet, SheetError>>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet: RawSheet) -> Self {
        self.sheets.push(Ok(sheet));
        self
    }

    /// Add a sheet that fails to read.
    pub fn with_broken_sheet(mut self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.sheets.push(Err(SheetError::Read {
            sheet: name.into(),
            reason: reason.into(),
        }));
        self
    }
}

impl TabularSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets
            .iter()
            .map(|s| match s {
                Ok(sheet) => sheet.name.clone(),
                Err(SheetError::Read { sheet, .. }) | Err(SheetError::Header { sheet, .. }) => {
                    sheet.clone()
                }
            })
            .collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<RawSheet, SheetError> {
        self.sheets
            .iter()
            .find(|s| match s {
                Ok(sheet) => sheet.name == name,
                Err(SheetError::Read { sheet, .. }) | Err(SheetError::Header { sheet, .. }) => {
                    sheet == name
                }
            })
            .cloned()
            .unwrap_or_else(|| {
                Err(SheetError::Read {
                    sheet: name.to_string(),
                    reason: "no such sheet".to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_missing_values() {
        assert!(CellValue::Empty.is_missing());
        assert!(CellValue::Text("  ".to_string()).is_missing());
        assert!(CellValue::Float(f64::NAN).is_missing());
        assert!(!CellValue::Float(0.0).is_missing());
        assert!(!CellValue::Text("x".to_string()).is_missing());
    }

    #[test]
    fn test_cell_text_forms() {
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(CellValue::DateTime(midnight).to_text(), "2024-01-15");
        assert_eq!(CellValue::Float(500.0).to_text(), "500");
        assert_eq!(CellValue::Float(12.5).to_text(), "12.5");
        assert_eq!(CellValue::Text(" Acme PAC ".to_string()).to_text(), "Acme PAC");
    }

    #[test]
    fn test_memory_workbook_order_and_failures() {
        let mut book = MemoryWorkbook::new()
            .with_sheet(RawSheet::new("Cover"))
            .with_broken_sheet("A-Contributions", "corrupt");

        assert_eq!(book.sheet_names(), vec!["Cover", "A-Contributions"]);
        assert!(book.read_sheet("Cover").is_ok());
        assert!(book.read_sheet("A-Contributions").is_err());
        assert!(book.read_sheet("Missing").is_err());
    }
}
