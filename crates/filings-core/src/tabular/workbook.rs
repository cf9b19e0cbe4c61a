//! Spreadsheet reader backed by calamine (xlsx, xlsm, xlsb, xls, ods).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, trace};

use super::{CellValue, RawSheet, TabularSource};
use crate::error::{DocumentError, SheetError};

/// A workbook opened from disk.
pub struct WorkbookSource {
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    /// Open a workbook. Failures here are document-level.
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        if !path.exists() {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }

        let workbook = open_workbook_auto(path).map_err(|e| DocumentError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!("Opened workbook {} with {} sheets", path.display(), workbook.sheet_names().len());
        Ok(Self { workbook })
    }
}

impl TabularSource for WorkbookSource {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<RawSheet, SheetError> {
        let range = self
            .workbook
            .worksheet_range(name)
            .map_err(|e| SheetError::Read {
                sheet: name.to_string(),
                reason: e.to_string(),
            })?;

        Ok(range_to_sheet(name, &range))
    }
}

/// Split a cell range into a header row and data rows.
fn range_to_sheet(name: &str, range: &Range<Data>) -> RawSheet {
    let mut rows = range.rows();
    let headers: Vec<CellValue> = rows
        .next()
        .map(|row| row.iter().map(convert_cell).collect())
        .unwrap_or_default();

    let data: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    trace!("Sheet '{}': {} columns, {} rows", name, headers.len(), data.len());

    RawSheet {
        name: name.to_string(),
        headers,
        rows: data,
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match excel_serial_to_datetime(dt.as_f64()) {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
    }
}

/// Convert an Excel serial date (1900 system) to a timestamp.
///
/// Serial 60 is the fictitious 1900-02-29; the 1899-12-30 epoch makes every
/// serial from 61 onwards land on the right day.
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    // 2958465 is 9999-12-31.
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    epoch
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(seconds))
}
