//! Spreadsheet-to-record mapping.

use std::collections::HashMap;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, trace};

use super::dictionary::{CanonicalField, FieldDictionary};
use super::rules::parse_amount;
use crate::error::{RowError, SheetError};
use crate::models::record::{CanonicalRecord, RecordDraft, RecordKind, RecordSet};
use crate::report::{DiagnosticKind, DocumentReporter, Reporter, Severity, Unit};
use crate::tabular::{CellValue, RawSheet, TabularSource};

/// Maps classified sheets onto canonical records.
pub struct TabularExtractor<'d> {
    dictionary: &'d FieldDictionary,
}

impl<'d> TabularExtractor<'d> {
    pub fn new(dictionary: &'d FieldDictionary) -> Self {
        Self { dictionary }
    }

    /// Extract every record from `source`.
    ///
    /// Unknown, unreadable, or badly-headed sheets are skipped and reported;
    /// malformed rows are skipped and reported. Neither stops the scan.
    pub fn extract<S>(&self, source: &mut S, source_file: &str, reporter: &dyn Reporter) -> RecordSet
    where
        S: TabularSource + ?Sized,
    {
        let reporter = DocumentReporter::new(source_file, reporter);
        let mut records = RecordSet::new();

        for (index, name) in source.sheet_names().into_iter().enumerate() {
            let unit = Unit::Sheet { index, name: name.clone() };

            let Some(kind) = self.dictionary.classify_sheet(&name).record_kind() else {
                reporter.emit(unit, Severity::Info, DiagnosticKind::SheetSkipped, "skipping unknown sheet");
                continue;
            };

            let sheet = match source.read_sheet(&name) {
                Ok(sheet) => sheet,
                Err(e) => {
                    reporter.emit(unit, Severity::Error, DiagnosticKind::SheetUnparseable, e.to_string());
                    continue;
                }
            };

            let before = records.len();
            if let Err(e) = self.extract_sheet(kind, &sheet, &reporter, &mut records) {
                reporter.emit(unit, Severity::Error, DiagnosticKind::SheetUnparseable, e.to_string());
                continue;
            }

            info!(
                "Sheet '{}' ({:?}): {} records from {} rows",
                name,
                kind,
                records.len() - before,
                sheet.rows.len()
            );
        }

        info!(
            "Extracted {} contributions and {} expenditures from {}",
            records.contributions.len(),
            records.expenditures.len(),
            reporter.document()
        );
        records
    }

    fn extract_sheet(
        &self,
        kind: RecordKind,
        sheet: &RawSheet,
        reporter: &DocumentReporter<'_>,
        records: &mut RecordSet,
    ) -> Result<(), SheetError> {
        let columns = normalize_headers(sheet)?;
        debug!("Normalized {} columns for sheet '{}'", columns.len(), sheet.name);

        for (index, cells) in sheet.rows.iter().enumerate() {
            let row = RowView { columns: &columns, cells };
            match self.map_row(kind, &row, reporter.document()) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => trace!("Row {} of '{}': missing name or amount", index, sheet.name),
                Err(e) => reporter.emit(
                    Unit::Row { sheet: sheet.name.clone(), index },
                    Severity::Warning,
                    DiagnosticKind::RowMalformed,
                    e.to_string(),
                ),
            }
        }

        Ok(())
    }

    fn map_row(
        &self,
        kind: RecordKind,
        row: &RowView<'_>,
        source_file: &str,
    ) -> Result<Option<CanonicalRecord>, RowError> {
        let aliases = |field| self.dictionary.aliases(kind, field);

        let mut draft = RecordDraft::new(kind, source_file);
        draft.filer_name = row
            .resolve(aliases(CanonicalField::FilerName))
            .map(|(_, cell)| cell.to_text())
            .unwrap_or_default();

        let name_parts: Vec<String> = [CanonicalField::FirstName, CanonicalField::LastName]
            .into_iter()
            .filter_map(|field| row.resolve(aliases(field)))
            .map(|(_, cell)| cell.to_text())
            .collect();
        draft.name = name_parts.join(" ");

        // Unnamed rows (totals, footers) are dropped before the amount is read.
        if draft.name.trim().is_empty() {
            return Ok(None);
        }

        draft.amount = match row.resolve(aliases(CanonicalField::Amount)) {
            Some((column, cell)) => Some(coerce_amount(column, cell)?),
            None => None,
        };

        draft.date = row
            .resolve(aliases(CanonicalField::Date))
            .filter(|(_, cell)| !matches!(cell, CellValue::Error(_)))
            .map(|(_, cell)| cell.to_text());

        draft.description = row
            .resolve(aliases(CanonicalField::Description))
            .map(|(_, cell)| cell.to_text())
            .unwrap_or_default();

        Ok(draft.finish())
    }
}

/// Lower-cased, trimmed header name to column index. Empty headers are
/// dropped; any other non-text header fails the whole sheet.
fn normalize_headers(sheet: &RawSheet) -> Result<HashMap<String, usize>, SheetError> {
    let mut columns = HashMap::with_capacity(sheet.headers.len());

    for (column, header) in sheet.headers.iter().enumerate() {
        match header {
            CellValue::Empty => continue,
            CellValue::Text(text) if text.trim().is_empty() => continue,
            CellValue::Text(text) => {
                columns.entry(text.trim().to_lowercase()).or_insert(column);
            }
            other => {
                return Err(SheetError::Header {
                    sheet: sheet.name.clone(),
                    column,
                    found: format!("{:?}", other),
                });
            }
        }
    }

    Ok(columns)
}

/// One data row addressed by normalized column name.
struct RowView<'a> {
    columns: &'a HashMap<String, usize>,
    cells: &'a [CellValue],
}

impl<'a> RowView<'a> {
    fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.columns.get(column).and_then(|&i| self.cells.get(i))
    }

    /// First alias whose cell is present and not missing.
    fn resolve(&self, aliases: &'static [&'static str]) -> Option<(&'static str, &'a CellValue)> {
        aliases.iter().find_map(|&column| {
            self.get(column)
                .filter(|cell| !cell.is_missing())
                .map(|cell| (column, cell))
        })
    }
}

fn coerce_amount(column: &str, cell: &CellValue) -> Result<Decimal, RowError> {
    let malformed = || RowError::Amount {
        column: column.to_string(),
        value: cell.to_string(),
    };

    let amount = match cell {
        CellValue::Int(i) => Decimal::from(*i),
        CellValue::Float(f) => Decimal::from_f64(*f).ok_or_else(malformed)?,
        CellValue::Text(s) => parse_amount(s).ok_or_else(malformed)?,
        CellValue::Error(e) => {
            return Err(RowError::ErrorCell {
                column: column.to_string(),
                value: e.clone(),
            });
        }
        CellValue::Empty | CellValue::Bool(_) | CellValue::DateTime(_) => return Err(malformed()),
    };

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(RowError::NegativeAmount {
            column: column.to_string(),
            value: amount.to_string(),
        });
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingReporter;
    use crate::tabular::MemoryWorkbook;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    use crate::models::record::{Contribution, Expenditure};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn run(mut book: MemoryWorkbook) -> (RecordSet, CollectingReporter) {
        let dictionary = FieldDictionary::new();
        let reporter = CollectingReporter::new();
        let records = TabularExtractor::new(&dictionary).extract(&mut book, "rancho_2024.xlsx", &reporter);
        (records, reporter)
    }

    fn contribution_headers() -> Vec<&'static str> {
        vec!["FILER_NAML", "Tran_NamF", "Tran_NamL", "Tran_Amt1", "Tran_Date"]
    }

    #[test]
    fn test_contribution_sheet_end_to_end() {
        let sheet = RawSheet::new("A-Contributions")
            .with_headers(["filer_naml", "tran_namf", "tran_naml", "tran_amt1", "tran_date"])
            .with_cells(vec![
                CellValue::from("Acme PAC"),
                CellValue::from("Jane"),
                CellValue::from("Doe"),
                CellValue::Float(500.0),
                CellValue::from("2024-01-15"),
            ]);

        let (records, reporter) = run(MemoryWorkbook::new().with_sheet(sheet));

        assert_eq!(
            records.contributions,
            vec![Contribution {
                filer_name: "Acme PAC".to_string(),
                contributor_name: "Jane Doe".to_string(),
                contribution_amount: dec("500.0"),
                contribution_date: Some("2024-01-15".to_string()),
                source_file: "rancho_2024.xlsx".to_string(),
            }]
        );
        assert!(records.expenditures.is_empty());
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let sheet = RawSheet::new("C-Contributions")
            .with_headers(contribution_headers())
            .with_cells(vec![
                CellValue::from("Acme PAC"),
                CellValue::Empty,
                CellValue::from("Widget Corp"),
                CellValue::Int(75),
                CellValue::Empty,
            ]);

        let (records, _) = run(MemoryWorkbook::new().with_sheet(sheet));

        assert_eq!(records.contributions.len(), 1);
        assert_eq!(records.contributions[0].contributor_name, "Widget Corp");
        assert_eq!(records.contributions[0].contribution_amount, dec("75"));
        assert_eq!(records.contributions[0].contribution_date, None);
    }

    #[test]
    fn test_rows_missing_name_or_amount_are_dropped() {
        let sheet = RawSheet::new("A-Contributions")
            .with_headers(contribution_headers())
            .with_cells(vec![
                CellValue::from("Acme PAC"),
                CellValue::Empty,
                CellValue::from("  "),
                CellValue::Float(10.0),
                CellValue::Empty,
            ])
            .with_cells(vec![
                CellValue::from("Acme PAC"),
                CellValue::from("John"),
                CellValue::from("Roe"),
                CellValue::Empty,
                CellValue::Empty,
            ])
            .with_cells(vec![
                CellValue::from("Acme PAC"),
                CellValue::from("Ann"),
                CellValue::from("Lee"),
                CellValue::Float(20.0),
                CellValue::Empty,
            ]);

        let (records, reporter) = run(MemoryWorkbook::new().with_sheet(sheet));

        assert_eq!(records.contributions.len(), 1);
        assert_eq!(records.contributions[0].contributor_name, "Ann Lee");
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn test_expenditure_alias_fallbacks() {
        let sheet = RawSheet::new("F-Expenses")
            .with_headers(["filer_naml", "payee_naml", "amount", "amt_paid", "expn_date", "rpt_date", "expn_dscr", "tran_dscr"])
            .with_cells(vec![
                CellValue::from("Acme PAC"),
                CellValue::from("Print Shop"),
                CellValue::Empty,
                CellValue::from("$1,250.00"),
                CellValue::Empty,
                CellValue::from("2023-12-31"),
                CellValue::from(""),
                CellValue::from("Mailers"),
            ])
            .with_cells(vec![
                CellValue::from("Acme PAC"),
                CellValue::from("Venue LLC"),
                CellValue::Float(300.0),
                CellValue::Float(999.0),
                CellValue::from("2023-11-02"),
                CellValue::from("2023-12-31"),
                CellValue::from("Hall rental"),
                CellValue::from("ignored"),
            ]);

        let (records, _) = run(MemoryWorkbook::new().with_sheet(sheet));

        assert_eq!(
            records.expenditures,
            vec![
                Expenditure {
                    filer_name: "Acme PAC".to_string(),
                    payee_name: "Print Shop".to_string(),
                    expenditure_amount: dec("1250.00"),
                    expenditure_date: Some("2023-12-31".to_string()),
                    expenditure_description: "Mailers".to_string(),
                    source_file: "rancho_2024.xlsx".to_string(),
                },
                Expenditure {
                    filer_name: "Acme PAC".to_string(),
                    payee_name: "Venue LLC".to_string(),
                    expenditure_amount: dec("300"),
                    expenditure_date: Some("2023-11-02".to_string()),
                    expenditure_description: "Hall rental".to_string(),
                    source_file: "rancho_2024.xlsx".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_malformed_row_skips_only_that_row() {
        let sheet = RawSheet::new("E-Expenditure")
            .with_headers(["payee_naml", "amount"])
            .with_row(["Bad Amount Inc", "lots"])
            .with_cells(vec![CellValue::from("Refund Co"), CellValue::Float(-5.0)])
            .with_cells(vec![CellValue::from("Good Co"), CellValue::Float(12.34)]);

        let (records, reporter) = run(MemoryWorkbook::new().with_sheet(sheet));

        assert_eq!(records.expenditures.len(), 1);
        assert_eq!(records.expenditures[0].payee_name, "Good Co");

        let malformed = reporter.of_kind(DiagnosticKind::RowMalformed);
        assert_eq!(malformed.len(), 2);
        assert_eq!(
            malformed[0].unit,
            Unit::Row { sheet: "E-Expenditure".to_string(), index: 0 }
        );
        assert_eq!(malformed[1].unit, Unit::Row { sheet: "E-Expenditure".to_string(), index: 1 });
    }

    #[test]
    fn test_unnamed_footer_rows_are_not_malformed() {
        let sheet = RawSheet::new("E-Expenditure")
            .with_headers(["payee_naml", "amount"])
            .with_row(["Good Co", "12.34"])
            .with_row(["", "TOTAL"])
            .with_cells(vec![CellValue::Empty, CellValue::from("see attached")]);

        let (records, reporter) = run(MemoryWorkbook::new().with_sheet(sheet));

        assert_eq!(records.expenditures.len(), 1);
        assert_eq!(records.expenditures[0].payee_name, "Good Co");
        assert!(reporter.of_kind(DiagnosticKind::RowMalformed).is_empty());
    }

    #[test]
    fn test_unknown_sheet_is_skipped_without_error() {
        let notes = RawSheet::new("Notes")
            .with_headers(["payee_naml", "amount"])
            .with_cells(vec![CellValue::from("Someone"), CellValue::Float(1.0)]);

        let (records, reporter) = run(MemoryWorkbook::new().with_sheet(notes));

        assert!(records.is_empty());
        let skipped = reporter.of_kind(DiagnosticKind::SheetSkipped);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].severity, Severity::Info);
    }

    #[test]
    fn test_bad_sheet_does_not_abort_document() {
        let numeric_headers = RawSheet::new("C-Contributions")
            .with_headers([CellValue::Int(1), CellValue::Int(2)])
            .with_cells(vec![CellValue::from("x"), CellValue::Float(1.0)]);
        let good = RawSheet::new("D-Expenditure")
            .with_headers(["payee_namf", "payee_naml", "amount"])
            .with_row(["Sam", "Smith", "40.00"]);

        let book = MemoryWorkbook::new()
            .with_broken_sheet("A-Contributions", "corrupt xml")
            .with_sheet(numeric_headers)
            .with_sheet(good);
        let (records, reporter) = run(book);

        assert_eq!(records.expenditures.len(), 1);
        assert_eq!(records.expenditures[0].payee_name, "Sam Smith");
        assert_eq!(reporter.of_kind(DiagnosticKind::SheetUnparseable).len(), 2);
    }

    #[test]
    fn test_sheet_and_row_order_preserved() {
        let first = RawSheet::new("A-Contributions")
            .with_headers(["tran_naml", "tran_amt1"])
            .with_row(["One", "1.00"])
            .with_row(["Two", "2.00"]);
        let second = RawSheet::new("I-Contributions")
            .with_headers(["tran_naml", "tran_amt1"])
            .with_row(["Three", "3.00"]);

        let (records, _) = run(MemoryWorkbook::new().with_sheet(first).with_sheet(second));

        let names: Vec<&str> = records
            .contributions
            .iter()
            .map(|c| c.contributor_name.as_str())
            .collect();
        assert_eq!(names, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let sheet = RawSheet::new("A-Contributions")
            .with_headers(["tran_naml", "tran_amt1", "tran_date"])
            .with_row(["Short Row", "5.00"]);

        let (records, _) = run(MemoryWorkbook::new().with_sheet(sheet));

        assert_eq!(records.contributions.len(), 1);
        assert_eq!(records.contributions[0].contribution_date, None);
    }
}
