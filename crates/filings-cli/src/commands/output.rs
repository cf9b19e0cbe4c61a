//! Output formatting for extracted records.

use filings_core::{Diagnostic, RecordSet};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per record
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn format_records(records: &RecordSet, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Csv => format_csv(records),
        OutputFormat::Text => Ok(format_text(records)),
    }
}

fn format_csv(records: &RecordSet) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "kind",
        "filer_name",
        "name",
        "amount",
        "date",
        "description",
        "source_file",
    ])?;

    for c in &records.contributions {
        wtr.write_record([
            "contribution",
            &c.filer_name,
            &c.contributor_name,
            &c.contribution_amount.to_string(),
            c.contribution_date.as_deref().unwrap_or(""),
            "",
            &c.source_file,
        ])?;
    }

    for e in &records.expenditures {
        wtr.write_record([
            "expenditure",
            &e.filer_name,
            &e.payee_name,
            &e.expenditure_amount.to_string(),
            e.expenditure_date.as_deref().unwrap_or(""),
            &e.expenditure_description,
            &e.source_file,
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(records: &RecordSet) -> String {
    let mut output = String::new();

    output.push_str(&format!("Contributions: {}\n", records.contributions.len()));
    for c in &records.contributions {
        output.push_str(&format!(
            "  {:<30} {:>12}  {:<10}  filer: {}\n",
            c.contributor_name,
            c.contribution_amount,
            c.contribution_date.as_deref().unwrap_or("-"),
            c.filer_name
        ));
    }
    output.push('\n');

    output.push_str(&format!("Expenditures: {}\n", records.expenditures.len()));
    for e in &records.expenditures {
        output.push_str(&format!(
            "  {:<30} {:>12}  {:<10}  {}\n",
            e.payee_name,
            e.expenditure_amount,
            e.expenditure_date.as_deref().unwrap_or("-"),
            e.expenditure_description
        ));
    }

    output
}

/// One line per diagnostic, for "why is this empty" summaries.
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  - {}: {}", d.unit, d.message))
        .collect::<Vec<_>>()
        .join("\n")
}
