//! Common regex patterns for disclosure form extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Currency amount: optional "$", digit groups with optional thousands
    // separators, exactly two decimal places ("$1,234.56", "999.00").
    pub static ref AMOUNT_PATTERN: Regex = Regex::new(
        r"\$?\s*(\d+(?:,\d{3})*\.\d{2})"
    ).unwrap();

    // US month/day/year with one- or two-digit month and day.
    pub static ref DATE_MDY: Regex = Regex::new(
        r"(\d{1,2}/\d{1,2}/\d{2,4})"
    ).unwrap();

    // Filer-name anchor on the cover page.
    pub static ref FILER_ANCHOR: Regex = Regex::new(
        r"(?i)NAME\s+OF\s+FILER"
    ).unwrap();
}
