//! Date token recognition for disclosure schedules.
//!
//! Dates are kept as the literal token found in the text. Only the US
//! month/day/year shape is recognized and no calendar validation is done,
//! so "13/45/99" is accepted and ISO "2024-03-04" is not.

use super::patterns::DATE_MDY;
use super::{ExtractionMatch, FieldExtractor};

/// Date token extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let m = DATE_MDY.find(text)?;
        Some(ExtractionMatch::new(m.as_str().to_string(), m.as_str()).with_position(m.start(), m.end()))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        DATE_MDY
            .find_iter(text)
            .map(|m| {
                ExtractionMatch::new(m.as_str().to_string(), m.as_str())
                    .with_position(m.start(), m.end())
            })
            .collect()
    }
}

/// Find the first date token in `text`.
pub fn find_date(text: &str) -> Option<String> {
    DateExtractor::new().extract(text).map(|m| m.value)
}
