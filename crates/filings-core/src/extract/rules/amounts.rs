//! Amount recognition for disclosure schedules.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::AMOUNT_PATTERN;
use super::{ExtractionMatch, FieldExtractor};

/// Currency amount extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let caps = AMOUNT_PATTERN.captures(text)?;
        let full_match = caps.get(0)?;
        let amount = parse_amount(&caps[1])?;
        Some(
            ExtractionMatch::new(amount, full_match.as_str())
                .with_position(full_match.start(), full_match.end()),
        )
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        AMOUNT_PATTERN
            .captures_iter(text)
            .filter_map(|caps| {
                let full_match = caps.get(0)?;
                let amount = parse_amount(&caps[1])?;
                Some(
                    ExtractionMatch::new(amount, full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                )
            })
            .collect()
    }
}

/// Find the first amount token in `text`.
pub fn find_amount(text: &str) -> Option<ExtractionMatch<Decimal>> {
    AmountExtractor::new().extract(text)
}

/// Remove every amount token from `text` and trim the remainder.
pub fn strip_amounts(text: &str) -> String {
    AMOUNT_PATTERN.replace_all(text, "").trim().to_string()
}

/// Parse a US-formatted amount (e.g., "$1,234.56", "1234.56", "500").
///
/// Currency signs, grouping commas, and whitespace are dropped. A leading
/// minus or surrounding parentheses mark a negative value.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    let negative = trimmed.starts_with('-')
        || (trimmed.starts_with('(') && trimmed.ends_with(')'));

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() || trimmed.chars().any(|c| c.is_alphabetic()) {
        return None;
    }

    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}
