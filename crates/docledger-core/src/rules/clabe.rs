//! CLABE (Mexican interbank account number) extraction and validation.

use super::FieldExtractor;
use super::patterns::CLABE_PATTERN;

/// CLABE field extractor. Only numbers with a valid check digit are kept.
pub struct ClabeExtractor;

impl ClabeExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClabeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for ClabeExtractor {
    type Output = String;

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        CLABE_PATTERN
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .filter(|clabe| validate_clabe(clabe))
            .collect()
    }
}

/// Extract the first valid CLABE from text.
pub fn extract_clabe(text: &str) -> Option<String> {
    ClabeExtractor::new().extract(text)
}

/// Validate a CLABE using the weighted 3-7-1 checksum.
///
/// CLABE format: bank (3) + branch (3) + account (11) + check digit (1).
pub fn validate_clabe(clabe: &str) -> bool {
    let digits: Vec<u32> = clabe.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 18 || clabe.chars().count() != 18 {
        return false;
    }

    let weights = [3, 7, 1];
    let sum: u32 = digits
        .iter()
        .take(17)
        .zip(weights.iter().cycle())
        .map(|(d, w)| (d * w) % 10)
        .sum();

    (10 - sum % 10) % 10 == digits[17]
}

/// Account segment of a valid CLABE.
pub fn account_from_clabe(clabe: &str) -> Option<String> {
    if !validate_clabe(clabe) {
        return None;
    }
    Some(clabe[6..17].to_string())
}
