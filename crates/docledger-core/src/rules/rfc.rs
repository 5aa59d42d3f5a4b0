//! RFC (Mexican tax id) extraction and validation.

use chrono::NaiveDate;

use super::FieldExtractor;
use super::patterns::RFC_PATTERN;

/// RFC used for sales to the general public.
pub const GENERIC_NATIONAL_RFC: &str = "XAXX010101000";

/// RFC used for foreign counterparties.
pub const GENERIC_FOREIGN_RFC: &str = "XEXX010101000";

/// RFC field extractor.
pub struct RfcExtractor {
    skip_generic: bool,
}

impl RfcExtractor {
    pub fn new() -> Self {
        Self { skip_generic: false }
    }

    /// Skip the generic public/foreign RFCs.
    pub fn skip_generic(mut self, skip: bool) -> Self {
        self.skip_generic = skip;
        self
    }
}

impl Default for RfcExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for RfcExtractor {
    type Output = String;

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<String> = Vec::new();

        for m in RFC_PATTERN.find_iter(text) {
            let rfc = m.as_str().to_string();
            if !validate_rfc(&rfc) || results.contains(&rfc) {
                continue;
            }
            if self.skip_generic && is_generic_rfc(&rfc) {
                continue;
            }
            results.push(rfc);
        }

        results
    }
}

/// First valid RFC in text, skipping the generic placeholders.
pub fn extract_rfc(text: &str) -> Option<String> {
    RfcExtractor::new().skip_generic(true).extract(text)
}

/// Validate RFC structure: 3-4 letters, a `yymmdd` date, 3-char homoclave.
pub fn validate_rfc(rfc: &str) -> bool {
    let rfc = rfc.trim();
    let Some(caps) = RFC_PATTERN.captures(rfc) else {
        return false;
    };
    if caps[0].len() != rfc.len() {
        return false;
    }

    let yy: i32 = caps[2].parse().unwrap_or(0);
    let mm: u32 = caps[3].parse().unwrap_or(0);
    let dd: u32 = caps[4].parse().unwrap_or(0);

    // Century is not encoded; accept the date if it exists in either.
    NaiveDate::from_ymd_opt(2000 + yy, mm, dd).is_some()
        || NaiveDate::from_ymd_opt(1900 + yy, mm, dd).is_some()
}

/// Whether the RFC is one of the generic placeholders.
pub fn is_generic_rfc(rfc: &str) -> bool {
    let rfc = rfc.trim();
    rfc.eq_ignore_ascii_case(GENERIC_NATIONAL_RFC) || rfc.eq_ignore_ascii_case(GENERIC_FOREIGN_RFC)
}
