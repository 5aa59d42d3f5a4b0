//! Rule-based field extractors for Mexican financial documents.

pub mod amounts;
pub mod blocks;
pub mod clabe;
pub mod dates;
pub mod patterns;
pub mod rfc;

pub use amounts::{amount_to_cents, format_cents, labeled_amount};
pub use blocks::{collapse_whitespace, extract_block, labeled_value};
pub use clabe::{account_from_clabe, extract_clabe, validate_clabe, ClabeExtractor};
pub use dates::{
    expand_year, month_from_abbreviation, month_from_name, parse_abbreviated_date, parse_date,
    parse_iso_date, DateExtractor,
};
pub use rfc::{extract_rfc, is_generic_rfc, validate_rfc, RfcExtractor};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}
