//! Common regex patterns for document field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Money token: "$1,234.56", "- $14.05", "300,000", "3371"
    pub static ref MONEY: Regex = Regex::new(
        r"-?\s*\$?\s*\d{1,3}(?:,\d{3})+(?:\.\d+)?|-?\s*\$?\s*\d+(?:\.\d+)?"
    ).unwrap();

    // Dates
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b"
    ).unwrap();

    pub static ref DATE_ABBREVIATED: Regex = Regex::new(
        r"\b(\d{1,2})[-/ ]([A-Za-z]{3})[-/ ](\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_LONG: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\s+de\s+([a-záéíóú]+)\s+(?:de|del)\s+(\d{4})\b"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})-(\d{2})-(\d{2})"
    ).unwrap();

    // RFC (Mexican tax id): 3 letters for companies, 4 for individuals
    pub static ref RFC_PATTERN: Regex = Regex::new(
        r"\b([A-ZÑ&]{3,4})(\d{2})(\d{2})(\d{2})([A-Z0-9]{3})\b"
    ).unwrap();

    // CLABE interbank account number
    pub static ref CLABE_PATTERN: Regex = Regex::new(
        r"\b(\d{18})\b"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}
