//! Strategies of the standard detector set.

mod annotation;
mod attachment;
mod cfdi;
mod donation;
mod expense;
mod invoice;
mod receipt;
mod statement;
mod tax;

pub use annotation::MonthlyNote;
pub use attachment::{BankCfdiAttachment, SatTaxNotice};
pub use cfdi::{CfdiRule, CfdiStrategy};
pub use donation::DonationReceipt;
pub use expense::{CashVoucher, CfdiExpense};
pub use invoice::{GenericCfdiInvoice, OwnCfdiInvoice};
pub use receipt::{CfeReceipt, TelmexReceipt};
pub use statement::{BbvaAccountStatement, BbvaCardStatement};
pub use tax::{PropertyTax, SatBankPayment};

use std::path::Path;

use regex::Regex;

use crate::error::{ExtractionError, FilenameError};
use crate::models::{DocumentSpec, DocumentType, SpecFields};
use crate::rules::{amount_to_cents, collapse_whitespace};

/// `yyyy-mm`, `yyyy` or `sin-fecha`, depending on what the spec knows.
pub(crate) fn period_label(fields: &SpecFields) -> String {
    match (fields.year, fields.month) {
        (Some(year), Some(month)) => format!("{year:04}-{month:02}"),
        (Some(year), None) => format!("{year:04}"),
        _ => "sin-fecha".to_string(),
    }
}

/// Lowercased extension of `original_name`, if any.
pub(crate) fn extension(original_name: Option<&str>) -> Option<String> {
    let ext = Path::new(original_name?).extension()?.to_str()?;
    Some(ext.to_lowercase())
}

/// Join the non-empty `parts` with spaces and append the original extension.
pub(crate) fn compose_filename(parts: &[&str], original_name: Option<&str>) -> String {
    let stem = parts
        .iter()
        .map(|part| sanitize(part))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    match extension(original_name) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn sanitize(part: &str) -> String {
    collapse_whitespace(&part.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "-"))
}

pub(crate) fn wrong_variant(
    strategy: &str,
    expected: DocumentType,
    found: &DocumentSpec,
) -> FilenameError {
    FilenameError::WrongVariant {
        strategy: strategy.to_string(),
        expected: expected.to_string(),
        found: found.document_type().to_string(),
    }
}

/// Whether `content` is XML rather than printed text. Text strategies in
/// detectors that also accept XML must not claim markup.
pub(crate) fn is_markup(content: &str) -> bool {
    content.trim_start().starts_with('<')
}

/// First capture group of `pattern` in `text`.
pub(crate) fn capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Amount captured by `pattern`, failing with `concept` when absent or
/// unparsable.
pub(crate) fn required_amount(
    text: &str,
    pattern: &Regex,
    concept: &str,
) -> Result<i64, ExtractionError> {
    let raw = capture(pattern, text).ok_or_else(|| ExtractionError::missing(concept))?;
    amount_to_cents(raw).ok_or_else(|| ExtractionError::parse(concept, raw))
}
