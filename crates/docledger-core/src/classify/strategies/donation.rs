use chrono::Datelike;
use lazy_static::lazy_static;
use regex::Regex;

use super::{capture, compose_filename, period_label, required_amount, wrong_variant};
use crate::classify::strategy::{MatchContext, MatchOutcome, Strategy};
use crate::error::{ExtractionError, FilenameError};
use crate::models::{DocumentSpec, DocumentType, DonationSpec, SpecFields};
use crate::rules::{is_generic_rfc, labeled_value, parse_date, validate_rfc};

lazy_static! {
    static ref DONEE: Regex = Regex::new(r"(?im)^\s*donataria:\s*(.+?)\s*$").unwrap();
    static ref DONEE_RFC: Regex = Regex::new(
        r"(?i)\brfc(?:\s+de\s+la\s+donataria)?:?\s*([A-ZÑ&]{3,4}\d{6}[A-Z0-9]{3})\b"
    ).unwrap();
    static ref DONATION_AMOUNT: Regex = Regex::new(
        r"(?i)(?:importe|monto)(?:\s+del\s+donativo)?:?\s*(\$?\s*[\d,]+(?:\.\d{2})?)"
    ).unwrap();
}

/// Receipt issued by an authorized donee.
pub struct DonationReceipt;

impl DonationReceipt {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DonationReceipt {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for DonationReceipt {
    fn name(&self) -> &'static str {
        "donation_receipt"
    }

    fn matches(&self, content: &str) -> MatchOutcome {
        let upper = content.to_uppercase();
        (upper.contains("RECIBO DE DONATIVO")
            || (upper.contains("DONATIVO") && upper.contains("DONATARIA AUTORIZADA")))
        .into()
    }

    fn parse(&self, _context: &MatchContext, content: &str) -> Result<DocumentSpec, ExtractionError> {
        let raw_date =
            labeled_value(content, "Fecha").ok_or_else(|| ExtractionError::missing("Fecha"))?;
        let date = parse_date(&raw_date)
            .ok_or_else(|| ExtractionError::parse("Fecha", raw_date.as_str()))?;
        let amount = required_amount(content, &DONATION_AMOUNT, "Importe del donativo")?;

        let donee = capture(&DONEE, content).map(str::to_string);
        let donee_rfc = capture(&DONEE_RFC, content)
            .map(str::to_uppercase)
            .filter(|rfc| validate_rfc(rfc) && !is_generic_rfc(rfc));

        let label = donee.as_deref().or(donee_rfc.as_deref()).unwrap_or("sin donataria");
        Ok(DocumentSpec::Donation(DonationSpec {
            fields: SpecFields::default()
                .with_period(date.year(), date.month())
                .with_amount(Some(amount))
                .with_display(format!("Donativo {label}")),
            donee,
            donee_rfc,
        }))
    }

    fn suggest_filename(
        &self,
        spec: &DocumentSpec,
        original_name: Option<&str>,
    ) -> Result<String, FilenameError> {
        let DocumentSpec::Donation(donation) = spec else {
            return Err(wrong_variant(self.name(), DocumentType::Donation, spec));
        };
        let label = donation
            .donee_rfc
            .as_deref()
            .or(donation.donee.as_deref())
            .unwrap_or("");
        Ok(compose_filename(
            &[&period_label(&donation.fields), "Donativo", label],
            original_name,
        ))
    }
}
