//! Utility receipts: CFE electricity and Telmex phone bills.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{trace, warn};

use super::{capture, compose_filename, period_label, required_amount, wrong_variant};
use crate::classify::strategy::{MatchContext, MatchOutcome, Strategy};
use crate::error::{ExtractionError, FilenameError};
use crate::models::{DocumentSpec, DocumentType, LookupTables, ReceiptSpec, SpecFields};
use crate::rules::amounts::money_tokens;
use crate::rules::{extract_block, labeled_amount, month_from_name, parse_abbreviated_date};

/// Marker of the CFE amount block.
const CFE_TOTAL_MARKER: &str = "TOTAL A PAGAR";
/// Width and height of the block printed under [`CFE_TOTAL_MARKER`].
const CFE_TOTAL_BLOCK: (usize, usize) = (16, 1);

lazy_static! {
    static ref CFE_SERVICE: Regex =
        Regex::new(r"(?i)no\.\s*de\s*servicio:?\s*(\d{12})\b").unwrap();
    static ref CFE_PERIOD: Regex = Regex::new(
        r"(?i)periodo\s+facturado:?\s*(\d{1,2})\s+([a-z]{3})\s+(\d{2,4})\s*-\s*(\d{1,2})\s+([a-z]{3})\s+(\d{2,4})"
    ).unwrap();
    // Same-line amount, for converters that do not keep the block layout.
    static ref CFE_INLINE_TOTAL: Regex =
        Regex::new(r"TOTAL A PAGAR:?[ \t]*(\$[ \t]*[\d,]+(?:\.\d{2})?)").unwrap();

    static ref TELMEX_PHONE: Regex =
        Regex::new(r"(?i)tel[eé]fono:?\s*(\d[\d ]{8,14}\d)").unwrap();
    static ref TELMEX_MONTH: Regex = Regex::new(
        r"(?i)mes\s+de\s+facturaci[oó]n:?\s*([a-záéíóú]+)\s+(?:de\s+)?(\d{4})"
    ).unwrap();
    static ref TELMEX_TOTAL: Regex =
        Regex::new(r"(?i)total\s+a\s+pagar:?\s*(\$?\s*[\d,]+(?:\.\d{2})?)").unwrap();
}

/// CFE (Comisión Federal de Electricidad) electricity receipt.
pub struct CfeReceipt {
    tables: Arc<LookupTables>,
}

impl CfeReceipt {
    pub fn new(tables: Arc<LookupTables>) -> Self {
        Self { tables }
    }

    /// Amount from the block under the total marker, else the same line.
    fn total(content: &str) -> Result<i64, ExtractionError> {
        let (width, height) = CFE_TOTAL_BLOCK;
        let from_block = extract_block(content, CFE_TOTAL_MARKER, width, height)
            .and_then(|block| money_tokens(&block).first().map(|(cents, _, _)| *cents));
        if let Some(cents) = from_block {
            return Ok(cents);
        }

        trace!("No amount block under {}, trying inline", CFE_TOTAL_MARKER);
        labeled_amount(content, &CFE_INLINE_TOTAL)
            .ok_or_else(|| ExtractionError::missing(CFE_TOTAL_MARKER))
    }
}

impl Strategy for CfeReceipt {
    fn name(&self) -> &'static str {
        "cfe_receipt"
    }

    fn matches(&self, content: &str) -> MatchOutcome {
        let upper = content.to_uppercase();
        (upper.contains("NO. DE SERVICIO") && upper.contains("PERIODO FACTURADO")).into()
    }

    fn parse(&self, _context: &MatchContext, content: &str) -> Result<DocumentSpec, ExtractionError> {
        let service = capture(&CFE_SERVICE, content)
            .ok_or_else(|| ExtractionError::missing("NO. DE SERVICIO"))?;

        let period = CFE_PERIOD
            .captures(content)
            .ok_or_else(|| ExtractionError::missing("PERIODO FACTURADO"))?;
        let period_end = parse_abbreviated_date(&period[4], &period[5], &period[6])
            .ok_or_else(|| ExtractionError::parse("PERIODO FACTURADO", &period[0]))?;
        let period_start = parse_abbreviated_date(&period[1], &period[2], &period[3]);

        let amount = Self::total(content)?;

        let property = self.tables.property_for_service(service).map(str::to_string);
        if property.is_none() {
            warn!("CFE service {} is not in the lookup table", service);
        }

        Ok(DocumentSpec::Receipt(ReceiptSpec {
            fields: receipt_fields(period_end, amount)
                .with_account(Some(service.to_string()))
                .with_property(property)
                .with_display(format!("CFE {} {}", service, period_end.format("%Y-%m"))),
            provider: "CFE".to_string(),
            service_number: Some(service.to_string()),
            period_start,
            period_end: Some(period_end),
        }))
    }

    fn suggest_filename(
        &self,
        spec: &DocumentSpec,
        original_name: Option<&str>,
    ) -> Result<String, FilenameError> {
        receipt_filename(self.name(), spec, original_name)
    }
}

/// Telmex landline bill.
pub struct TelmexReceipt {
    tables: Arc<LookupTables>,
}

impl TelmexReceipt {
    pub fn new(tables: Arc<LookupTables>) -> Self {
        Self { tables }
    }
}

impl Strategy for TelmexReceipt {
    fn name(&self) -> &'static str {
        "telmex_receipt"
    }

    fn matches(&self, content: &str) -> MatchOutcome {
        let upper = content.to_uppercase();
        ((upper.contains("TELMEX") || upper.contains("TELÉFONOS DE MÉXICO"))
            && upper.contains("TOTAL A PAGAR"))
        .into()
    }

    fn parse(&self, _context: &MatchContext, content: &str) -> Result<DocumentSpec, ExtractionError> {
        let phone: String = capture(&TELMEX_PHONE, content)
            .ok_or_else(|| ExtractionError::missing("Teléfono"))?
            .chars()
            .filter(char::is_ascii_digit)
            .collect();

        let billing = TELMEX_MONTH
            .captures(content)
            .ok_or_else(|| ExtractionError::missing("Mes de facturación"))?;
        let month = month_from_name(&billing[1])
            .ok_or_else(|| ExtractionError::parse("Mes de facturación", &billing[1]))?;
        let year: i32 = billing[2]
            .parse()
            .map_err(|_| ExtractionError::parse("Mes de facturación", &billing[2]))?;

        let amount = required_amount(content, &TELMEX_TOTAL, "Total a pagar")?;

        let property = self.tables.property_for_service(&phone).map(str::to_string);
        if property.is_none() {
            warn!("Telmex line {} is not in the lookup table", phone);
        }

        Ok(DocumentSpec::Receipt(ReceiptSpec {
            fields: SpecFields::default()
                .with_period(year, month)
                .with_amount(Some(amount))
                .with_account(Some(phone.clone()))
                .with_property(property)
                .with_display(format!("Telmex {phone} {year}-{month:02}")),
            provider: "TELMEX".to_string(),
            service_number: Some(phone),
            period_start: None,
            period_end: None,
        }))
    }

    fn suggest_filename(
        &self,
        spec: &DocumentSpec,
        original_name: Option<&str>,
    ) -> Result<String, FilenameError> {
        receipt_filename(self.name(), spec, original_name)
    }
}

/// Receipts are filed under the month the billed period ends in.
fn receipt_fields(period_end: NaiveDate, amount: i64) -> SpecFields {
    SpecFields::default()
        .with_period(period_end.year(), period_end.month())
        .with_amount(Some(amount))
}

fn receipt_filename(
    strategy: &str,
    spec: &DocumentSpec,
    original_name: Option<&str>,
) -> Result<String, FilenameError> {
    let DocumentSpec::Receipt(receipt) = spec else {
        return Err(wrong_variant(strategy, DocumentType::Receipt, spec));
    };
    let label = receipt
        .fields
        .property_key
        .as_deref()
        .or(receipt.service_number.as_deref())
        .unwrap_or("");
    Ok(compose_filename(
        &[&period_label(&receipt.fields), &receipt.provider, label],
        original_name,
    ))
}
