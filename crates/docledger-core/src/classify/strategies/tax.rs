//! Tax payments: federal payments through a bank and municipal property tax.

use std::sync::Arc;

use chrono::Datelike;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use super::{capture, compose_filename, period_label, required_amount, wrong_variant};
use crate::classify::strategy::{MatchContext, MatchOutcome, Strategy};
use crate::error::{ExtractionError, FilenameError};
use crate::models::{DocumentSpec, DocumentType, LookupTables, SpecFields, TaxKind, TaxSpec};
use crate::rules::{format_cents, labeled_value, month_from_name, parse_date};

lazy_static! {
    static ref PAYMENT_PERIOD: Regex =
        Regex::new(r"(?i)\bper[ií]odo:?\s*([a-záéíóú]+)").unwrap();
    static ref FISCAL_YEAR: Regex = Regex::new(r"(?i)ejercicio:?\s*(\d{4})").unwrap();
    static ref PAID_AMOUNT: Regex = Regex::new(
        r"(?i)(?:importe\s+total\s+pagado|total\s+efectivamente\s+pagado|importe\s+pagado):?\s*(\$?\s*[\d,]+(?:\.\d{2})?)"
    ).unwrap();

    static ref TAX_ACCOUNT: Regex =
        Regex::new(r"(?i)(?:cuenta\s+predial|clave\s+catastral):?\s*([0-9A-Z][0-9A-Z-]*)").unwrap();
    static ref PROPERTY_TAX_YEAR: Regex = Regex::new(r"(?i)impuesto\s+predial\s+(\d{4})").unwrap();
    static ref PROPERTY_TAX_TOTAL: Regex = Regex::new(
        r"(?i)total\s+(?:a\s+pagar|pagado):?\s*(\$?\s*[\d,]+(?:\.\d{2})?)"
    ).unwrap();
}

/// Bank receipt for federal taxes paid with a capture line.
pub struct SatBankPayment;

impl SatBankPayment {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SatBankPayment {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for SatBankPayment {
    fn name(&self) -> &'static str {
        "sat_bank_payment"
    }

    fn matches(&self, content: &str) -> MatchOutcome {
        content
            .to_uppercase()
            .contains("RECIBO BANCARIO DE PAGO DE CONTRIBUCIONES")
            .into()
    }

    fn parse(&self, _context: &MatchContext, content: &str) -> Result<DocumentSpec, ExtractionError> {
        let year_raw =
            capture(&FISCAL_YEAR, content).ok_or_else(|| ExtractionError::missing("Ejercicio"))?;
        let year: i32 = year_raw
            .parse()
            .map_err(|_| ExtractionError::parse("Ejercicio", year_raw))?;

        // Annual payments carry no month.
        let month = capture(&PAYMENT_PERIOD, content)
            .map(|name| month_from_name(name).ok_or_else(|| ExtractionError::parse("Periodo", name)))
            .transpose()?;

        let amount = required_amount(content, &PAID_AMOUNT, "Importe total pagado")?;
        let capture_line = labeled_value(content, "de captura").map(|line| line.replace(' ', ""));

        let fields = SpecFields {
            year: Some(year),
            month,
            ..SpecFields::default()
        }
        .with_amount(Some(amount))
        .with_description(capture_line.as_ref().map(|line| format!("Línea de captura {line}")));
        let display = format!("Pago SAT {}", period_label(&fields));
        let fields = fields.with_display(display);

        Ok(DocumentSpec::Tax(TaxSpec {
            fields,
            kind: TaxKind::FederalPayment,
            capture_line,
        }))
    }

    fn suggest_filename(
        &self,
        spec: &DocumentSpec,
        original_name: Option<&str>,
    ) -> Result<String, FilenameError> {
        let DocumentSpec::Tax(tax) = spec else {
            return Err(wrong_variant(self.name(), DocumentType::Tax, spec));
        };
        let amount = tax.fields.amount.map(format_cents).unwrap_or_default();
        Ok(compose_filename(
            &[&period_label(&tax.fields), "Pago SAT", &amount],
            original_name,
        ))
    }
}

/// Municipal property tax ("impuesto predial") receipt.
pub struct PropertyTax {
    tables: Arc<LookupTables>,
}

impl PropertyTax {
    pub fn new(tables: Arc<LookupTables>) -> Self {
        Self { tables }
    }
}

impl Strategy for PropertyTax {
    fn name(&self) -> &'static str {
        "property_tax"
    }

    fn matches(&self, content: &str) -> MatchOutcome {
        content.to_uppercase().contains("IMPUESTO PREDIAL").into()
    }

    fn parse(&self, _context: &MatchContext, content: &str) -> Result<DocumentSpec, ExtractionError> {
        let account = capture(&TAX_ACCOUNT, content)
            .ok_or_else(|| ExtractionError::missing("Cuenta predial"))?;

        let year_raw = capture(&FISCAL_YEAR, content)
            .or_else(|| capture(&PROPERTY_TAX_YEAR, content))
            .ok_or_else(|| ExtractionError::missing("Ejercicio"))?;
        let year: i32 = year_raw
            .parse()
            .map_err(|_| ExtractionError::parse("Ejercicio", year_raw))?;

        let month = labeled_value(content, "Fecha de pago")
            .and_then(|raw| parse_date(&raw))
            .map(|date| date.month());
        let amount = required_amount(content, &PROPERTY_TAX_TOTAL, "Total")?;

        let property = self.tables.property_for_tax_account(account).map(str::to_string);
        if property.is_none() {
            warn!("Property tax account {} is not in the lookup table", account);
        }

        let label = property.clone().unwrap_or_else(|| account.to_string());
        Ok(DocumentSpec::Tax(TaxSpec {
            fields: SpecFields {
                year: Some(year),
                month,
                ..SpecFields::default()
            }
            .with_amount(Some(amount))
            .with_account(Some(account.to_string()))
            .with_property(property)
            .with_display(format!("Predial {year} {label}")),
            kind: TaxKind::PropertyTax,
            capture_line: None,
        }))
    }

    fn suggest_filename(
        &self,
        spec: &DocumentSpec,
        original_name: Option<&str>,
    ) -> Result<String, FilenameError> {
        let DocumentSpec::Tax(tax) = spec else {
            return Err(wrong_variant(self.name(), DocumentType::Tax, spec));
        };
        let label = tax
            .fields
            .property_key
            .as_deref()
            .or(tax.fields.account_number.as_deref())
            .unwrap_or("");
        Ok(compose_filename(
            &[&period_label(&tax.fields), "Predial", label],
            original_name,
        ))
    }
}
