//! Attachments: SAT declaration acknowledgements and bank-issued CFDIs.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::cfdi::CfdiRule;
use super::{capture, compose_filename, is_markup, period_label, wrong_variant};
use crate::cfdi::TaxDocument;
use crate::classify::strategy::{MatchContext, MatchOutcome, Strategy};
use crate::error::{ExtractionError, FilenameError};
use crate::models::{
    AttachmentKind, AttachmentSpec, DocumentSpec, DocumentType, LookupTables, SpecFields,
};
use crate::rules::{extract_rfc, labeled_amount, month_from_name};

/// BBVA México.
const BBVA_RFC: &str = "BBA830831LJ2";
/// Banco Nacional de México (Citibanamex).
const BANAMEX_RFC: &str = "BNM840515VB1";
/// Banco Santander México.
const SANTANDER_RFC: &str = "BSM970519DU8";

lazy_static! {
    static ref DECLARATION_MONTH: Regex =
        Regex::new(r"(?i)per[ií]odo\s+de\s+la\s+declaraci[oó]n:?\s*([a-záéíóú]+)").unwrap();
    static ref FISCAL_YEAR: Regex = Regex::new(r"(?i)ejercicio:?\s*(\d{4})").unwrap();
    static ref AMOUNT_DUE: Regex =
        Regex::new(r"(?i)a\s+pagar:?\s*(\$?\s*[\d,]+(?:\.\d+)?)").unwrap();
    static ref OPERATION_NUMBER: Regex =
        Regex::new(r"(?i)n[uú]mero\s+de\s+operaci[oó]n:?\s*(\d+)").unwrap();
}

/// Acknowledgement ("acuse de recibo") of a monthly declaration.
pub struct SatTaxNotice;

impl SatTaxNotice {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SatTaxNotice {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for SatTaxNotice {
    fn name(&self) -> &'static str {
        "sat_tax_notice"
    }

    fn matches(&self, content: &str) -> MatchOutcome {
        if is_markup(content) {
            return MatchOutcome::NotMatched;
        }
        let upper = content.to_uppercase();
        (upper.contains("ACUSE DE RECIBO") && upper.contains("DECLARACI")).into()
    }

    fn parse(&self, _context: &MatchContext, content: &str) -> Result<DocumentSpec, ExtractionError> {
        let month_name = capture(&DECLARATION_MONTH, content)
            .ok_or_else(|| ExtractionError::missing("Período de la declaración"))?;
        let month = month_from_name(month_name)
            .ok_or_else(|| ExtractionError::parse("Período de la declaración", month_name))?;

        let year_raw =
            capture(&FISCAL_YEAR, content).ok_or_else(|| ExtractionError::missing("Ejercicio"))?;
        let year: i32 = year_raw
            .parse()
            .map_err(|_| ExtractionError::parse("Ejercicio", year_raw))?;

        let amount = labeled_amount(content, &AMOUNT_DUE);
        let operation = capture(&OPERATION_NUMBER, content).map(|op| format!("Operación {op}"));
        debug!("Tax notice for {}-{:02}, amount {:?}", year, month, amount);

        Ok(DocumentSpec::Attachment(AttachmentSpec {
            fields: SpecFields::default()
                .with_period(year, month)
                .with_amount(amount)
                .with_display(format!("Acuse SAT {year}-{month:02}"))
                .with_description(operation),
            kind: AttachmentKind::TaxNotice,
            issuer_rfc: extract_rfc(content),
        }))
    }

    fn suggest_filename(
        &self,
        spec: &DocumentSpec,
        original_name: Option<&str>,
    ) -> Result<String, FilenameError> {
        let DocumentSpec::Attachment(attachment) = spec else {
            return Err(wrong_variant(self.name(), DocumentType::Attachment, spec));
        };
        Ok(compose_filename(
            &[&period_label(&attachment.fields), "Acuse SAT"],
            original_name,
        ))
    }
}

/// CFDI issued by a known bank to one of our RFCs (commissions, interest
/// statements, withholding certificates).
pub struct BankCfdiAttachment {
    tables: Arc<LookupTables>,
}

impl BankCfdiAttachment {
    pub fn new(tables: Arc<LookupTables>) -> Self {
        Self { tables }
    }
}

impl CfdiRule for BankCfdiAttachment {
    fn name(&self) -> &'static str {
        "bank_cfdi_attachment"
    }

    fn specific_match(&self, document: &TaxDocument) -> bool {
        self.tables.is_own_rfc(&document.recipient_rfc)
            && self.tables.bank_account(&document.issuer_rfc).is_some()
    }

    fn build(&self, document: &TaxDocument) -> Result<DocumentSpec, ExtractionError> {
        let account = self
            .tables
            .bank_account(&document.issuer_rfc)
            .ok_or_else(|| ExtractionError::missing("bank account"))?;

        let display = match document.issuer_rfc.as_str() {
            BBVA_RFC => format!("BBVA comisiones {account}"),
            BANAMEX_RFC => format!("Banamex constancia {account}"),
            SANTANDER_RFC => format!("Santander comisiones {account}"),
            _ => format!(
                "{} {}",
                document.issuer_name.as_deref().unwrap_or(&document.issuer_rfc),
                account
            ),
        };

        Ok(DocumentSpec::Attachment(AttachmentSpec {
            fields: SpecFields::default()
                .with_period(document.year(), document.month())
                .with_amount(Some(document.total))
                .with_account(Some(account.to_string()))
                .with_display(display)
                .with_description(document.first_concept().map(str::to_string)),
            kind: AttachmentKind::BankCfdi,
            issuer_rfc: Some(document.issuer_rfc.clone()),
        }))
    }

    fn filename_parts(&self, spec: &DocumentSpec) -> Result<Vec<String>, FilenameError> {
        let DocumentSpec::Attachment(attachment) = spec else {
            return Err(wrong_variant(self.name(), DocumentType::Attachment, spec));
        };
        Ok(vec![
            period_label(&attachment.fields),
            attachment.fields.display_filename.clone().unwrap_or_default(),
        ])
    }
}
