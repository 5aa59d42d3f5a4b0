//! Invoices: CFDIs we issued, and any other CFDI as a fallback.

use std::sync::Arc;

use super::cfdi::CfdiRule;
use super::{period_label, wrong_variant};
use crate::cfdi::TaxDocument;
use crate::error::{ExtractionError, FilenameError};
use crate::models::{DocumentSpec, DocumentType, InvoiceSpec, LookupTables, SpecFields};

/// CFDI issued by one of our RFCs.
pub struct OwnCfdiInvoice {
    tables: Arc<LookupTables>,
}

impl OwnCfdiInvoice {
    pub fn new(tables: Arc<LookupTables>) -> Self {
        Self { tables }
    }
}

impl CfdiRule for OwnCfdiInvoice {
    fn name(&self) -> &'static str {
        "own_cfdi_invoice"
    }

    fn specific_match(&self, document: &TaxDocument) -> bool {
        self.tables.is_own_rfc(&document.issuer_rfc)
    }

    fn build(&self, document: &TaxDocument) -> Result<DocumentSpec, ExtractionError> {
        let recipient = document
            .recipient_name
            .as_deref()
            .unwrap_or(&document.recipient_rfc);
        let display = format!("Factura {} {}", document_number(document), recipient);
        Ok(invoice_spec(document, display))
    }

    fn filename_parts(&self, spec: &DocumentSpec) -> Result<Vec<String>, FilenameError> {
        let invoice = expect_invoice(self.name(), spec)?;
        Ok(vec![
            period_label(&invoice.fields),
            "Factura".to_string(),
            spec_number(invoice),
            invoice.recipient_rfc.clone().unwrap_or_default(),
        ])
    }
}

/// Any CFDI no earlier rule claimed. Registered last.
pub struct GenericCfdiInvoice;

impl GenericCfdiInvoice {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GenericCfdiInvoice {
    fn default() -> Self {
        Self::new()
    }
}

impl CfdiRule for GenericCfdiInvoice {
    fn name(&self) -> &'static str {
        "generic_cfdi_invoice"
    }

    fn specific_match(&self, _document: &TaxDocument) -> bool {
        true
    }

    fn build(&self, document: &TaxDocument) -> Result<DocumentSpec, ExtractionError> {
        let issuer = document.issuer_name.as_deref().unwrap_or(&document.issuer_rfc);
        let display = format!("CFDI {} {}", issuer, document_number(document));
        Ok(invoice_spec(document, display))
    }

    fn filename_parts(&self, spec: &DocumentSpec) -> Result<Vec<String>, FilenameError> {
        let invoice = expect_invoice(self.name(), spec)?;
        Ok(vec![
            period_label(&invoice.fields),
            "CFDI".to_string(),
            invoice.issuer_rfc.clone().unwrap_or_default(),
            spec_number(invoice),
        ])
    }
}

fn invoice_spec(document: &TaxDocument, display: String) -> DocumentSpec {
    DocumentSpec::Invoice(InvoiceSpec {
        fields: SpecFields::default()
            .with_period(document.year(), document.month())
            .with_amount(Some(document.total))
            .with_display(display)
            .with_description(document.first_concept().map(str::to_string)),
        series: document.series.clone(),
        folio: document.folio.clone(),
        issuer_rfc: Some(document.issuer_rfc.clone()),
        recipient_rfc: Some(document.recipient_rfc.clone()),
        recipient_name: document.recipient_name.clone(),
        uuid: document.uuid.clone(),
    })
}

fn expect_invoice<'a>(strategy: &str, spec: &'a DocumentSpec) -> Result<&'a InvoiceSpec, FilenameError> {
    match spec {
        DocumentSpec::Invoice(invoice) => Ok(invoice),
        other => Err(wrong_variant(strategy, DocumentType::Invoice, other)),
    }
}

/// `A-117`, `117`, or the stamp UUID when there is no folio.
fn number(series: Option<&str>, folio: Option<&str>, uuid: Option<&str>) -> String {
    match (series, folio) {
        (Some(series), Some(folio)) => format!("{series}-{folio}"),
        (None, Some(folio)) => folio.to_string(),
        _ => uuid.unwrap_or_default().to_string(),
    }
}

fn document_number(document: &TaxDocument) -> String {
    number(
        document.series.as_deref(),
        document.folio.as_deref(),
        document.uuid.as_deref(),
    )
}

fn spec_number(invoice: &InvoiceSpec) -> String {
    number(
        invoice.series.as_deref(),
        invoice.folio.as_deref(),
        invoice.uuid.as_deref(),
    )
}
