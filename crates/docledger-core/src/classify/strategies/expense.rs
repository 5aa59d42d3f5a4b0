//! Expenses: incoming CFDIs from suppliers and hand-written cash vouchers.

use std::sync::Arc;

use chrono::Datelike;
use lazy_static::lazy_static;
use regex::Regex;

use super::cfdi::CfdiRule;
use super::{compose_filename, is_markup, period_label, required_amount, wrong_variant};
use crate::cfdi::TaxDocument;
use crate::classify::strategy::{MatchContext, MatchOutcome, Strategy};
use crate::error::{ExtractionError, FilenameError};
use crate::models::{DocumentSpec, DocumentType, ExpenseSpec, LookupTables, SpecFields};
use crate::rules::{format_cents, labeled_value, parse_date};

lazy_static! {
    static ref VOUCHER_AMOUNT: Regex =
        Regex::new(r"(?i)(?:importe|cantidad|total):?\s*(\$?\s*[\d,]+(?:\.\d{2})?)").unwrap();
}

/// CFDI received from a third party.
pub struct CfdiExpense {
    tables: Arc<LookupTables>,
}

impl CfdiExpense {
    pub fn new(tables: Arc<LookupTables>) -> Self {
        Self { tables }
    }
}

impl CfdiRule for CfdiExpense {
    fn name(&self) -> &'static str {
        "cfdi_expense"
    }

    fn specific_match(&self, document: &TaxDocument) -> bool {
        self.tables.is_own_rfc(&document.recipient_rfc) && !self.tables.is_own_rfc(&document.issuer_rfc)
    }

    fn build(&self, document: &TaxDocument) -> Result<DocumentSpec, ExtractionError> {
        let issuer = document.issuer_name.as_deref().unwrap_or(&document.issuer_rfc);

        Ok(DocumentSpec::Expense(ExpenseSpec {
            fields: SpecFields::default()
                .with_period(document.year(), document.month())
                .with_amount(Some(document.total))
                .with_display(format!("Gasto {issuer}"))
                .with_description(document.first_concept().map(str::to_string)),
            issuer_rfc: Some(document.issuer_rfc.clone()),
            issuer_name: document.issuer_name.clone(),
            uuid: document.uuid.clone(),
        }))
    }

    fn filename_parts(&self, spec: &DocumentSpec) -> Result<Vec<String>, FilenameError> {
        let DocumentSpec::Expense(expense) = spec else {
            return Err(wrong_variant(self.name(), DocumentType::Expense, spec));
        };
        Ok(vec![
            period_label(&expense.fields),
            "Gasto".to_string(),
            expense.issuer_rfc.clone().unwrap_or_default(),
            expense.fields.amount.map(format_cents).unwrap_or_default(),
        ])
    }
}

/// Internal cash voucher ("VALE DE CAJA").
pub struct CashVoucher;

impl CashVoucher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CashVoucher {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for CashVoucher {
    fn name(&self) -> &'static str {
        "cash_voucher"
    }

    fn matches(&self, content: &str) -> MatchOutcome {
        (!is_markup(content) && content.to_uppercase().contains("VALE DE CAJA")).into()
    }

    fn parse(&self, _context: &MatchContext, content: &str) -> Result<DocumentSpec, ExtractionError> {
        let raw_date = labeled_value(content, "Fecha").ok_or_else(|| ExtractionError::missing("Fecha"))?;
        let date = parse_date(&raw_date).ok_or_else(|| ExtractionError::parse("Fecha", raw_date.as_str()))?;
        let amount = required_amount(content, &VOUCHER_AMOUNT, "Importe")?;
        let concept = labeled_value(content, "Concepto");

        Ok(DocumentSpec::Expense(ExpenseSpec {
            fields: SpecFields::default()
                .with_period(date.year(), date.month())
                .with_amount(Some(amount))
                .with_display(format!("Vale de caja {}", date.format("%Y-%m-%d")))
                .with_description(concept),
            issuer_rfc: None,
            issuer_name: labeled_value(content, "Recibí de"),
            uuid: None,
        }))
    }

    fn suggest_filename(
        &self,
        spec: &DocumentSpec,
        original_name: Option<&str>,
    ) -> Result<String, FilenameError> {
        let DocumentSpec::Expense(expense) = spec else {
            return Err(wrong_variant(self.name(), DocumentType::Expense, spec));
        };
        let amount = expense.fields.amount.map(format_cents).unwrap_or_default();
        Ok(compose_filename(
            &[&period_label(&expense.fields), "Vale de caja", &amount],
            original_name,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfdi::{fixtures::cfdi, CfdiLoader};
    use crate::classify::strategies::fixtures::{tables, OWN_RFC, SUPPLIER_RFC};
    use crate::classify::strategies::CfdiStrategy;
    use crate::models::AnnotationSpec;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cfdi_expense() {
        let strategy = CfdiStrategy::new(CfdiExpense::new(tables()), Arc::new(CfdiLoader::new()));
        let xml = cfdi(SUPPLIER_RFC, OWN_RFC, "1,160.00");

        let MatchOutcome::Matched(context) = strategy.matches(&xml) else {
            panic!("expense not matched");
        };
        let spec = strategy.parse(&context, &xml).unwrap();
        let DocumentSpec::Expense(expense) = &spec else {
            panic!("not an expense");
        };
        assert_eq!(expense.fields.amount, Some(116000));
        assert_eq!(expense.issuer_name.as_deref(), Some("Emisor & Asociados"));
        assert_eq!(expense.fields.description.as_deref(), Some("Servicio de consultoria"));
        assert_eq!(
            expense.uuid.as_deref(),
            Some("6F9A1C2E-0000-4000-8000-000000000001")
        );
        assert_eq!(
            strategy.suggest_filename(&spec, Some("gasto.XML")).unwrap(),
            "2023-03 Gasto FEJ990101AB1 1,160.00.xml"
        );
    }

    #[test]
    fn test_cfdi_expense_skips_own_invoices() {
        let strategy = CfdiStrategy::new(CfdiExpense::new(tables()), Arc::new(CfdiLoader::new()));
        assert_eq!(strategy.matches(&cfdi(OWN_RFC, OWN_RFC, "1.00")), MatchOutcome::NotMatched);
        assert_eq!(
            strategy.matches(&cfdi(SUPPLIER_RFC, "XAXX010101000", "1.00")),
            MatchOutcome::NotMatched
        );
    }

    #[test]
    fn test_malformed_cfdi_is_invalid() {
        let strategy = CfdiStrategy::new(CfdiExpense::new(tables()), Arc::new(CfdiLoader::new()));
        let xml = cfdi(SUPPLIER_RFC, OWN_RFC, "abc");
        assert!(matches!(strategy.matches(&xml), MatchOutcome::Invalid(_)));
    }

    const VOUCHER: &str = "\
VALE DE CAJA
Fecha: 14/02/2023
Recibí de: Juan Pérez
Concepto: Reparación de bomba de agua
Importe: $850.00
";

    #[test]
    fn test_cash_voucher() {
        let strategy = CashVoucher::new();
        let MatchOutcome::Matched(context) = strategy.matches(VOUCHER) else {
            panic!("voucher not matched");
        };
        let spec = strategy.parse(&context, VOUCHER).unwrap();
        assert_eq!(spec.year(), Some(2023));
        assert_eq!(spec.month(), Some(2));
        assert_eq!(spec.amount(), Some(85000));
        assert_eq!(
            spec.fields().description.as_deref(),
            Some("Reparación de bomba de agua")
        );
        assert_eq!(
            strategy.suggest_filename(&spec, Some("vale.txt")).unwrap(),
            "2023-02 Vale de caja 850.00.txt"
        );
    }

    #[test]
    fn test_cash_voucher_without_amount() {
        let strategy = CashVoucher::new();
        let content = VOUCHER.replace("Importe: $850.00", "");
        assert_eq!(
            strategy.parse(&MatchContext::new(), &content).unwrap_err(),
            ExtractionError::missing("Importe")
        );
    }

    #[test]
    fn test_cash_voucher_ignores_cfdi_markup() {
        let xml = cfdi(OWN_RFC, SUPPLIER_RFC, "850.00")
            .replace("Servicio de consultoria", "Reposicion de VALE DE CAJA");
        assert_eq!(CashVoucher::new().matches(&xml), MatchOutcome::NotMatched);
    }

    #[test]
    fn test_wrong_variant() {
        let spec = DocumentSpec::Annotation(AnnotationSpec { fields: SpecFields::default() });
        assert!(matches!(
            CashVoucher::new().suggest_filename(&spec, None),
            Err(FilenameError::WrongVariant { .. })
        ));
    }
}
