//! Registry of detectors, ordered by document priority.

use std::sync::Arc;

use tracing::debug;

use super::detector::Detector;
use super::format::ContentFormat;
use super::strategies::{
    BankCfdiAttachment, BbvaAccountStatement, BbvaCardStatement, CashVoucher, CfdiExpense,
    CfdiStrategy, CfeReceipt, DonationReceipt, GenericCfdiInvoice, MonthlyNote, OwnCfdiInvoice,
    PropertyTax, SatBankPayment, SatTaxNotice, TelmexReceipt,
};
use crate::cfdi::TaxXmlLoader;
use crate::models::{DocumentType, LookupTables};

/// Holds every detector known to a loader.
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: Vec<Detector>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard detector set wired to `tables`.
    pub fn standard(tables: Arc<LookupTables>, tax_loader: Arc<dyn TaxXmlLoader>) -> Self {
        use ContentFormat::{Text, Xml};

        let mut registry = Self::new();

        registry.register(
            Detector::new(DocumentType::Statement, &[Text])
                .with_strategy(BbvaAccountStatement::new(tables.clone()))
                .with_strategy(BbvaCardStatement::new()),
        );
        registry.register(
            Detector::new(DocumentType::Attachment, &[Text, Xml])
                .with_strategy(SatTaxNotice::new())
                .with_strategy(CfdiStrategy::new(
                    BankCfdiAttachment::new(tables.clone()),
                    tax_loader.clone(),
                )),
        );
        registry.register(
            Detector::new(DocumentType::Expense, &[Text, Xml])
                .with_strategy(CfdiStrategy::new(
                    CfdiExpense::new(tables.clone()),
                    tax_loader.clone(),
                ))
                .with_strategy(CashVoucher::new()),
        );
        registry.register(
            Detector::new(DocumentType::Tax, &[Text])
                .with_strategy(SatBankPayment::new())
                .with_strategy(PropertyTax::new(tables.clone())),
        );
        registry.register(
            Detector::new(DocumentType::Invoice, &[Xml])
                .with_strategy(CfdiStrategy::new(
                    OwnCfdiInvoice::new(tables.clone()),
                    tax_loader.clone(),
                ))
                .with_strategy(CfdiStrategy::new(GenericCfdiInvoice::new(), tax_loader)),
        );
        registry.register(
            Detector::new(DocumentType::Receipt, &[Text])
                .with_strategy(CfeReceipt::new(tables.clone()))
                .with_strategy(TelmexReceipt::new(tables)),
        );
        registry.register(
            Detector::new(DocumentType::Annotation, &[Text]).with_strategy(MonthlyNote::new()),
        );
        registry.register(
            Detector::new(DocumentType::Donation, &[Text]).with_strategy(DonationReceipt::new()),
        );

        registry
    }

    pub fn register(&mut self, detector: Detector) {
        debug!(
            "Registered detector {} (priority {}) with strategies {:?}",
            detector.name(),
            detector.priority(),
            detector.strategy_names()
        );
        self.detectors.push(detector);
    }

    /// Detectors supporting `format`, lowest priority first. Detectors with
    /// equal priority keep their registration order.
    pub fn detectors_for(&self, format: ContentFormat) -> Vec<&Detector> {
        let mut detectors: Vec<&Detector> = self
            .detectors
            .iter()
            .filter(|d| d.supports_format(format))
            .collect();
        detectors.sort_by_key(|d| d.priority());
        detectors
    }

    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfdi::CfdiLoader;
    use crate::classify::strategy::fakes::MarkerStrategy;
    use pretty_assertions::assert_eq;

    fn names(detectors: &[&Detector]) -> Vec<String> {
        detectors.iter().map(|d| d.name().to_string()).collect()
    }

    #[test]
    fn test_orders_by_priority() {
        let mut registry = DetectorRegistry::new();
        registry.register(Detector::new(DocumentType::Receipt, &[ContentFormat::Text]));
        registry.register(Detector::new(DocumentType::Donation, &[ContentFormat::Text]));
        registry.register(Detector::new(DocumentType::Statement, &[ContentFormat::Text]));
        registry.register(Detector::new(DocumentType::Invoice, &[ContentFormat::Xml]));

        assert_eq!(
            names(&registry.detectors_for(ContentFormat::Text)),
            vec!["statement", "receipt", "donation"]
        );
        assert_eq!(names(&registry.detectors_for(ContentFormat::Xml)), vec!["invoice"]);
    }

    #[test]
    fn test_equal_priority_keeps_registration_order() {
        let mut registry = DetectorRegistry::new();
        registry.register(
            Detector::new(DocumentType::Tax, &[ContentFormat::Text])
                .with_name("tax-b")
                .with_strategy(MarkerStrategy { name: "b", marker: "B" }),
        );
        registry.register(Detector::new(DocumentType::Statement, &[ContentFormat::Text]));
        registry.register(Detector::new(DocumentType::Tax, &[ContentFormat::Text]).with_name("tax-a"));

        assert_eq!(
            names(&registry.detectors_for(ContentFormat::Text)),
            vec!["statement", "tax-b", "tax-a"]
        );
    }

    #[test]
    fn test_standard_registry() {
        let registry =
            DetectorRegistry::standard(Arc::new(LookupTables::default()), Arc::new(CfdiLoader::new()));
        assert_eq!(registry.len(), 8);

        assert_eq!(
            names(&registry.detectors_for(ContentFormat::Text)),
            vec!["statement", "attachment", "expense", "tax", "receipt", "annotation", "donation"]
        );
        assert_eq!(
            names(&registry.detectors_for(ContentFormat::Xml)),
            vec!["attachment", "expense", "invoice"]
        );

        let invoice = registry
            .detectors()
            .iter()
            .find(|d| d.document_type() == DocumentType::Invoice)
            .unwrap();
        assert_eq!(invoice.strategy_names(), vec!["own_cfdi_invoice", "generic_cfdi_invoice"]);
    }
}
