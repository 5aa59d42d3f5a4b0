//! Shared driver for strategies that read tax XML (CFDI).

use std::sync::Arc;

use tracing::trace;

use crate::cfdi::{TaxDocument, TaxXmlLoader};
use crate::classify::strategy::{MatchContext, MatchOutcome, Strategy};
use crate::error::{ExtractionError, FilenameError};
use crate::models::DocumentSpec;

/// The part of a CFDI strategy that differs between issuers and roles.
pub trait CfdiRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this rule owns the loaded document.
    fn specific_match(&self, document: &TaxDocument) -> bool;

    fn build(&self, document: &TaxDocument) -> Result<DocumentSpec, ExtractionError>;

    /// Filename parts, joined by [`super::compose_filename`].
    fn filename_parts(&self, spec: &DocumentSpec) -> Result<Vec<String>, FilenameError>;
}

/// Loads the CFDI once in `matches` and hands it to `parse` via the context.
pub struct CfdiStrategy<R> {
    rule: R,
    loader: Arc<dyn TaxXmlLoader>,
}

impl<R: CfdiRule> CfdiStrategy<R> {
    pub fn new(rule: R, loader: Arc<dyn TaxXmlLoader>) -> Self {
        Self { rule, loader }
    }
}

impl<R: CfdiRule> Strategy for CfdiStrategy<R> {
    fn name(&self) -> &'static str {
        self.rule.name()
    }

    fn matches(&self, content: &str) -> MatchOutcome {
        match self.loader.load(content) {
            Ok(Some(document)) if self.rule.specific_match(&document) => {
                MatchOutcome::Matched(MatchContext::new().with_tax_document(document))
            }
            Ok(Some(document)) => {
                trace!(
                    "{}: CFDI {} -> {} not ours",
                    self.rule.name(),
                    document.issuer_rfc,
                    document.recipient_rfc
                );
                MatchOutcome::NotMatched
            }
            Ok(None) => MatchOutcome::NotMatched,
            Err(e) => MatchOutcome::Invalid(e),
        }
    }

    fn parse(
        &self,
        context: &MatchContext,
        _content: &str,
    ) -> Result<DocumentSpec, ExtractionError> {
        self.rule.build(context.tax_document()?)
    }

    fn suggest_filename(
        &self,
        spec: &DocumentSpec,
        original_name: Option<&str>,
    ) -> Result<String, FilenameError> {
        let parts = self.rule.filename_parts(spec)?;
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        Ok(super::compose_filename(&parts, original_name))
    }
}
