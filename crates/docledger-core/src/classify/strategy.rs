//! The contract every classification strategy implements.

use std::collections::BTreeMap;

use crate::cfdi::TaxDocument;
use crate::error::{ExtractionError, FilenameError};
use crate::models::DocumentSpec;

/// Values captured while testing a document, handed to `parse`.
///
/// Strategies are stateless; anything `matches` learns travels here instead
/// of being stored on the strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchContext {
    properties: BTreeMap<String, String>,
    tax_document: Option<TaxDocument>,
}

impl MatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Insert `value` under `key` when present.
    pub fn with_optional(self, key: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(value) => self.with_property(key, value),
            None => self,
        }
    }

    pub fn with_tax_document(mut self, document: TaxDocument) -> Self {
        self.tax_document = Some(document);
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Property that `parse` cannot do without.
    pub fn require(&self, key: &str) -> Result<&str, ExtractionError> {
        self.property(key).ok_or_else(|| ExtractionError::missing(key))
    }

    pub fn tax_document(&self) -> Result<&TaxDocument, ExtractionError> {
        self.tax_document
            .as_ref()
            .ok_or_else(|| ExtractionError::missing("tax document"))
    }
}

/// Result of testing a document against a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The strategy claims the document.
    Matched(MatchContext),
    /// The document is not this strategy's.
    NotMatched,
    /// The document is this strategy's kind but is malformed.
    Invalid(ExtractionError),
}

impl MatchOutcome {
    /// Whether the strategy claimed the document, including malformed ones.
    pub fn is_claimed(&self) -> bool {
        !matches!(self, MatchOutcome::NotMatched)
    }
}

impl From<bool> for MatchOutcome {
    fn from(matched: bool) -> Self {
        if matched {
            MatchOutcome::Matched(MatchContext::new())
        } else {
            MatchOutcome::NotMatched
        }
    }
}

/// Recognizes one concrete document layout and extracts its spec.
pub trait Strategy: Send + Sync {
    /// Stable identifier used in the detection protocol.
    fn name(&self) -> &'static str;

    /// Cheap marker test. Never fails except for content that is clearly
    /// this strategy's kind but broken (e.g. a CFDI that breaks the schema).
    fn matches(&self, content: &str) -> MatchOutcome;

    /// Build the spec. Only called after `matches` returned `Matched`.
    fn parse(&self, context: &MatchContext, content: &str)
    -> Result<DocumentSpec, ExtractionError>;

    /// Deterministic filename for `spec`, keeping the extension of
    /// `original_name` when there is one.
    fn suggest_filename(
        &self,
        spec: &DocumentSpec,
        original_name: Option<&str>,
    ) -> Result<String, FilenameError>;
}

#[cfg(test)]
pub(crate) mod fakes {
    //! Strategies with scripted behavior for detector and loader tests.

    use super::*;
    use crate::models::{AnnotationSpec, SpecFields};

    /// Claims any content containing `marker`.
    pub struct MarkerStrategy {
        pub name: &'static str,
        pub marker: &'static str,
    }

    impl Strategy for MarkerStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        fn matches(&self, content: &str) -> MatchOutcome {
            if content.contains(self.marker) {
                MatchOutcome::Matched(MatchContext::new().with_property("marker", self.marker))
            } else {
                MatchOutcome::NotMatched
            }
        }

        fn parse(
            &self,
            context: &MatchContext,
            _content: &str,
        ) -> Result<DocumentSpec, ExtractionError> {
            let marker = context.require("marker")?;
            Ok(DocumentSpec::Annotation(AnnotationSpec {
                fields: SpecFields::default()
                    .with_display(self.name)
                    .with_description(Some(marker.to_string())),
            }))
        }

        fn suggest_filename(
            &self,
            _spec: &DocumentSpec,
            _original_name: Option<&str>,
        ) -> Result<String, FilenameError> {
            Ok(format!("{}.txt", self.name))
        }
    }

    /// Claims content containing `marker` and then fails to parse it.
    pub struct BrokenStrategy {
        pub name: &'static str,
        pub marker: &'static str,
        pub at_match: bool,
    }

    impl Strategy for BrokenStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        fn matches(&self, content: &str) -> MatchOutcome {
            match (content.contains(self.marker), self.at_match) {
                (false, _) => MatchOutcome::NotMatched,
                (true, true) => MatchOutcome::Invalid(ExtractionError::TaxXml("broken".into())),
                (true, false) => MatchOutcome::Matched(MatchContext::new()),
            }
        }

        fn parse(
            &self,
            _context: &MatchContext,
            _content: &str,
        ) -> Result<DocumentSpec, ExtractionError> {
            Err(ExtractionError::missing("TOTAL"))
        }

        fn suggest_filename(
            &self,
            _spec: &DocumentSpec,
            _original_name: Option<&str>,
        ) -> Result<String, FilenameError> {
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_properties() {
        let context = MatchContext::new()
            .with_property("service", "123456789012")
            .with_optional("missing", None)
            .with_optional("month", Some("01".to_string()));

        assert_eq!(context.property("service"), Some("123456789012"));
        assert_eq!(context.property("missing"), None);
        assert_eq!(context.require("month").unwrap(), "01");
        assert_eq!(
            context.require("missing").unwrap_err(),
            ExtractionError::MissingField("missing".to_string())
        );
        assert!(context.tax_document().is_err());
    }

    #[test]
    fn test_outcome_claimed() {
        assert!(MatchOutcome::from(true).is_claimed());
        assert!(!MatchOutcome::from(false).is_claimed());
        assert!(MatchOutcome::Invalid(ExtractionError::TaxXml("x".into())).is_claimed());
    }
}
