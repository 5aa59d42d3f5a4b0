//! Detectors group the strategies of one document category.

use tracing::{debug, info, trace};

use super::format::ContentFormat;
use super::protocol::DetectionProtocol;
use super::strategy::{MatchOutcome, Strategy};
use crate::error::{DocledgerError, ExtractionError, Result};
use crate::models::{DocumentSpec, DocumentType};

/// Ordered strategies for one [`DocumentType`].
pub struct Detector {
    name: String,
    document_type: DocumentType,
    formats: Vec<ContentFormat>,
    strategies: Vec<Box<dyn Strategy>>,
}

impl Detector {
    /// Detector named after its document type.
    pub fn new(document_type: DocumentType, formats: &[ContentFormat]) -> Self {
        Self {
            name: document_type.as_str().to_string(),
            document_type,
            formats: formats.to_vec(),
            strategies: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a strategy; strategies run in insertion order.
    pub fn with_strategy(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn priority(&self) -> u32 {
        self.document_type.priority()
    }

    pub fn supports_format(&self, format: ContentFormat) -> bool {
        self.formats.contains(&format)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the strategies in order; the first one that claims the content
    /// produces the spec.
    ///
    /// Returns `Ok(None)` when no strategy claims the content. Once a
    /// strategy claims it, any extraction failure is returned as an error
    /// instead of falling through to later strategies.
    pub fn detect(
        &self,
        content: &str,
        file_path: Option<&str>,
        original_name: Option<&str>,
        protocol: &mut DetectionProtocol,
    ) -> Result<Option<DocumentSpec>> {
        let label = original_name.or(file_path).unwrap_or("<text>");

        for strategy in &self.strategies {
            let outcome = strategy.matches(content);
            protocol.add_strategy(strategy.name(), outcome.is_claimed());

            let context = match outcome {
                MatchOutcome::NotMatched => {
                    trace!("{}: {} did not match {}", self.name, strategy.name(), label);
                    continue;
                }
                MatchOutcome::Invalid(source) => {
                    return Err(parse_error(label, strategy.as_ref(), source));
                }
                MatchOutcome::Matched(context) => context,
            };

            debug!("{}: {} matched {}", self.name, strategy.name(), label);

            // A failed parse leaves the detector entry without a parsing result.
            let spec = strategy
                .parse(&context, content)
                .map_err(|source| parse_error(label, strategy.as_ref(), source))?;

            let filename = strategy.suggest_filename(&spec, original_name.or(file_path))?;
            protocol.add_parsing_result(true, format!("{} -> {}", strategy.name(), filename));
            info!("Classified {} as {} ({})", label, self.document_type, filename);

            return Ok(Some(spec.with_suggested_filename(filename)));
        }

        Ok(None)
    }
}

fn parse_error(label: &str, strategy: &dyn Strategy, source: ExtractionError) -> DocledgerError {
    DocledgerError::Parse {
        path: label.to_string(),
        strategy: strategy.name().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::strategy::fakes::{BrokenStrategy, MarkerStrategy};
    use pretty_assertions::assert_eq;

    fn detector() -> Detector {
        Detector::new(DocumentType::Receipt, &[ContentFormat::Text])
            .with_strategy(MarkerStrategy { name: "first", marker: "ALPHA" })
            .with_strategy(MarkerStrategy { name: "second", marker: "BETA" })
    }

    #[test]
    fn test_first_match_wins() {
        let mut protocol = DetectionProtocol::new();
        protocol.init_file("doc.txt");
        protocol.add_detector("receipt");

        let spec = detector()
            .detect("ALPHA BETA", None, Some("doc.txt"), &mut protocol)
            .unwrap()
            .unwrap();

        assert_eq!(spec.fields().display_filename.as_deref(), Some("first"));
        assert_eq!(spec.suggested_filename(), Some("first.txt"));

        let attempts = &protocol.current().unwrap().detectors[0];
        assert_eq!(attempts.strategies.len(), 1);
        assert!(attempts.strategies[0].matched);
        assert!(attempts.parsing_result.as_ref().unwrap().success);
    }

    #[test]
    fn test_later_strategy_after_miss() {
        let mut protocol = DetectionProtocol::new();
        protocol.init_file("doc.txt");
        protocol.add_detector("receipt");

        let spec = detector().detect("only BETA", None, None, &mut protocol).unwrap().unwrap();
        assert_eq!(spec.fields().display_filename.as_deref(), Some("second"));

        let names: Vec<(String, bool)> = protocol.current().unwrap().detectors[0]
            .strategies
            .iter()
            .map(|s| (s.name.clone(), s.matched))
            .collect();
        assert_eq!(names, vec![("first".to_string(), false), ("second".to_string(), true)]);
    }

    #[test]
    fn test_no_match() {
        let mut protocol = DetectionProtocol::new();
        protocol.init_file("doc.txt");
        protocol.add_detector("receipt");

        assert!(detector().detect("nothing", None, None, &mut protocol).unwrap().is_none());
        assert!(protocol.current().unwrap().detectors[0].parsing_result.is_none());
    }

    #[test]
    fn test_parse_failure_is_fatal() {
        let detector = Detector::new(DocumentType::Tax, &[ContentFormat::Text])
            .with_strategy(BrokenStrategy { name: "broken", marker: "X", at_match: false })
            .with_strategy(MarkerStrategy { name: "fallback", marker: "X" });

        let mut protocol = DetectionProtocol::new();
        protocol.init_file("x.txt");
        protocol.add_detector("tax");

        let err = detector.detect("X", None, Some("x.txt"), &mut protocol).unwrap_err();
        match err {
            DocledgerError::Parse { path, strategy, source } => {
                assert_eq!(path, "x.txt");
                assert_eq!(strategy, "broken");
                assert_eq!(source, ExtractionError::missing("TOTAL"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let attempt = &protocol.current().unwrap().detectors[0];
        assert_eq!(attempt.strategies.len(), 1);
        assert!(attempt.parsing_result.is_none());
    }

    #[test]
    fn test_invalid_match_is_fatal() {
        let detector = Detector::new(DocumentType::Invoice, &[ContentFormat::Xml])
            .with_strategy(BrokenStrategy { name: "schema", marker: "<", at_match: true });

        let mut protocol = DetectionProtocol::new();
        protocol.init_file("f.xml");
        protocol.add_detector("invoice");

        assert!(matches!(
            detector.detect("<x/>", None, None, &mut protocol),
            Err(DocledgerError::Parse { .. })
        ));
        assert!(protocol.current().unwrap().detectors[0].strategies[0].matched);
    }

    #[test]
    fn test_supports_format() {
        let detector = detector();
        assert!(detector.supports_format(ContentFormat::Text));
        assert!(!detector.supports_format(ContentFormat::Xml));
        assert_eq!(detector.priority(), 6);
        assert_eq!(detector.strategy_names(), vec!["first", "second"]);
    }
}
