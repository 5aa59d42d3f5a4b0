//! Audit trail of every detector and strategy tried per file.
//!
//! The protocol is append-only while a file is classified and is only read
//! for diagnostics; classification never consults it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Outcome of one strategy's `matches` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub name: String,
    pub matched: bool,
}

/// Outcome of the parse step of the winning strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsingResult {
    pub success: bool,
    pub details: String,
}

/// One detector run against a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorAttempt {
    pub name: String,
    pub strategies: Vec<StrategyAttempt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsing_result: Option<ParsingResult>,
}

/// Record for one classified file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProtocol {
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
    pub detectors: Vec<DetectorAttempt>,
}

/// Detection protocol across the files handled by one loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionProtocol {
    files: Vec<FileProtocol>,
}

impl DetectionProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new record for `file_name`.
    pub fn init_file(&mut self, file_name: impl Into<String>) {
        self.files.push(FileProtocol {
            file_name: file_name.into(),
            timestamp: Utc::now(),
            detectors: Vec::new(),
        });
    }

    /// Record that `name` is about to run on the current file.
    pub fn add_detector(&mut self, name: impl Into<String>) {
        self.current_file_mut().detectors.push(DetectorAttempt {
            name: name.into(),
            strategies: Vec::new(),
            parsing_result: None,
        });
    }

    /// Record a strategy attempt on the current detector.
    pub fn add_strategy(&mut self, name: impl Into<String>, matched: bool) {
        self.current_detector_mut().strategies.push(StrategyAttempt {
            name: name.into(),
            matched,
        });
    }

    /// Record the parse outcome on the current detector.
    pub fn add_parsing_result(&mut self, success: bool, details: impl Into<String>) {
        self.current_detector_mut().parsing_result = Some(ParsingResult {
            success,
            details: details.into(),
        });
    }

    /// All file records, oldest first.
    pub fn protocol(&self) -> &[FileProtocol] {
        &self.files
    }

    /// Record of the file being (or last) classified.
    pub fn current(&self) -> Option<&FileProtocol> {
        self.files.last()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Append the records of another protocol, e.g. one kept by a worker.
    pub fn extend(&mut self, other: DetectionProtocol) {
        self.files.extend(other.files);
    }

    /// Pretty JSON rendering of the protocol.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.files)
    }

    fn current_file_mut(&mut self) -> &mut FileProtocol {
        if self.files.is_empty() {
            warn!("Detection protocol used before init_file");
            self.init_file("<unknown>");
        }
        let last = self.files.len() - 1;
        &mut self.files[last]
    }

    fn current_detector_mut(&mut self) -> &mut DetectorAttempt {
        let file = self.current_file_mut();
        if file.detectors.is_empty() {
            warn!("Strategy recorded before any detector on {}", file.file_name);
            file.detectors.push(DetectorAttempt {
                name: "<unknown>".to_string(),
                strategies: Vec::new(),
                parsing_result: None,
            });
        }
        let last = file.detectors.len() - 1;
        &mut file.detectors[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builds_nested_record() {
        let mut protocol = DetectionProtocol::new();
        protocol.init_file("estado.pdf");
        protocol.add_detector("statement");
        protocol.add_strategy("bbva_account_statement", false);
        protocol.add_strategy("bbva_card_statement", true);
        protocol.add_parsing_result(true, "ok");

        let file = protocol.current().unwrap();
        assert_eq!(file.file_name, "estado.pdf");
        assert_eq!(file.detectors.len(), 1);
        assert_eq!(
            file.detectors[0].strategies,
            vec![
                StrategyAttempt { name: "bbva_account_statement".to_string(), matched: false },
                StrategyAttempt { name: "bbva_card_statement".to_string(), matched: true },
            ]
        );
        assert_eq!(
            file.detectors[0].parsing_result,
            Some(ParsingResult { success: true, details: "ok".to_string() })
        );
    }

    #[test]
    fn test_file_without_detectors() {
        let mut protocol = DetectionProtocol::new();
        protocol.init_file("vacio.xml");
        assert!(protocol.current().unwrap().detectors.is_empty());

        let json: serde_json::Value = serde_json::from_str(&protocol.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["fileName"], "vacio.xml");
        assert_eq!(json[0]["detectors"], serde_json::json!([]));
    }

    #[test]
    fn test_parsing_result_omitted_when_absent() {
        let mut protocol = DetectionProtocol::new();
        protocol.init_file("a.txt");
        protocol.add_detector("receipt");
        protocol.add_strategy("cfe_receipt", true);

        let json: serde_json::Value = serde_json::from_str(&protocol.to_json().unwrap()).unwrap();
        assert!(json[0]["detectors"][0].get("parsingResult").is_none());
    }

    #[test]
    fn test_recording_without_init_does_not_panic() {
        let mut protocol = DetectionProtocol::new();
        protocol.add_strategy("orphan", false);
        assert_eq!(protocol.protocol().len(), 1);
        assert_eq!(protocol.protocol()[0].detectors[0].strategies.len(), 1);
    }

    #[test]
    fn test_extend_keeps_order() {
        let mut first = DetectionProtocol::new();
        first.init_file("a.txt");
        let mut second = DetectionProtocol::new();
        second.init_file("b.txt");
        second.init_file("c.txt");

        first.extend(second);
        let names: Vec<&str> = first.protocol().iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }
}
