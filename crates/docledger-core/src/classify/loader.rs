//! Document loader: reads a file, runs the detectors, returns the spec.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::format::{ContentFormat, InputFormat};
use super::protocol::DetectionProtocol;
use super::registry::DetectorRegistry;
use super::special_cases::SpecialCases;
use crate::cfdi::CfdiLoader;
use crate::error::{ConversionError, DetectionError, Result};
use crate::models::{DocledgerConfig, DocumentSpec};
use crate::pdf::{converter_from_config, PdfConverter};

/// Classifies documents and keeps the detection protocol of every file it
/// has seen.
///
/// A loader is not shared between threads; use [`DocumentLoader::worker`]
/// to get an independent loader over the same registry.
pub struct DocumentLoader {
    registry: Arc<DetectorRegistry>,
    converter: Arc<dyn PdfConverter>,
    special_cases: Arc<SpecialCases>,
    protocol: DetectionProtocol,
}

impl DocumentLoader {
    pub fn new(registry: Arc<DetectorRegistry>, converter: Arc<dyn PdfConverter>) -> Self {
        Self {
            registry,
            converter,
            special_cases: Arc::new(SpecialCases::default()),
            protocol: DetectionProtocol::new(),
        }
    }

    /// Loader with the standard detectors, the configured PDF converter and
    /// the configured special cases.
    pub fn from_config(config: &DocledgerConfig) -> Self {
        let registry =
            DetectorRegistry::standard(Arc::new(config.tables.clone()), Arc::new(CfdiLoader::new()));
        Self::new(Arc::new(registry), Arc::from(converter_from_config(&config.pdf)))
            .with_special_cases(SpecialCases::new(config.special_cases.clone()))
    }

    pub fn with_special_cases(mut self, special_cases: SpecialCases) -> Self {
        self.special_cases = Arc::new(special_cases);
        self
    }

    /// A loader sharing this one's registry, converter and special cases,
    /// with an empty protocol.
    pub fn worker(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            converter: Arc::clone(&self.converter),
            special_cases: Arc::clone(&self.special_cases),
            protocol: DetectionProtocol::new(),
        }
    }

    /// Classify the file at `path`.
    ///
    /// `declared` overrides the format inferred from the extension.
    /// `original_name` is the user-facing name when `path` is a temporary
    /// copy; it drives special cases and the suggested filename extension.
    pub fn load(
        &mut self,
        path: &Path,
        declared: Option<InputFormat>,
        original_name: Option<&str>,
    ) -> Result<DocumentSpec> {
        let path_str = path.to_string_lossy().into_owned();

        if let Some(spec) = self.special_case(original_name, &path_str) {
            return Ok(spec);
        }

        let format = match declared {
            Some(format) => format,
            None => InputFormat::from_path(path)?,
        };
        debug!("Loading {} as {}", path_str, format);

        let content = self.read_content(path, format, original_name)?;
        self.run_detectors(&content, format.content_format(), Some(&path_str), original_name)
    }

    /// Classify text that is already in memory.
    pub fn classify_text(
        &mut self,
        content: &str,
        format: ContentFormat,
        file_path: Option<&str>,
        original_name: Option<&str>,
    ) -> Result<DocumentSpec> {
        if let Some(spec) = file_path
            .or(original_name)
            .and_then(|path| self.special_case(original_name, path))
        {
            return Ok(spec);
        }
        self.run_detectors(content, format, file_path, original_name)
    }

    /// Read the file as text, converting PDFs on the way.
    pub fn read_content(
        &self,
        path: &Path,
        format: InputFormat,
        original_name: Option<&str>,
    ) -> Result<String> {
        let text = match format {
            InputFormat::Pdf => self
                .converter
                .convert(path, original_name)
                .map_err(ConversionError::from)?,
            InputFormat::Txt | InputFormat::Xml => {
                let bytes = std::fs::read(path).map_err(|source| ConversionError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("{} is not valid UTF-8, decoding lossily", path.display());
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                }
            }
        };

        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    /// Detection protocol of every file handled so far.
    pub fn protocol(&self) -> &DetectionProtocol {
        &self.protocol
    }

    /// Hand out the protocol and start a fresh one.
    pub fn take_protocol(&mut self) -> DetectionProtocol {
        std::mem::take(&mut self.protocol)
    }

    fn special_case(&self, original_name: Option<&str>, path: &str) -> Option<DocumentSpec> {
        let name = original_name.unwrap_or(path);
        let spec = self
            .special_cases
            .lookup(name)
            .or_else(|| self.special_cases.lookup(path))?;
        info!("{} is a special case, skipping detection", name);
        Some(spec.clone())
    }

    fn run_detectors(
        &mut self,
        content: &str,
        format: ContentFormat,
        file_path: Option<&str>,
        original_name: Option<&str>,
    ) -> Result<DocumentSpec> {
        let label = original_name.or(file_path).unwrap_or("<text>").to_string();
        self.protocol.init_file(label.as_str());

        let registry = Arc::clone(&self.registry);
        for detector in registry.detectors_for(format) {
            self.protocol.add_detector(detector.name());
            if let Some(spec) = detector.detect(content, file_path, original_name, &mut self.protocol)? {
                return Ok(spec);
            }
        }

        warn!("No detector matched {} ({})", label, format);
        Err(DetectionError::NoMatch { file: label }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::detector::Detector;
    use crate::cfdi::fixtures::cfdi;
    use crate::classify::strategies::fixtures::{
        cfe_receipt, tables, BBVA_RFC, OWN_RFC, SUPPLIER_RFC, TAX_NOTICE,
    };
    use crate::classify::strategy::fakes::{BrokenStrategy, MarkerStrategy};
    use crate::error::{DocledgerError, PdfError};
    use crate::models::{AnnotationSpec, DocumentType, LookupTables, SpecFields, SpecialCase};
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct StaticConverter(&'static str);

    impl PdfConverter for StaticConverter {
        fn convert(&self, _path: &Path, _name: Option<&str>) -> crate::pdf::Result<String> {
            if self.0.is_empty() {
                return Err(PdfError::TextExtraction("empty".into()));
            }
            Ok(self.0.to_string())
        }
    }

    fn fake_registry() -> DetectorRegistry {
        let mut registry = DetectorRegistry::new();
        registry.register(
            Detector::new(DocumentType::Receipt, &[ContentFormat::Text])
                .with_strategy(MarkerStrategy { name: "receipt_marker", marker: "SHARED" }),
        );
        registry.register(
            Detector::new(DocumentType::Statement, &[ContentFormat::Text])
                .with_strategy(MarkerStrategy { name: "statement_marker", marker: "SHARED" }),
        );
        registry.register(
            Detector::new(DocumentType::Tax, &[ContentFormat::Text])
                .with_strategy(BrokenStrategy { name: "broken_tax", marker: "BROKEN", at_match: false }),
        );
        registry
    }

    fn fake_loader(pdf_text: &'static str) -> DocumentLoader {
        DocumentLoader::new(Arc::new(fake_registry()), Arc::new(StaticConverter(pdf_text)))
    }

    fn temp_file(suffix: &str, content: &[u8]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_lower_priority_detector_wins() {
        let mut loader = fake_loader("");
        let spec = loader
            .classify_text("SHARED", ContentFormat::Text, None, Some("a.txt"))
            .unwrap();
        assert_eq!(spec.fields().display_filename.as_deref(), Some("statement_marker"));

        let file = loader.protocol().current().unwrap();
        assert_eq!(file.file_name, "a.txt");
        assert_eq!(file.detectors.len(), 1);
        assert_eq!(file.detectors[0].name, "statement");
    }

    #[test]
    fn test_no_match_lists_every_detector() {
        let mut loader = fake_loader("");
        let err = loader
            .classify_text("nothing here", ContentFormat::Text, None, Some("x.txt"))
            .unwrap_err();
        assert!(matches!(err, DocledgerError::Detection(DetectionError::NoMatch { ref file }) if file == "x.txt"));

        let names: Vec<&str> = loader.protocol().current().unwrap()
            .detectors
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["statement", "tax", "receipt"]);
    }

    #[test]
    fn test_no_detector_for_format() {
        let mut loader = fake_loader("");
        let err = loader.classify_text("<a/>", ContentFormat::Xml, None, None).unwrap_err();
        assert!(matches!(err, DocledgerError::Detection(_)));
        assert!(loader.protocol().current().unwrap().detectors.is_empty());
    }

    #[test]
    fn test_parse_failure_stops_detection() {
        let mut loader = fake_loader("");
        let err = loader
            .classify_text("BROKEN", ContentFormat::Text, None, None)
            .unwrap_err();
        assert!(matches!(err, DocledgerError::Parse { ref strategy, .. } if strategy == "broken_tax"));
    }

    #[test]
    fn test_load_txt_and_pdf() {
        let mut loader = fake_loader("SHARED from pdf");

        let txt = temp_file(".txt", b"SHARED");
        let spec = loader.load(txt.path(), None, None).unwrap();
        assert_eq!(spec.document_type(), DocumentType::Annotation);

        let pdf = temp_file(".pdf", b"%PDF-1.4");
        let spec = loader.load(pdf.path(), None, Some("estado.pdf")).unwrap();
        assert_eq!(spec.suggested_filename(), Some("statement_marker.txt"));
        assert_eq!(loader.protocol().protocol().len(), 2);
        assert_eq!(loader.take_protocol().protocol().len(), 2);
        assert!(loader.protocol().is_empty());
    }

    #[test]
    fn test_declared_format_overrides_extension() {
        let mut loader = fake_loader("SHARED");
        let file = temp_file(".bin", b"ignored");
        assert!(loader.load(file.path(), Some(InputFormat::Pdf), None).is_ok());
        assert!(matches!(
            loader.load(file.path(), None, None),
            Err(DocledgerError::Conversion(ConversionError::UnsupportedFormat(_)))
        ));
    }

    #[test]
    fn test_conversion_failure() {
        let mut loader = fake_loader("");
        let pdf = temp_file(".pdf", b"%PDF-1.4");
        assert!(matches!(
            loader.load(pdf.path(), None, None),
            Err(DocledgerError::Conversion(ConversionError::Pdf(_)))
        ));
        assert!(matches!(
            loader.load(Path::new("/nonexistent/file.txt"), None, None),
            Err(DocledgerError::Conversion(ConversionError::Read { .. }))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let mut loader = fake_loader("");
        let file = temp_file(".txt", b"\xEF\xBB\xBFSHARED \xFF\xFE");
        let content = loader.read_content(file.path(), InputFormat::Txt, None).unwrap();
        assert!(content.starts_with("SHARED"));
        assert!(loader.load(file.path(), None, None).is_ok());
    }

    #[test]
    fn test_special_case_skips_detection() {
        let literal = DocumentSpec::Annotation(AnnotationSpec {
            fields: SpecFields::default().with_period(2021, 6).with_display("Ajuste"),
        });
        let mut loader = fake_loader("").with_special_cases(SpecialCases::new(vec![SpecialCase {
            suffix: "2021-06-ajuste.pdf".into(),
            spec: literal.clone(),
        }]));

        // The file does not exist: the special case must not read it.
        let spec = loader
            .load(Path::new("/nonexistent/2021-06-ajuste.pdf"), None, None)
            .unwrap();
        assert_eq!(spec, literal);
        assert!(loader.protocol().is_empty());

        let spec = loader
            .load(Path::new("/tmp/upload-1234"), None, Some("2021-06-ajuste.pdf"))
            .unwrap();
        assert_eq!(spec, literal);
    }

    #[test]
    fn test_workers_have_separate_protocols() {
        let mut loader = fake_loader("");
        let mut worker = loader.worker();
        worker.classify_text("SHARED", ContentFormat::Text, None, None).unwrap();
        assert!(loader.protocol().is_empty());
        loader.classify_text("SHARED", ContentFormat::Text, None, None).unwrap();
        assert_eq!(worker.protocol().protocol().len(), 1);
    }

    #[test]
    fn test_from_config_uses_standard_registry() {
        let mut config = DocledgerConfig::default();
        config.tables = LookupTables {
            own_rfcs: vec!["PEGJ800229AB1".into()],
            ..LookupTables::default()
        };
        let mut loader = DocumentLoader::from_config(&config);

        let note = "NOTA 2023-04\nPago adelantado de mantenimiento\n";
        let spec = loader
            .classify_text(note, ContentFormat::Text, None, Some("nota.txt"))
            .unwrap();
        assert_eq!(spec.document_type(), DocumentType::Annotation);
        assert_eq!(spec.year(), Some(2023));
        assert_eq!(spec.month(), Some(4));
    }

    fn standard_loader() -> DocumentLoader {
        let config = DocledgerConfig {
            tables: (*tables()).clone(),
            ..DocledgerConfig::default()
        };
        DocumentLoader::from_config(&config)
    }

    fn detector_names(loader: &DocumentLoader) -> Vec<String> {
        loader
            .protocol()
            .current()
            .map(|file| file.detectors.iter().map(|d| d.name.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_tax_notice_through_standard_registry() {
        let mut loader = standard_loader();
        let spec = loader
            .classify_text(TAX_NOTICE, ContentFormat::Text, None, Some("acuse.pdf"))
            .unwrap();

        assert_eq!(spec.document_type(), DocumentType::Attachment);
        assert_eq!(spec.month(), Some(1));
        assert_eq!(spec.year(), Some(2023));
        assert_eq!(spec.amount(), Some(337100));
        assert_eq!(detector_names(&loader), vec!["statement", "attachment"]);

        let file = loader.protocol().current().unwrap();
        let attachment = &file.detectors[1];
        assert_eq!(attachment.strategies[0].name, "sat_tax_notice");
        assert!(attachment.strategies[0].matched);
        assert!(attachment.parsing_result.as_ref().unwrap().success);
    }

    #[test]
    fn test_cfe_receipt_through_standard_registry() {
        let mut loader = standard_loader();
        let spec = loader
            .classify_text(&cfe_receipt("123456789012"), ContentFormat::Text, None, Some("cfe.pdf"))
            .unwrap();

        assert_eq!(spec.document_type(), DocumentType::Receipt);
        assert_eq!(spec.month(), Some(1));
        assert_eq!(spec.year(), Some(2023));
        assert_eq!(spec.amount(), Some(123400));
        assert_eq!(spec.fields().property_key.as_deref(), Some("casa-centro"));
        assert_eq!(
            detector_names(&loader),
            vec!["statement", "attachment", "expense", "tax", "receipt"]
        );

        let receipt = &loader.protocol().current().unwrap().detectors[4];
        let matched: Vec<&str> = receipt
            .strategies
            .iter()
            .filter(|s| s.matched)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(matched, vec!["cfe_receipt"]);
    }

    #[test]
    fn test_classification_is_repeatable() {
        let receipt = cfe_receipt("123456789012");
        for content in [TAX_NOTICE, receipt.as_str()] {
            let mut first = standard_loader();
            let mut second = standard_loader();
            let a = first.classify_text(content, ContentFormat::Text, None, None).unwrap();
            let b = second.classify_text(content, ContentFormat::Text, None, None).unwrap();
            assert_eq!(a, b);
            assert_eq!(
                first.protocol().current().unwrap().detectors,
                second.protocol().current().unwrap().detectors
            );
        }
    }

    #[test]
    fn test_payroll_complement_keeps_cfdi_parties() {
        let xml = cfdi(BBVA_RFC, OWN_RFC, "5000.00").replace(
            "  <cfdi:Complemento>\n",
            r#"  <cfdi:Complemento>
    <nomina12:Nomina xmlns:nomina12="http://www.sat.gob.mx/nomina12" Version="1.2">
      <nomina12:Emisor RegistroPatronal="Y1234567890"/>
      <nomina12:Receptor Curp="PEGJ800229HDFRMN09" NumEmpleado="17"/>
    </nomina12:Nomina>
"#,
        );
        let mut loader = standard_loader();
        let spec = loader
            .classify_text(&xml, ContentFormat::Xml, None, Some("nomina.xml"))
            .unwrap();

        assert_eq!(spec.document_type(), DocumentType::Attachment);
        assert_eq!(spec.amount(), Some(500000));
        assert_eq!(detector_names(&loader), vec!["attachment"]);
    }

    #[test]
    fn test_own_cfdi_mentioning_cash_voucher_is_an_invoice() {
        let xml = cfdi(OWN_RFC, SUPPLIER_RFC, "1160.00")
            .replace("Servicio de consultoria", "Reembolso VALE DE CAJA 17");
        let mut loader = standard_loader();
        let spec = loader
            .classify_text(&xml, ContentFormat::Xml, None, Some("factura.xml"))
            .unwrap();

        assert_eq!(spec.document_type(), DocumentType::Invoice);
        assert_eq!(detector_names(&loader), vec!["attachment", "expense", "invoice"]);
    }

    #[test]
    fn test_oversized_amount_does_not_abort_classification() {
        let content = TAX_NOTICE.replace("$3,371", "$99999999999999999999999999999");
        let mut loader = standard_loader();
        let spec = loader
            .classify_text(&content, ContentFormat::Text, None, None)
            .unwrap();

        assert_eq!(spec.document_type(), DocumentType::Attachment);
        assert_eq!(spec.amount(), None);
    }
}
