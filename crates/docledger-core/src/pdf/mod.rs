//! PDF to text conversion.

#[cfg(feature = "pdf")]
mod extractor;
mod pdftotext;

#[cfg(feature = "pdf")]
pub use extractor::{EmbeddedConverter, PdfExtractor};
pub use pdftotext::PdftotextConverter;

use std::path::Path;

use crate::error::PdfError;
use crate::models::config::{ConverterKind, PdfConfig};

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Turns a PDF file into printable text with approximate column alignment.
pub trait PdfConverter: Send + Sync {
    /// Convert the PDF at `path`. `original_name` is informational only.
    fn convert(&self, path: &Path, original_name: Option<&str>) -> Result<String>;
}

/// Build the converter selected in the configuration.
pub fn converter_from_config(config: &PdfConfig) -> Box<dyn PdfConverter> {
    match config.converter {
        ConverterKind::Pdftotext => Box::new(
            PdftotextConverter::new(config.pdftotext_path.clone())
                .with_min_text_length(config.min_text_length),
        ),
        #[cfg(feature = "pdf")]
        ConverterKind::Embedded => {
            Box::new(EmbeddedConverter::new().with_min_text_length(config.min_text_length))
        }
        #[cfg(not(feature = "pdf"))]
        ConverterKind::Embedded => Box::new(DisabledConverter),
    }
}

#[cfg(not(feature = "pdf"))]
struct DisabledConverter;

#[cfg(not(feature = "pdf"))]
impl PdfConverter for DisabledConverter {
    fn convert(&self, _path: &Path, _original_name: Option<&str>) -> Result<String> {
        Err(PdfError::Disabled)
    }
}

/// Reject converter output too short to be a text PDF.
pub(crate) fn ensure_text(text: String, min_text_length: usize) -> Result<String> {
    if text.trim().chars().count() < min_text_length {
        return Err(PdfError::TextExtraction(format!(
            "only {} characters of text, the PDF is probably scanned",
            text.trim().chars().count()
        )));
    }
    Ok(text)
}
