//! Error types for the docledger-core library.

use thiserror::Error;

/// Main error type for the docledger library.
#[derive(Error, Debug)]
pub enum DocledgerError {
    /// The input could not be turned into text.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// No detector claimed the document.
    #[error("detection error: {0}")]
    Detection(#[from] DetectionError),

    /// A strategy claimed the document but its fields could not be extracted.
    #[error("failed to parse {path} with strategy {strategy}: {source}")]
    Parse {
        path: String,
        strategy: String,
        #[source]
        source: ExtractionError,
    },

    /// A strategy was handed a spec it does not know how to name.
    #[error("filename error: {0}")]
    Filename(#[from] FilenameError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while obtaining text from the raw input.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The declared or inferred format is not one of pdf, txt, xml.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The source file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The PDF converter failed.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The external converter could not be run or exited with an error.
    #[error("converter failed: {0}")]
    Converter(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Support for this converter was not compiled in.
    #[error("PDF support is disabled in this build")]
    Disabled,
}

/// No detector or strategy claimed the document.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Every detector for the format was tried without a match.
    #[error("no detector matched {file}")]
    NoMatch { file: String },
}

/// Errors related to field extraction after a strategy matched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// A concept the strategy relies on was not found.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Failed to parse a value.
    #[error("failed to parse {field}: {value}")]
    Parse { field: String, value: String },

    /// The document looks like a CFDI but does not follow the schema.
    #[error("invalid tax XML: {0}")]
    TaxXml(String),
}

impl ExtractionError {
    pub fn missing(concept: impl Into<String>) -> Self {
        Self::MissingField(concept.into())
    }

    pub fn parse(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Parse {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Errors raised by filename suggestion.
#[derive(Error, Debug)]
pub enum FilenameError {
    /// The spec variant does not belong to the strategy.
    #[error("strategy {strategy} expected a {expected} spec, got {found}")]
    WrongVariant {
        strategy: String,
        expected: String,
        found: String,
    },
}

/// Result type for the docledger library.
pub type Result<T> = std::result::Result<T, DocledgerError>;
