//! Core library for classifying Mexican financial source documents.
//!
//! This crate provides:
//! - PDF to text conversion (embedded text or `pdftotext -layout`)
//! - CFDI tax XML loading
//! - Field extraction rules (amounts, dates, RFC, CLABE, column blocks)
//! - Detectors and strategies that turn a document into a [`DocumentSpec`]
//! - A per-file detection protocol recording every attempt

pub mod cfdi;
pub mod classify;
pub mod error;
pub mod models;
pub mod pdf;
pub mod rules;

pub use cfdi::{CfdiLoader, TaxDocument, TaxXmlLoader};
pub use classify::{
    ContentFormat, DetectionProtocol, Detector, DetectorRegistry, DocumentLoader, InputFormat,
    MatchContext, MatchOutcome, Strategy,
};
pub use error::{DocledgerError, Result};
pub use models::config::DocledgerConfig;
pub use models::spec::{DocumentSpec, DocumentType, SpecFields};
pub use pdf::{PdfConverter, PdftotextConverter};
#[cfg(feature = "pdf")]
pub use pdf::{EmbeddedConverter, PdfExtractor};
