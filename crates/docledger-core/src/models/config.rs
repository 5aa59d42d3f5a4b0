//! Configuration structures for the classification pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::spec::DocumentSpec;

/// Main configuration for docledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocledgerConfig {
    /// PDF conversion configuration.
    pub pdf: PdfConfig,

    /// Lookup tables injected into the strategies.
    pub tables: LookupTables,

    /// Files that bypass detection.
    pub special_cases: Vec<SpecialCase>,
}

/// Which PDF-to-text converter to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConverterKind {
    /// In-process extraction with lopdf and pdf-extract.
    Embedded,
    /// External `pdftotext -layout`, keeps column alignment.
    #[default]
    Pdftotext,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Converter used for PDF inputs.
    pub converter: ConverterKind,

    /// Path or name of the pdftotext binary.
    pub pdftotext_path: PathBuf,

    /// Minimum text length to consider a PDF as text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            converter: ConverterKind::default(),
            pdftotext_path: PathBuf::from("pdftotext"),
            min_text_length: 20,
        }
    }
}

/// Static lookup data consulted by the strategies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupTables {
    /// Our own tax ids (RFC).
    pub own_rfcs: Vec<String>,

    /// Bank issuer RFC -> account number the bank CFDIs belong to.
    pub bank_accounts: BTreeMap<String, String>,

    /// Utility service number -> property key.
    pub service_properties: BTreeMap<String, String>,

    /// Property tax account -> property key.
    pub tax_account_properties: BTreeMap<String, String>,

    /// Bank account number -> property key.
    pub account_properties: BTreeMap<String, String>,
}

impl LookupTables {
    /// Whether the RFC is one of ours.
    pub fn is_own_rfc(&self, rfc: &str) -> bool {
        self.own_rfcs.iter().any(|own| own.eq_ignore_ascii_case(rfc.trim()))
    }

    pub fn bank_account(&self, issuer_rfc: &str) -> Option<&str> {
        self.bank_accounts
            .get(&issuer_rfc.trim().to_uppercase())
            .map(String::as_str)
    }

    pub fn property_for_service(&self, service: &str) -> Option<&str> {
        self.service_properties.get(service).map(String::as_str)
    }

    pub fn property_for_tax_account(&self, account: &str) -> Option<&str> {
        self.tax_account_properties.get(account).map(String::as_str)
    }

    pub fn property_for_account(&self, account: &str) -> Option<&str> {
        self.account_properties.get(account).map(String::as_str)
    }
}

/// A known irregular file and the spec it always maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialCase {
    /// Filename suffix the case applies to.
    pub suffix: String,

    /// Literal result.
    pub spec: DocumentSpec,
}

impl DocledgerConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
