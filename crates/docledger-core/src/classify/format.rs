//! Input format tags and their normalization for detector matching.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

/// Format of the raw input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Pdf,
    Txt,
    Xml,
}

impl InputFormat {
    /// Infer the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConversionError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        extension.parse()
    }

    /// Format label used by detectors: pdf and txt both become text.
    pub fn content_format(&self) -> ContentFormat {
        match self {
            InputFormat::Pdf | InputFormat::Txt => ContentFormat::Text,
            InputFormat::Xml => ContentFormat::Xml,
        }
    }
}

impl FromStr for InputFormat {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(InputFormat::Pdf),
            "txt" | "text" => Ok(InputFormat::Txt),
            "xml" => Ok(InputFormat::Xml),
            other => Err(ConversionError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputFormat::Pdf => "pdf",
            InputFormat::Txt => "txt",
            InputFormat::Xml => "xml",
        })
    }
}

/// Normalized content label detectors declare support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Text,
    Xml,
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContentFormat::Text => "text",
            ContentFormat::Xml => "xml",
        })
    }
}
