//! Converter backed by the external `pdftotext -layout` tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use super::{ensure_text, PdfConverter, Result};
use crate::error::PdfError;

/// Runs `pdftotext -layout <file> -` and captures stdout.
pub struct PdftotextConverter {
    binary: PathBuf,
    min_text_length: usize,
}

impl PdftotextConverter {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            min_text_length: 1,
        }
    }

    pub fn with_min_text_length(mut self, min: usize) -> Self {
        self.min_text_length = min;
        self
    }
}

impl Default for PdftotextConverter {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

impl PdfConverter for PdftotextConverter {
    fn convert(&self, path: &Path, original_name: Option<&str>) -> Result<String> {
        debug!(
            "Running {} on {} ({})",
            self.binary.display(),
            path.display(),
            original_name.unwrap_or("-")
        );

        let output = Command::new(&self.binary)
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| PdfError::Converter(format!("{}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("pdftotext failed on {}: {}", path.display(), stderr.trim());
            return Err(PdfError::Converter(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        ensure_text(text, self.min_text_length)
    }
}
