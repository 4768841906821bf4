//! Optical Character Recognition (OCR)
//!
//! Bridges the Tesseract CLI to read appointment slips and screenshots.
//! The engine reports whatever it read; timeouts and the "no text" rule are
//! enforced by the caller.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use medibook_core::OcrEngine;

/// Runs `tesseract <image> stdout -l <lang>` and captures stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    language: String,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            language: "eng".to_string(),
        }
    }

    /// Set language(s) for OCR (e.g., "eng", "eng+fra").
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image_path: &Path) -> Result<String> {
        info!(path = %image_path.display(), lang = %self.language, "Running OCR on image");
        let started = Instant::now();

        // kill_on_drop: a caller-side timeout drops this future and must not
        // leave tesseract running.
        let output = tokio::process::Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run OCR binary: {}", self.binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("tesseract exited with {}: {}", output.status, stderr.trim());
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = text.len(),
            "OCR finished"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_english() {
        let engine = TesseractCli::default();
        assert_eq!(engine.language(), "eng");
        assert_eq!(engine.name(), "tesseract");
    }

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let engine = TesseractCli::new("/nonexistent/medibook-tesseract");
        let err = engine.recognize(Path::new("slip.png")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to run OCR binary"));
    }
}
