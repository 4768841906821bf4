use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// An optical character recognition backend.
///
/// Implementations return whatever text they found, possibly empty; deciding
/// that empty text is a failure is the caller's job.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name for logs (e.g., "tesseract").
    fn name(&self) -> &str;

    /// Recognize the text in the image stored at `image_path`.
    async fn recognize(&self, image_path: &Path) -> Result<String>;
}

/// Finds the first date/time expression in free text.
pub trait TimeExpressionExtractor: Send + Sync {
    /// Resolve the first recognized expression to an absolute instant.
    ///
    /// Wall-clock phrases ("3pm", "tomorrow") are read in `zone`. Ambiguous
    /// expressions resolve to the nearest occurrence after `reference`.
    fn extract(&self, text: &str, reference: DateTime<Utc>, zone: Tz) -> Option<DateTime<Utc>>;
}
