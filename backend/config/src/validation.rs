//! Config validation with field paths in every message.

use chrono_tz::Tz;
use thiserror::Error;

use crate::schema::MedibookConfig;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &MedibookConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_scheduling(config, &mut report);
    validate_ocr(config, &mut report);
    report
}

fn validate_server(config: &MedibookConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.port == 0 {
        report.error("server.port", "Port must be non-zero");
    }
    if server.bind.trim().is_empty() {
        report.error("server.bind", "Bind address cannot be empty");
    }
    if server.max_upload_bytes == 0 {
        report.error("server.maxUploadBytes", "Upload limit must be greater than zero");
    }
    if server.uploads_dir.as_os_str().is_empty() {
        report.error("server.uploadsDir", "Uploads directory cannot be empty");
    }
}

fn validate_scheduling(config: &MedibookConfig, report: &mut ValidationReport) {
    let tz = &config.scheduling.default_timezone;
    if tz.parse::<Tz>().is_err() {
        report.error(
            "scheduling.defaultTimezone",
            format!("'{tz}' is not an IANA timezone name"),
        );
    }
    if config.scheduling.reference_instant.is_some() {
        report.warn(
            "scheduling.referenceInstant",
            "Reference instant is pinned; relative dates ignore the real clock",
        );
    }
}

fn validate_ocr(config: &MedibookConfig, report: &mut ValidationReport) {
    let ocr = &config.ocr;
    if ocr.timeout_secs == 0 {
        report.error("ocr.timeoutSecs", "OCR timeout must be greater than zero");
    }
    if ocr.language.trim().is_empty() {
        report.warn("ocr.language", "Empty OCR language; tesseract will use its default");
    }
}
