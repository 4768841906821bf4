//! Default values used when the config file and environment are silent.

pub const DEFAULT_BIND: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 3000;

/// Where multipart image uploads are staged until the request finishes.
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";

/// 10 MiB per request body.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

pub const DEFAULT_OCR_BINARY: &str = "tesseract";

pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_LOG_LEVEL: &str = "info";
