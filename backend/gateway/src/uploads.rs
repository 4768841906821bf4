//! Staging of uploaded images.
//!
//! An upload lives on disk only for the duration of one request. The normal
//! path calls [`TempUpload::cleanup`]; if the request bails out early (error,
//! panic, client disconnect dropping the future) `Drop` removes the file.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use medibook_core::ScheduleError;

/// An uploaded file staged under the uploads directory.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    removed: bool,
}

impl TempUpload {
    /// Write `bytes` to a fresh, uniquely named file in `dir`.
    pub async fn persist(
        dir: &Path,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<Self, ScheduleError> {
        fs::create_dir_all(dir).await.map_err(|e| {
            ScheduleError::Upload(format!("cannot create {}: {e}", dir.display()))
        })?;

        let mut name = Uuid::new_v4().simple().to_string();
        if let Some(ext) = original_name.and_then(safe_extension) {
            name.push('.');
            name.push_str(&ext);
        }
        let path = dir.join(name);

        // Construct first so a failed write is still cleaned up.
        let upload = Self {
            path,
            removed: false,
        };
        fs::write(&upload.path, bytes).await.map_err(|e| {
            ScheduleError::Upload(format!("cannot write {}: {e}", upload.path.display()))
        })?;
        debug!(path = %upload.path.display(), bytes = bytes.len(), "Staged upload");
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file. Failures are logged and otherwise ignored.
    pub async fn cleanup(mut self) {
        match fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "Cleaned up upload"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to clean up upload"),
        }
        self.removed = true;
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Cleaned up abandoned upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to clean up upload"),
        }
    }
}

/// Keep short alphanumeric extensions so OCR can still sniff the format.
fn safe_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    let ok = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    ok.then(|| ext.to_ascii_lowercase())
}
