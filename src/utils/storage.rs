use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use log::{info, warn};

use crate::config::ALLOWED_EXTENSIONS;
use crate::error::{AppError, Result};

/// Writes an uploaded file without blocking the runtime thread.
pub async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::fs::write(path, bytes).await?;
    info!("Stored {} bytes at {}", bytes.len(), path.display());
    Ok(())
}

/// Deletes a file; a file that is already gone counts as deleted.
pub fn delete_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("Deleted {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("File already gone: {}", path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Reduces a client supplied file name to a bare, allowed audio file name.
///
/// Directory components are dropped, the extension is lower-cased and must
/// be one of the accepted audio formats.
pub fn sanitize_upload_name(raw: &str) -> Result<String> {
    // Browsers on Windows may send the full client path
    let base = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();

    let path = Path::new(base);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| !s.is_empty() && !s.starts_with('.'))
        .ok_or_else(|| AppError::InvalidFileName(raw.to_string()))?;

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .ok_or_else(|| AppError::UnsupportedFormat(raw.to_string()))?;

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::UnsupportedFormat(extension));
    }

    Ok(format!("{}.{}", stem, extension))
}
