use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::utils::error::AppError;

/// Root directory for uploaded report files. Created on first write.
pub fn upload_dir() -> PathBuf {
    PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()))
}

/// Builds the on-disk name for an upload: millisecond timestamp prefix plus
/// the sanitized original name, mirroring the historical naming scheme so
/// stored files stay recognizable.
pub fn stored_filename(original_name: &str) -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), sanitize(original_name))
}

/// Strips path separators and shell-hostile characters from a client-supplied
/// filename. Keeps alphanumerics, dots, dashes and underscores.
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Persists upload bytes under the upload dir and returns the relative path
/// stored in the File document's `url` field.
pub async fn save_upload(filename: &str, bytes: &[u8]) -> Result<String, AppError> {
    let dir = upload_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create upload dir: {}", e)))?;

    let path = dir.join(filename);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Database(format!("Failed to store file: {}", e)))?;

    Ok(path.to_string_lossy().into_owned())
}

/// Reads a previously stored file back. A missing file on disk is a 404, not
/// a server error: the document can outlive the bytes.
pub async fn read_stored(path: &str) -> Result<Vec<u8>, AppError> {
    if !Path::new(path).exists() {
        return Err(AppError::NotFound("File not found on server".to_string()));
    }
    tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Database(format!("Failed to read file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_path_separators() {
        assert_eq!(sanitize("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize("blood test (may).pdf"), "blood_test__may_.pdf");
        assert_eq!(sanitize("report.pdf"), "report.pdf");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize(""), "file");
    }

    #[test]
    fn test_stored_filename_keeps_extension() {
        let name = stored_filename("cbc-report.pdf");
        assert!(name.ends_with("-cbc-report.pdf"));
        let prefix = name.split('-').next().unwrap();
        assert!(prefix.parse::<i64>().is_ok());
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let err = read_stored("uploads/definitely-missing-file.bin")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
