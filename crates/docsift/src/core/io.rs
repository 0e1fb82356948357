//! Loading documents from disk.

use crate::types::Document;
use crate::{DocsiftError, Result};
use std::path::Path;

/// Validate that `path` names an existing regular file.
///
/// # Errors
///
/// Returns `DocsiftError::Validation` if the file doesn't exist or is a directory.
pub fn validate_file_exists(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DocsiftError::validation(format!("File does not exist: {}", path.display())));
    }
    if path.is_dir() {
        return Err(DocsiftError::validation(format!("Expected a file, got a directory: {}", path.display())));
    }
    Ok(())
}

/// Read `path` into a [`Document`] named after its last path component.
///
/// # Errors
///
/// Returns `DocsiftError::Io` for I/O errors (these always bubble up).
pub async fn read_document(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    validate_file_exists(path)?;

    let filename = file_name(path)?;
    let content = tokio::fs::read(path).await?;
    Ok(Document::new(filename, content))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| DocsiftError::validation(format!("Path has no file name: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_document_keeps_file_name_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Notes.TXT");
        std::fs::write(&path, "hello").unwrap();

        let document = read_document(&path).await.unwrap();
        assert_eq!(document.filename(), "Notes.TXT");
        assert_eq!(document.content(), b"hello");
    }

    #[test]
    fn test_missing_file() {
        let err = validate_file_exists("/nonexistent/docsift/input.pdf").unwrap_err();
        assert!(matches!(err, DocsiftError::Validation { .. }));
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_file_exists(dir.path()).is_err());
    }
}
