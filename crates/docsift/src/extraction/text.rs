//! Plain text files.

use crate::{DocsiftError, Result};

/// Return the file content unchanged. Input must be valid UTF-8.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(e) => Err(DocsiftError::extraction_failed(format!(
            "Text file is not valid UTF-8 (invalid byte at offset {})",
            e.valid_up_to()
        ))),
    }
}
