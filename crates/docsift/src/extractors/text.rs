//! Plain text extractor.

use super::{DocumentExtractor, ExtractionContext};
use crate::Result;
use crate::core::formats::FileFormat;
use crate::extraction::text::extract_text;
use crate::types::{Document, ExtractionResult};
use async_trait::async_trait;

/// Returns `.txt` content verbatim.
pub struct PlainTextExtractor;

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn supported_formats(&self) -> &[FileFormat] {
        &[FileFormat::Txt]
    }

    async fn extract(
        &self,
        document: &Document,
        _format: FileFormat,
        _context: &ExtractionContext<'_>,
    ) -> Result<ExtractionResult> {
        Ok(ExtractionResult::Text(extract_text(document.content())?))
    }
}
