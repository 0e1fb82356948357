//! Standalone JPEG and PNG files, read with OCR.

use super::{DocumentExtractor, ExtractionContext, run_blocking};
use crate::core::formats::FileFormat;
use crate::ocr;
use crate::types::{Document, ExtractionResult};
use crate::{DocsiftError, Result};
use async_trait::async_trait;

/// Unlike scanned PDF pages, a failed recognition here fails the call: the
/// image is the whole document.
pub struct ImageExtractor;

#[async_trait]
impl DocumentExtractor for ImageExtractor {
    fn name(&self) -> &str {
        "image-ocr"
    }

    fn supported_formats(&self) -> &[FileFormat] {
        &[FileFormat::Jpeg, FileFormat::Png]
    }

    async fn extract(
        &self,
        document: &Document,
        _format: FileFormat,
        context: &ExtractionContext<'_>,
    ) -> Result<ExtractionResult> {
        let bytes = document.shared_content();
        let ocr_config = context.config.ocr.clone();

        let text = run_blocking("image OCR", move || {
            let image = image::load_from_memory(&bytes)
                .map_err(|e| DocsiftError::extraction_failed_with_source("Failed to decode image", e))?;
            let engine = ocr::initialize(&ocr_config)?;
            Ok(engine.recognize(&image)?)
        })
        .await?;

        Ok(ExtractionResult::Text(text))
    }
}
