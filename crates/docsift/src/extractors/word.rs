//! `.doc` via antiword, `.docx` natively.

use super::{DocumentExtractor, ExtractionContext, run_blocking};
use crate::Result;
use crate::core::formats::FileFormat;
use crate::extraction::word::{extract_doc, extract_docx};
use crate::types::{Document, ExtractionResult};
use async_trait::async_trait;

pub struct WordExtractor;

#[async_trait]
impl DocumentExtractor for WordExtractor {
    fn name(&self) -> &str {
        "word"
    }

    fn supported_formats(&self) -> &[FileFormat] {
        &[FileFormat::Doc, FileFormat::Docx]
    }

    async fn extract(
        &self,
        document: &Document,
        format: FileFormat,
        context: &ExtractionContext<'_>,
    ) -> Result<ExtractionResult> {
        let text = match format {
            FileFormat::Doc => extract_doc(document.content(), &context.config.word).await?,
            _ => {
                let bytes = document.shared_content();
                run_blocking("DOCX", move || extract_docx(&bytes)).await?
            }
        };
        Ok(ExtractionResult::Text(text))
    }
}
