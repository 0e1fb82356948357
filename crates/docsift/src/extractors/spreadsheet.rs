//! CSV, TSV and XLSX as markdown tables.

use super::{DocumentExtractor, ExtractionContext, run_blocking};
use crate::Result;
use crate::core::formats::FileFormat;
use crate::extraction::spreadsheet::{delimited_to_markdown, xlsx_to_markdown};
use crate::types::{Document, ExtractionResult};
use async_trait::async_trait;

pub struct SpreadsheetExtractor;

#[async_trait]
impl DocumentExtractor for SpreadsheetExtractor {
    fn name(&self) -> &str {
        "spreadsheet"
    }

    fn supported_formats(&self) -> &[FileFormat] {
        &[FileFormat::Csv, FileFormat::Tsv, FileFormat::Xlsx]
    }

    async fn extract(
        &self,
        document: &Document,
        format: FileFormat,
        _context: &ExtractionContext<'_>,
    ) -> Result<ExtractionResult> {
        let bytes = document.shared_content();
        let markdown = run_blocking("spreadsheet", move || match format {
            FileFormat::Csv => delimited_to_markdown(&bytes, b','),
            FileFormat::Tsv => delimited_to_markdown(&bytes, b'\t'),
            _ => xlsx_to_markdown(&bytes),
        })
        .await?;
        Ok(ExtractionResult::Text(markdown))
    }
}
