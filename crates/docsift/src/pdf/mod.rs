//! PDF processing.
//!
//! Text and tables are read through pdfium, which gives glyph positions and
//! page rendering. Page counting and embedded image export use lopdf and
//! need no native library.
//!
//! # Example
//!
//! ```rust,no_run
//! use docsift::core::config::ExtractionConfig;
//! use docsift::core::page_range::PageRange;
//! use docsift::pdf;
//!
//! # fn example() -> docsift::Result<()> {
//! let bytes = std::fs::read("report.pdf")?;
//! let range = PageRange::resolve(Some("1-3"), pdf::page_count(&bytes)?)?;
//!
//! let text = pdf::extract_text(&bytes, &range, &ExtractionConfig::default())?;
//! let tables = pdf::extract_tables(&bytes, &range, &ExtractionConfig::default().pdf)?;
//! println!("{} chars, {} tables", text.len(), tables.len());
//! # Ok(())
//! # }
//! ```
pub mod bindings;
pub mod error;
pub mod images;
pub mod layout;
pub mod markdown;
pub mod rendering;
pub mod table;
pub mod text;

pub use bindings::pdfium_available;
pub use error::PdfError;
pub use images::{ExtractedImage, extract_images};
pub use table::{StreamTableDetector, TableDetector};
pub use text::extract_text;

use crate::core::config::PdfConfig;
use crate::core::page_range::PageRange;
use crate::types::TableRecord;
use bindings::bind_pdfium;
use error::classify_load_error;
use pdfium_render::prelude::*;
use table::collect_table_records;

/// Number of pages in `bytes`.
pub fn page_count(bytes: &[u8]) -> crate::Result<usize> {
    Ok(images::page_count(bytes)?)
}

/// Bind pdfium, load `bytes` and hand the document to `f`.
pub(crate) fn with_document<T, F>(
    bytes: &[u8],
    map_err: fn(String) -> PdfError,
    context: &'static str,
    f: F,
) -> crate::Result<T>
where
    F: FnOnce(&PdfDocument<'_>) -> crate::Result<T>,
{
    let pdfium = Pdfium::new(bind_pdfium(map_err, context)?);
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| classify_load_error(e.to_string()))?;
    f(&document)
}

/// Tables on every page of `range`, numbered from 1 across the range.
pub fn extract_tables(bytes: &[u8], range: &PageRange, config: &PdfConfig) -> crate::Result<Vec<TableRecord>> {
    extract_tables_with(&StreamTableDetector::new(), bytes, range, config)
}

/// [`extract_tables`] with a caller-chosen detector.
///
/// A page whose layout cannot be read is logged and contributes no tables.
pub fn extract_tables_with(
    detector: &dyn TableDetector,
    bytes: &[u8],
    range: &PageRange,
    config: &PdfConfig,
) -> crate::Result<Vec<TableRecord>> {
    let layouts = with_document(bytes, PdfError::TableDetectionFailed, "table extraction", |document| {
        let pages = document.pages();
        let mut layouts = Vec::with_capacity(range.len());
        for index in range.iter() {
            let layout = u16::try_from(index)
                .ok()
                .and_then(|i| pages.get(i).ok())
                .ok_or(PdfError::PageNotFound(index + 1))
                .and_then(|page| text::page_layout(&page));
            match layout {
                Ok(layout) => layouts.push((index, layout)),
                Err(err) => {
                    tracing::warn!(page = index, error = %err, "Failed to read page layout, skipping its tables");
                }
            }
        }
        Ok(layouts)
    })?;

    let records = collect_table_records(detector, layouts, config.table_context_buffer);
    tracing::debug!(pages = range.len(), tables = records.len(), "Table detection finished");
    Ok(records)
}
