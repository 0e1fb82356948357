//! Page text with OCR fallback.
//!
//! Every requested page is read through its text layer first. A page whose
//! text layer is blank (a scan, a photo, a flattened print) is rendered and
//! handed to the process-wide OCR engine instead. Pages with text are
//! converted to markdown from their word geometry.
//!
//! OCR problems on a single page never fail the document: the page is
//! logged and contributes no text.

use super::error::PdfError;
use super::layout::{BoundingBox, Glyph, PageLayout};
use super::markdown::page_to_markdown;
use super::rendering::render_page;
use super::with_document;
use crate::Result;
use crate::core::config::{ExtractionConfig, PdfConfig};
use crate::core::page_range::PageRange;
use crate::core::parallel::{run_segments, should_parallelize};
use crate::ocr::{self, OcrEngine};
use image::DynamicImage;
use pdfium_render::prelude::*;

/// The page operations text extraction relies on.
pub trait TextPage {
    /// Raw text layer, possibly empty.
    fn native_text(&self) -> std::result::Result<String, PdfError>;

    fn layout(&self) -> std::result::Result<PageLayout, PdfError>;

    fn render(&self, scale: f32) -> std::result::Result<DynamicImage, PdfError>;
}

impl TextPage for PdfPage<'_> {
    fn native_text(&self) -> std::result::Result<String, PdfError> {
        let text = self
            .text()
            .map_err(|e| PdfError::TextExtractionFailed(format!("Failed to get page text: {}", e)))?;
        Ok(text.all())
    }

    fn layout(&self) -> std::result::Result<PageLayout, PdfError> {
        page_layout(self)
    }

    fn render(&self, scale: f32) -> std::result::Result<DynamicImage, PdfError> {
        render_page(self, scale)
    }
}

/// Positioned glyphs of a pdfium page, converted to top-left coordinates.
pub fn page_layout(page: &PdfPage) -> std::result::Result<PageLayout, PdfError> {
    let page_width = page.width().value;
    let page_height = page.height().value;

    let text = page
        .text()
        .map_err(|e| PdfError::TextExtractionFailed(format!("Failed to get page text: {}", e)))?;

    let mut glyphs = Vec::new();
    for pdf_char in text.chars().iter() {
        let Some(ch) = pdf_char.unicode_char() else {
            continue;
        };
        let bounds = pdf_char
            .loose_bounds()
            .map_err(|e| PdfError::TextExtractionFailed(format!("Failed to get char bounds: {}", e)))?;

        let left = bounds.left().value;
        let bottom = bounds.bottom().value;
        glyphs.push(Glyph {
            ch,
            bbox: BoundingBox::from_pdf_rect(
                left,
                bottom,
                left + bounds.width().value,
                bottom + bounds.height().value,
                page_height,
            ),
        });
    }

    Ok(PageLayout::from_glyphs(page_width, page_height, &glyphs))
}

/// Text of one page: markdown when a text layer exists, OCR otherwise.
///
/// The OCR engine is fetched (and built on first use) only when a page
/// actually needs it; an engine that cannot be built fails the call.
pub fn extract_page_text<P>(page_index: usize, page: &P, config: &ExtractionConfig) -> Result<String>
where
    P: TextPage + ?Sized,
{
    let native = page.native_text()?;
    if native.trim().is_empty() {
        tracing::debug!(page = page_index, "Page has no text layer, using OCR");
        let engine = ocr::initialize(&config.ocr)?;
        return Ok(ocr_page(page_index, page, engine.as_ref(), config.pdf.render_scale));
    }

    tracing::debug!(page = page_index, chars = native.len(), "Using native page text");
    let markdown = page_to_markdown(&page.layout()?);
    if markdown.trim().is_empty() {
        // Text layer without usable glyph positions.
        return Ok(format!("{}\n\n", native.trim()));
    }
    Ok(markdown)
}

/// Render and recognize one page, yielding "" on any failure.
pub fn ocr_page<P>(page_index: usize, page: &P, engine: &dyn OcrEngine, scale: f32) -> String
where
    P: TextPage + ?Sized,
{
    let image = match page.render(scale) {
        Ok(image) => image,
        Err(err) => {
            tracing::warn!(page = page_index, error = %err, "Failed to render page for OCR, skipping");
            return String::new();
        }
    };

    match engine.recognize(&image) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(page = page_index, engine = engine.name(), error = %err, "OCR failed, skipping page");
            String::new()
        }
    }
}

/// Extract `indices` from a private document handle.
///
/// Each call binds pdfium and loads `bytes` itself, so segments running on
/// different workers never share a document.
pub fn extract_text_segment(bytes: &[u8], indices: &[usize], config: &ExtractionConfig) -> Result<String> {
    with_document(bytes, PdfError::TextExtractionFailed, "text extraction", |document| {
        let pages = document.pages();
        let mut text = String::new();
        for &index in indices {
            let page = u16::try_from(index)
                .ok()
                .and_then(|i| pages.get(i).ok())
                .ok_or(PdfError::PageNotFound(index + 1))?;
            text.push_str(&extract_page_text(index, &page, config)?);
        }
        Ok(text)
    })
}

/// Text of every page in `range`, in ascending page order.
pub fn extract_text(bytes: &[u8], range: &PageRange, config: &ExtractionConfig) -> Result<String> {
    extract_text_with(range, &config.pdf, |indices| extract_text_segment(bytes, indices, config))
}

/// Run `segment` over `range`, sequentially or split across workers.
///
/// Segment outputs are concatenated in segment order, so both paths produce
/// the same string for the same input.
pub fn extract_text_with<F>(range: &PageRange, config: &PdfConfig, segment: F) -> Result<String>
where
    F: Fn(&[usize]) -> Result<String> + Sync,
{
    if should_parallelize(range, config) {
        let parts = run_segments(range.indices(), config.worker_count(), |_, indices| segment(indices))?;
        return Ok(parts.concat());
    }
    segment(range.indices())
}

#[cfg(test)]
mod tests {
    use super::super::layout::test_support::glyphs;
    use super::*;
    use crate::DocsiftError;
    use crate::ocr::OcrError;
    use serial_test::serial;
    use std::sync::Arc;

    struct FakePage {
        text: &'static str,
        layout: PageLayout,
        renders: bool,
    }

    impl FakePage {
        fn scanned() -> Self {
            Self {
                text: "  \n",
                layout: PageLayout::default(),
                renders: true,
            }
        }

        fn with_text(text: &'static str) -> Self {
            Self {
                text,
                layout: PageLayout::from_glyphs(612.0, 792.0, &glyphs(text, 72.0, 100.0, 10.0)),
                renders: true,
            }
        }
    }

    impl TextPage for FakePage {
        fn native_text(&self) -> std::result::Result<String, PdfError> {
            Ok(self.text.to_string())
        }

        fn layout(&self) -> std::result::Result<PageLayout, PdfError> {
            Ok(self.layout.clone())
        }

        fn render(&self, _scale: f32) -> std::result::Result<DynamicImage, PdfError> {
            if self.renders {
                Ok(DynamicImage::new_rgb8(8, 8))
            } else {
                Err(PdfError::RenderingFailed("bitmap allocation failed".to_string()))
            }
        }
    }

    struct FixedEngine(&'static str);

    impl OcrEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenEngine;

    impl OcrEngine for BrokenEngine {
        fn name(&self) -> &str {
            "broken"
        }

        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<String, OcrError> {
            Err(OcrError::ProcessingFailed("model crashed".to_string()))
        }
    }

    #[test]
    fn test_native_text_becomes_markdown() {
        let page = FakePage::with_text("Quarterly report");
        let text = extract_page_text(0, &page, &ExtractionConfig::default()).unwrap();
        assert_eq!(text, "Quarterly report\n\n");
    }

    #[test]
    fn test_native_text_without_positions_is_kept() {
        let page = FakePage {
            text: "Loose text",
            layout: PageLayout::default(),
            renders: true,
        };
        let text = extract_page_text(0, &page, &ExtractionConfig::default()).unwrap();
        assert_eq!(text, "Loose text\n\n");
    }

    #[test]
    #[serial]
    fn test_scanned_page_uses_ocr() {
        ocr::install_engine(Arc::new(FixedEngine("Scanned invoice ")));
        let text = extract_page_text(2, &FakePage::scanned(), &ExtractionConfig::default()).unwrap();
        assert_eq!(text, "Scanned invoice ");
        ocr::reset_engine();
    }

    #[test]
    #[serial]
    fn test_scanned_page_with_blank_ocr_is_empty() {
        ocr::install_engine(Arc::new(FixedEngine("")));
        let text = extract_page_text(0, &FakePage::scanned(), &ExtractionConfig::default()).unwrap();
        assert!(text.is_empty());
        ocr::reset_engine();
    }

    #[test]
    fn test_ocr_failure_yields_empty_page() {
        assert_eq!(ocr_page(4, &FakePage::scanned(), &BrokenEngine, 1.0), "");
    }

    #[test]
    fn test_render_failure_yields_empty_page() {
        let page = FakePage {
            renders: false,
            ..FakePage::scanned()
        };
        assert_eq!(ocr_page(0, &page, &FixedEngine("never"), 1.0), "");
    }

    #[test]
    #[serial]
    fn test_unavailable_engine_fails_call() {
        ocr::reset_engine();
        let mut config = ExtractionConfig::default();
        config.ocr.backend = "no-such-backend".to_string();
        let err = extract_page_text(0, &FakePage::scanned(), &config).unwrap_err();
        assert!(matches!(err, DocsiftError::Ocr { .. }));
        ocr::reset_engine();
    }

    fn page_texts(indices: &[usize]) -> Result<String> {
        Ok(indices.iter().map(|i| format!("page {}\n\n", i + 1)).collect())
    }

    #[test]
    fn test_parallel_and_sequential_output_match() {
        let range = PageRange::resolve(None, 40).unwrap();
        let sequential = PdfConfig {
            parallel: false,
            ..Default::default()
        };
        let parallel = PdfConfig {
            parallel: true,
            max_workers: Some(4),
            parallel_page_threshold: 5,
            ..Default::default()
        };
        let a = extract_text_with(&range, &sequential, page_texts).unwrap();
        let b = extract_text_with(&range, &parallel, page_texts).unwrap();
        assert_eq!(a, b);
        assert!(b.starts_with("page 1\n\npage 2\n\n"));
        assert!(b.ends_with("page 40\n\n"));
    }

    #[test]
    fn test_selected_pages_are_concatenated_in_order() {
        let range = PageRange::resolve(Some("1-3,5"), 6).unwrap();
        let text = extract_text_with(&range, &PdfConfig::default(), page_texts).unwrap();
        assert_eq!(text, "page 1\n\npage 2\n\npage 3\n\npage 5\n\n");
    }

    #[test]
    fn test_segment_error_fails_whole_call() {
        let range = PageRange::resolve(None, 30).unwrap();
        let config = PdfConfig {
            max_workers: Some(3),
            parallel_page_threshold: 1,
            ..Default::default()
        };
        let result = extract_text_with(&range, &config, |indices| {
            if indices.contains(&15) {
                Err(DocsiftError::extraction_failed("corrupt content stream"))
            } else {
                page_texts(indices)
            }
        });
        assert!(result.is_err());
    }
}
