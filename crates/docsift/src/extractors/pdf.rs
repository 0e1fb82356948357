//! PDF extractor: text, tables or images depending on the request.

use super::{DocumentExtractor, ExtractionContext, run_blocking};
use crate::Result;
use crate::core::formats::FileFormat;
use crate::core::page_range::PageRange;
use crate::pdf;
use crate::storage::{self, upload_images};
use crate::types::{Document, ExtractionCategory, ExtractionResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Every PDF call resolves the page range first, so a malformed expression
/// fails before any page is touched.
pub struct PdfExtractor;

impl PdfExtractor {
    async fn resolve_range(bytes: Arc<[u8]>, expression: Option<String>) -> Result<PageRange> {
        run_blocking("page count", move || {
            let page_count = pdf::page_count(&bytes)?;
            PageRange::resolve(expression.as_deref(), page_count)
        })
        .await
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn supported_formats(&self) -> &[FileFormat] {
        &[FileFormat::Pdf]
    }

    async fn extract(
        &self,
        document: &Document,
        _format: FileFormat,
        context: &ExtractionContext<'_>,
    ) -> Result<ExtractionResult> {
        let bytes = document.shared_content();
        let range = Self::resolve_range(Arc::clone(&bytes), context.request.page_range.clone()).await?;

        tracing::debug!(
            file = document.filename(),
            category = %context.request.category,
            pages = range.len(),
            "Extracting PDF"
        );

        match context.request.category {
            ExtractionCategory::Text => {
                let config = context.config.clone();
                let text = run_blocking("PDF text", move || pdf::extract_text(&bytes, &range, &config)).await?;
                Ok(ExtractionResult::Text(text))
            }
            ExtractionCategory::Tables => {
                let config = context.config.pdf.clone();
                let tables = run_blocking("PDF tables", move || pdf::extract_tables(&bytes, &range, &config)).await?;
                Ok(ExtractionResult::TableSet(tables))
            }
            ExtractionCategory::Images => {
                let images =
                    run_blocking("PDF images", move || Ok(pdf::extract_images(&bytes, &range)?)).await?;
                if images.is_empty() {
                    return Ok(ExtractionResult::ImageSet(Vec::new()));
                }

                let store = match &context.store {
                    Some(store) => Arc::clone(store),
                    None => storage::object_store_from_config(&context.config.storage).await?,
                };
                let found = images.len();
                let records = upload_images(store, images, &context.config.storage).await?;
                if records.is_empty() {
                    let message = format!(
                        "Found {} images in pages {} of {} but none could be uploaded.",
                        found,
                        context.request.page_label(),
                        document.filename()
                    );
                    tracing::warn!("{}", message);
                    return Ok(ExtractionResult::NotFound {
                        category: ExtractionCategory::Images,
                        message,
                    });
                }
                Ok(ExtractionResult::ImageSet(records))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocsiftError;
    use crate::core::config::ExtractionConfig;
    use crate::storage::MemoryObjectStore;
    use crate::types::ExtractionRequest;
    use lopdf::{Dictionary, Object, Stream, dictionary};

    /// Pages with one raw 2x2 gray image each.
    fn pdf_with_gray_images(pages: usize) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..pages {
            let image = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 2,
                    "Height" => 2,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![0u8, 255, 255, 0],
            ));
            let mut xobjects = Dictionary::new();
            xobjects.set("Im0", image);
            let page = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 200.into(), 200.into()],
                "Resources" => dictionary! { "XObject" => xobjects },
            });
            kids.push(Object::Reference(page));
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => count }),
        );
        let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[tokio::test]
    async fn test_images_uploaded_to_given_store() {
        let document = Document::new("scan.pdf", pdf_with_gray_images(3));
        let request = ExtractionRequest::new(ExtractionCategory::Images).with_page_range("1,3");
        let mut config = ExtractionConfig::default();
        config.storage.key_prefix = Some("req".to_string());
        let store = Arc::new(MemoryObjectStore::new("scans"));
        let context = ExtractionContext::new(&request, &config).with_store(store.clone());

        let result = PdfExtractor.extract(&document, FileFormat::Pdf, &context).await.unwrap();

        let images = result.images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].image_index, 1);
        assert_eq!(images[0].image_url, "https://scans.s3.amazonaws.com/req/page_1_image_1.png");
        assert_eq!(images[1].image_url, "https://scans.s3.amazonaws.com/req/page_3_image_1.png");
        assert_eq!(store.keys().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_every_upload_failing_is_reported() {
        let document = Document::new("scan.pdf", pdf_with_gray_images(2));
        let request = ExtractionRequest::new(ExtractionCategory::Images);
        let config = ExtractionConfig::default();
        let store = Arc::new(MemoryObjectStore::new("scans"));
        store.fail_on(".png");
        let context = ExtractionContext::new(&request, &config).with_store(store);

        let result = PdfExtractor.extract(&document, FileFormat::Pdf, &context).await.unwrap();

        match result {
            ExtractionResult::NotFound { category, message } => {
                assert_eq!(category, ExtractionCategory::Images);
                assert_eq!(message, "Found 2 images in pages all of scan.pdf but none could be uploaded.");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_range_fails_before_extraction() {
        let document = Document::new("scan.pdf", pdf_with_gray_images(2));
        let request = ExtractionRequest::new(ExtractionCategory::Images).with_page_range("5-3");
        let config = ExtractionConfig::default();
        let context = ExtractionContext::new(&request, &config);

        let err = PdfExtractor.extract(&document, FileFormat::Pdf, &context).await.unwrap_err();
        assert!(matches!(err, DocsiftError::InvalidPageRange { .. }));
    }

    #[tokio::test]
    async fn test_out_of_bounds_range_fails() {
        let document = Document::new("scan.pdf", pdf_with_gray_images(2));
        let request = ExtractionRequest::new(ExtractionCategory::Images).with_page_range("7-9");
        let config = ExtractionConfig::default();
        let context = ExtractionContext::new(&request, &config);

        let err = PdfExtractor.extract(&document, FileFormat::Pdf, &context).await.unwrap_err();
        assert!(matches!(err, DocsiftError::InvalidPageRange { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_fails() {
        let document = Document::new("broken.pdf", b"%PDF-1.7 truncated".to_vec());
        let request = ExtractionRequest::new(ExtractionCategory::Text);
        let config = ExtractionConfig::default();
        let context = ExtractionContext::new(&request, &config);

        let err = PdfExtractor.extract(&document, FileFormat::Pdf, &context).await.unwrap_err();
        assert!(matches!(err, DocsiftError::ExtractionFailed { .. }));
    }
}
