//! PDF extraction through the public entry points.
//!
//! Image tests only need lopdf. Text and table tests need the pdfium shared
//! library and skip themselves when it is missing.

mod helpers;

use docsift::storage::ObjectStore;
use docsift::{
    DocsiftError, Document, ExtractionCategory, ExtractionConfig, ExtractionRequest, ExtractionResult,
    MemoryObjectStore, ResetScope, extract_bytes, extract_bytes_with_store,
};
use helpers::{FixedOcr, PageSpec, build_pdf, skip_without_pdfium, text_pdf};
use serial_test::serial;
use std::sync::Arc;

const SIX_PAGES: [&str; 6] = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot"];

fn images_request() -> ExtractionRequest {
    ExtractionRequest::new(ExtractionCategory::Images)
}

#[tokio::test]
async fn test_images_numbered_across_pages() {
    let pdf = build_pdf(&[PageSpec::GrayImages(2), PageSpec::Blank, PageSpec::GrayImages(1)]);
    let document = Document::new("scan.pdf", pdf);
    let mut config = ExtractionConfig::default();
    config.storage.key_prefix = Some("run-1".to_string());
    let store = Arc::new(MemoryObjectStore::new("uploads"));

    let response = extract_bytes_with_store(&document, &images_request(), &config, store.clone())
        .await
        .unwrap();

    let urls: Vec<_> = response.result.images().iter().map(|i| (i.image_index, i.image_url.as_str())).collect();
    assert_eq!(
        urls,
        vec![
            (1, "https://uploads.s3.amazonaws.com/run-1/page_1_image_1.png"),
            (2, "https://uploads.s3.amazonaws.com/run-1/page_1_image_2.png"),
            (3, "https://uploads.s3.amazonaws.com/run-1/page_3_image_1.png"),
        ]
    );
    assert_eq!(response.message, "Extracted images from pages all in scan.pdf.");

    let stored = store.get("run-1/page_1_image_1.png").unwrap().unwrap();
    assert_eq!(stored.content_type, "image/png");
    assert!(stored.data.starts_with(b"\x89PNG"));
}

#[tokio::test]
async fn test_failed_upload_is_omitted() {
    let pdf = build_pdf(&[PageSpec::GrayImages(1), PageSpec::GrayImages(1), PageSpec::GrayImages(1)]);
    let document = Document::new("scan.pdf", pdf);
    let mut config = ExtractionConfig::default();
    config.storage.key_prefix = Some("batch".to_string());
    let store = Arc::new(MemoryObjectStore::new("uploads"));
    store.fail_on("page_2_image_1.png");

    let response = extract_bytes_with_store(&document, &images_request(), &config, store)
        .await
        .unwrap();

    let indices: Vec<_> = response.result.images().iter().map(|i| i.image_index).collect();
    assert_eq!(indices, vec![1, 3]);
}

#[tokio::test]
async fn test_all_uploads_failing_is_not_reported_as_no_images() {
    let pdf = build_pdf(&[PageSpec::GrayImages(2), PageSpec::GrayImages(1)]);
    let document = Document::new("scan.pdf", pdf);
    let store = Arc::new(MemoryObjectStore::new("uploads"));
    store.fail_on(".png");

    let response = extract_bytes_with_store(&document, &images_request(), &ExtractionConfig::default(), store)
        .await
        .unwrap();

    assert!(response.result.is_not_found());
    assert_eq!(
        response.message,
        "Found 3 images in pages all of scan.pdf but none could be uploaded."
    );
}

#[tokio::test]
async fn test_namespace_reset_keeps_other_runs() {
    let document = Document::new("scan.pdf", build_pdf(&[PageSpec::GrayImages(1)]));
    let mut config = ExtractionConfig::default();
    config.storage.key_prefix = Some("mine".to_string());
    config.storage.reset_scope = ResetScope::Namespace;

    let store = Arc::new(MemoryObjectStore::new("uploads"));
    store.put("mine/stale.png", vec![1], "image/png").await.unwrap();
    store.put("theirs/page_1_image_1.png", vec![2], "image/png").await.unwrap();

    extract_bytes_with_store(&document, &images_request(), &config, store.clone())
        .await
        .unwrap();

    assert_eq!(
        store.keys().unwrap(),
        vec!["mine/page_1_image_1.png".to_string(), "theirs/page_1_image_1.png".to_string()]
    );
}

#[tokio::test]
async fn test_bucket_reset_wipes_everything() {
    let document = Document::new("scan.pdf", build_pdf(&[PageSpec::GrayImages(1)]));
    let mut config = ExtractionConfig::default();
    config.storage.key_prefix = Some(String::new());
    config.storage.reset_scope = ResetScope::Bucket;

    let store = Arc::new(MemoryObjectStore::new("uploads"));
    store.put("theirs/old.png", vec![2], "image/png").await.unwrap();

    extract_bytes_with_store(&document, &images_request(), &config, store.clone())
        .await
        .unwrap();

    assert_eq!(store.keys().unwrap(), vec!["page_1_image_1.png".to_string()]);
}

#[tokio::test]
async fn test_no_images_is_not_found() {
    let document = Document::new("plain.pdf", build_pdf(&[PageSpec::Blank, PageSpec::Blank]));
    let request = images_request().with_page_range("2");
    let store = Arc::new(MemoryObjectStore::new("uploads"));

    let response = extract_bytes_with_store(&document, &request, &ExtractionConfig::default(), store.clone())
        .await
        .unwrap();

    assert_eq!(
        response.result,
        ExtractionResult::NotFound {
            category: ExtractionCategory::Images,
            message: "No images found in pages 2 of plain.pdf.".to_string(),
        }
    );
    assert!(store.keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_range_outside_document_fails() {
    let document = Document::new("short.pdf", build_pdf(&[PageSpec::Blank, PageSpec::Blank]));
    let request = images_request().with_page_range("4-6");

    let err = extract_bytes(&document, &request, &ExtractionConfig::default())
        .await
        .unwrap_err();
    match err {
        DocsiftError::InvalidPageRange { expression, .. } => assert_eq!(expression, "4-6"),
        other => panic!("expected InvalidPageRange, got {other:?}"),
    }
}

#[tokio::test]
async fn test_text_follows_page_order() {
    if skip_without_pdfium("test_text_follows_page_order") {
        return;
    }
    let document = Document::new("six.pdf", text_pdf(&SIX_PAGES));
    let request = ExtractionRequest::new(ExtractionCategory::Text).with_page_range("5,1-3");

    let response = extract_bytes(&document, &request, &ExtractionConfig::default())
        .await
        .unwrap();
    let text = response.result.as_text().unwrap();

    let positions: Vec<_> = ["alpha", "bravo", "charlie", "echo"]
        .iter()
        .map(|word| text.find(word).unwrap_or_else(|| panic!("{word} missing from {text:?}")))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(!text.contains("delta"));
    assert!(!text.contains("foxtrot"));
    assert_eq!(response.message, "Extracted text from pages 5,1-3 in six.pdf.");
}

#[tokio::test]
async fn test_parallel_matches_sequential() {
    if skip_without_pdfium("test_parallel_matches_sequential") {
        return;
    }
    let document = Document::new("six.pdf", text_pdf(&SIX_PAGES));
    let request = ExtractionRequest::new(ExtractionCategory::Text);

    let mut sequential = ExtractionConfig::default();
    sequential.pdf.parallel = false;

    let mut parallel = ExtractionConfig::default();
    parallel.pdf.parallel_page_threshold = 2;
    parallel.pdf.max_workers = Some(4);

    let a = extract_bytes(&document, &request, &sequential).await.unwrap();
    let b = extract_bytes(&document, &request, &parallel).await.unwrap();
    assert_eq!(a.result, b.result);
}

#[tokio::test]
#[serial]
async fn test_scanned_page_uses_ocr() {
    if skip_without_pdfium("test_scanned_page_uses_ocr") {
        return;
    }
    docsift::ocr::install_engine(Arc::new(FixedOcr("recognized words ")));

    let pdf = build_pdf(&[PageSpec::Text("typed page"), PageSpec::Blank]);
    let document = Document::new("mixed.pdf", pdf);
    let request = ExtractionRequest::new(ExtractionCategory::Text);

    let response = extract_bytes(&document, &request, &ExtractionConfig::default())
        .await
        .unwrap();
    let text = response.result.as_text().unwrap();
    assert!(text.contains("typed page"));
    assert!(text.ends_with("recognized words "));

    docsift::ocr::reset_engine();
}

#[tokio::test]
async fn test_tables_on_text_only_pages_are_not_found() {
    if skip_without_pdfium("test_tables_on_text_only_pages_are_not_found") {
        return;
    }
    let document = Document::new("prose.pdf", text_pdf(&["just a sentence"]));
    let request = ExtractionRequest::new(ExtractionCategory::Tables);

    let response = extract_bytes(&document, &request, &ExtractionConfig::default())
        .await
        .unwrap();
    assert!(response.result.is_not_found());
    assert_eq!(response.message, "No tables found in pages all of prose.pdf.");
}
