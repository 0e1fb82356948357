//! Main extraction entry points.
//!
//! Every call classifies the document by extension, hands it to the matching
//! extractor and wraps the outcome in an [`ExtractionResponse`] whose message
//! names the category, the page selection and the file.
//!
//! # Functions
//!
//! - [`extract_bytes`] - Extract from an in-memory [`Document`]
//! - [`extract_bytes_with_store`] - Same, with an explicit image destination
//! - [`extract_file`] - Extract from a file path
//! - [`extract_bytes_sync`] / [`extract_file_sync`] - Blocking wrappers

use crate::Result;
use crate::core::config::ExtractionConfig;
use crate::core::formats::FileFormat;
use crate::core::io;
use crate::extractors::{ExtractionContext, extractor_for};
use crate::storage::ObjectStore;
use crate::types::{Document, ExtractionRequest, ExtractionResponse, ExtractionResult};
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::Arc;

/// Global Tokio runtime for the synchronous wrappers.
///
/// Creation only fails when the process is out of threads or memory, at
/// which point nothing else would work either.
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

/// Extract content from an in-memory document.
///
/// Images are uploaded to the store described by `config.storage`.
///
/// # Errors
///
/// Returns `DocsiftError::UnsupportedFormat` for unknown extensions,
/// `DocsiftError::InvalidPageRange` for a bad page expression, and
/// `DocsiftError::ExtractionFailed` when the underlying parser fails.
///
/// # Example
///
/// ```rust,no_run
/// use docsift::{Document, ExtractionCategory, ExtractionConfig, ExtractionRequest, extract_bytes};
///
/// # async fn example() -> docsift::Result<()> {
/// let document = Document::new("report.pdf", std::fs::read("report.pdf")?);
/// let request = ExtractionRequest::new(ExtractionCategory::Tables).with_page_range("1-3");
/// let response = extract_bytes(&document, &request, &ExtractionConfig::default()).await?;
/// println!("{}", response.message);
/// # Ok(())
/// # }
/// ```
pub async fn extract_bytes(
    document: &Document,
    request: &ExtractionRequest,
    config: &ExtractionConfig,
) -> Result<ExtractionResponse> {
    run_extraction(document, request, ExtractionContext::new(request, config)).await
}

/// Extract content, sending any PDF images to `store`.
pub async fn extract_bytes_with_store(
    document: &Document,
    request: &ExtractionRequest,
    config: &ExtractionConfig,
    store: Arc<dyn ObjectStore>,
) -> Result<ExtractionResponse> {
    run_extraction(document, request, ExtractionContext::new(request, config).with_store(store)).await
}

/// Extract content from a file on disk.
pub async fn extract_file(
    path: impl AsRef<Path>,
    request: &ExtractionRequest,
    config: &ExtractionConfig,
) -> Result<ExtractionResponse> {
    let path = path.as_ref();
    // Classify before reading so unsupported files are rejected without I/O.
    if let Some(name) = path.file_name() {
        FileFormat::from_filename(&name.to_string_lossy())?;
    }
    let document = io::read_document(path).await?;
    extract_bytes(&document, request, config).await
}

/// Synchronous wrapper for [`extract_bytes`].
pub fn extract_bytes_sync(
    document: &Document,
    request: &ExtractionRequest,
    config: &ExtractionConfig,
) -> Result<ExtractionResponse> {
    GLOBAL_RUNTIME.block_on(extract_bytes(document, request, config))
}

/// Synchronous wrapper for [`extract_file`].
pub fn extract_file_sync(
    path: impl AsRef<Path>,
    request: &ExtractionRequest,
    config: &ExtractionConfig,
) -> Result<ExtractionResponse> {
    GLOBAL_RUNTIME.block_on(extract_file(path, request, config))
}

async fn run_extraction(
    document: &Document,
    request: &ExtractionRequest,
    context: ExtractionContext<'_>,
) -> Result<ExtractionResponse> {
    let format = FileFormat::from_filename(document.filename())?;
    let extractor = extractor_for(format);

    tracing::debug!(
        file = document.filename(),
        format = %format,
        extractor = extractor.name(),
        size_bytes = document.len(),
        "Dispatching document"
    );

    let result = extractor.extract(document, format, &context).await?;
    Ok(respond(result, document, request))
}

/// Attach the summary message, turning empty table and image sets into
/// [`ExtractionResult::NotFound`].
fn respond(result: ExtractionResult, document: &Document, request: &ExtractionRequest) -> ExtractionResponse {
    let category = request.category;
    let pages = request.page_label();

    if let ExtractionResult::NotFound { message, .. } = &result {
        tracing::info!("{}", message);
        return ExtractionResponse {
            message: message.clone(),
            result,
        };
    }

    let nothing_found = match &result {
        ExtractionResult::TableSet(tables) => tables.is_empty(),
        ExtractionResult::ImageSet(images) => images.is_empty(),
        _ => false,
    };

    if nothing_found {
        let message = format!("No {} found in pages {} of {}.", category, pages, document.filename());
        tracing::info!("{}", message);
        return ExtractionResponse {
            result: ExtractionResult::NotFound {
                category,
                message: message.clone(),
            },
            message,
        };
    }

    ExtractionResponse {
        message: format!("Extracted {} from pages {} in {}.", category, pages, document.filename()),
        result,
    }
}
