//! One extractor per format class.
//!
//! Each extractor turns a [`Document`] into an [`ExtractionResult`]. PDF is
//! the only format with several strategies; every other extractor returns
//! text regardless of the requested category.
//!
//! Dispatch is a plain match on [`FileFormat`]: [`extractor_for`] never
//! fails, and the failure for unknown extensions happens earlier, in
//! [`FileFormat::from_filename`].

pub mod image;
pub mod pdf;
pub mod spreadsheet;
pub mod text;
pub mod word;

pub use image::ImageExtractor;
pub use pdf::PdfExtractor;
pub use spreadsheet::SpreadsheetExtractor;
pub use text::PlainTextExtractor;
pub use word::WordExtractor;

use crate::Result;
use crate::core::config::ExtractionConfig;
use crate::core::formats::FileFormat;
use crate::storage::ObjectStore;
use crate::types::{Document, ExtractionRequest, ExtractionResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Everything an extractor may need besides the document itself.
#[derive(Clone)]
pub struct ExtractionContext<'a> {
    pub request: &'a ExtractionRequest,
    pub config: &'a ExtractionConfig,
    /// Destination for PDF images. Built from `config.storage` when absent.
    pub store: Option<Arc<dyn ObjectStore>>,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(request: &'a ExtractionRequest, config: &'a ExtractionConfig) -> Self {
        Self {
            request,
            config,
            store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }
}

/// Converts one class of document.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn supported_formats(&self) -> &[FileFormat];

    /// Extract `document`, whose format is one of [`supported_formats`](Self::supported_formats).
    async fn extract(&self, document: &Document, format: FileFormat, context: &ExtractionContext<'_>)
    -> Result<ExtractionResult>;
}

static PDF: PdfExtractor = PdfExtractor;
static WORD: WordExtractor = WordExtractor;
static SPREADSHEET: SpreadsheetExtractor = SpreadsheetExtractor;
static PLAIN_TEXT: PlainTextExtractor = PlainTextExtractor;
static IMAGE: ImageExtractor = ImageExtractor;

/// The extractor responsible for `format`.
pub fn extractor_for(format: FileFormat) -> &'static dyn DocumentExtractor {
    match format {
        FileFormat::Pdf => &PDF,
        FileFormat::Doc | FileFormat::Docx => &WORD,
        FileFormat::Csv | FileFormat::Tsv | FileFormat::Xlsx => &SPREADSHEET,
        FileFormat::Txt => &PLAIN_TEXT,
        FileFormat::Jpeg | FileFormat::Png => &IMAGE,
    }
}

/// Await a blocking task, turning a panic into an extraction failure.
pub(crate) async fn run_blocking<T, F>(what: &'static str, task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| crate::DocsiftError::extraction_failed(format!("{} task failed: {}", what, e)))?
}
