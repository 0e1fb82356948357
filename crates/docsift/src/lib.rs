//! docsift - document extraction pipeline
//!
//! Turns uploaded documents (PDF, DOC/DOCX, CSV/TSV/XLSX, TXT, JPEG/PNG) into
//! text, tables with their surrounding context, or uploaded image URLs.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use docsift::{ExtractionCategory, ExtractionConfig, ExtractionRequest, extract_file_sync};
//!
//! # fn main() -> docsift::Result<()> {
//! let request = ExtractionRequest::new(ExtractionCategory::Text).with_page_range("1-3,5");
//! let response = extract_file_sync("document.pdf", &request, &ExtractionConfig::default())?;
//! println!("{}", response.message);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): entry points, configuration, format dispatch, page ranges, parallel pages
//! - **PDF** (`pdf`): native text with OCR fallback, table detection, embedded images
//! - **OCR** (`ocr`): process-wide engine, native Tesseract behind the `ocr` feature
//! - **Storage** (`storage`): object stores for extracted images
//! - **Extractors** (`extractors`): one extractor per format class

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod extraction;
pub mod extractors;
pub mod ocr;
pub mod pdf;
pub mod storage;
pub mod types;

pub use error::{DocsiftError, Result};
pub use types::*;

pub use core::config::{ExtractionConfig, OcrConfig, PdfConfig, ResetScope, StorageConfig, WordConfig};
pub use core::extractor::{
    extract_bytes, extract_bytes_sync, extract_bytes_with_store, extract_file, extract_file_sync,
};
pub use core::formats::FileFormat;
pub use core::page_range::PageRange;
pub use storage::{MemoryObjectStore, ObjectStore};
