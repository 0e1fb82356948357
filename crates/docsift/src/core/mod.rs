//! Core extraction orchestration.
//!
//! Entry points, configuration, format classification, page ranges and the
//! parallel page coordinator.
//!
//! # Example
//!
//! ```rust,no_run
//! use docsift::core::config::ExtractionConfig;
//! use docsift::core::extractor::extract_file;
//! use docsift::{ExtractionCategory, ExtractionRequest};
//!
//! # async fn example() -> docsift::Result<()> {
//! let request = ExtractionRequest::new(ExtractionCategory::Text);
//! let response = extract_file("document.pdf", &request, &ExtractionConfig::default()).await?;
//! println!("{}", response.message);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod extractor;
pub mod formats;
pub mod io;
pub mod page_range;
pub mod parallel;
pub mod process;

pub use config::{ExtractionConfig, OcrConfig, PdfConfig, ResetScope, StorageConfig, WordConfig};
pub use extractor::{extract_bytes, extract_bytes_sync, extract_bytes_with_store, extract_file, extract_file_sync};
pub use formats::FileFormat;
pub use page_range::PageRange;
