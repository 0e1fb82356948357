//! Error types for docsift.
//!
//! All fallible operations return [`DocsiftError`]. The variants mirror the
//! failure classes of the extraction pipeline:
//!
//! - `Io` - file system errors, always bubble up unchanged
//! - `UnsupportedFormat` - the file extension maps to no extractor
//! - `InvalidPageRange` - malformed or out-of-bounds page expression
//! - `ExtractionFailed` - an underlying library or subprocess failed
//! - `Ocr` - OCR engine failures (initialization or recognition)
//! - `Upload` - object store failures
//! - `WorkerCrash` - a parallel page segment died
//!
//! Per-page OCR failures and per-image upload failures are *not* surfaced
//! as errors. They are logged at `warn` and the call still succeeds.
//!
//! # Example
//!
//! ```rust
//! use docsift::{DocsiftError, Result};
//!
//! fn read_document(path: &str) -> Result<Vec<u8>> {
//!     let bytes = std::fs::read(path)?;
//!     if bytes.is_empty() {
//!         return Err(DocsiftError::validation(format!("File is empty: {}", path)));
//!     }
//!     Ok(bytes)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `DocsiftError`.
pub type Result<T> = std::result::Result<T, DocsiftError>;

/// Main error type for all docsift operations.
#[derive(Debug, Error)]
pub enum DocsiftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid page range '{expression}': {message}")]
    InvalidPageRange { expression: String, message: String },

    #[error("Extraction failed: {message}")]
    ExtractionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Upload error: {message}")]
    Upload {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Worker for segment {segment} crashed: {message}")]
    WorkerCrash { segment: usize, message: String },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<serde_json::Error> for DocsiftError {
    fn from(err: serde_json::Error) -> Self {
        DocsiftError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<calamine::Error> for DocsiftError {
    fn from(err: calamine::Error) -> Self {
        DocsiftError::ExtractionFailed {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<crate::pdf::error::PdfError> for DocsiftError {
    fn from(err: crate::pdf::error::PdfError) -> Self {
        DocsiftError::ExtractionFailed {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<crate::ocr::error::OcrError> for DocsiftError {
    fn from(err: crate::ocr::error::OcrError) -> Self {
        DocsiftError::Ocr {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl DocsiftError {
    error_constructor!(extraction_failed, ExtractionFailed);
    error_constructor!(ocr, Ocr);
    error_constructor!(upload, Upload);
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);

    /// Create an `InvalidPageRange` error for the offending expression.
    pub fn invalid_page_range<E: Into<String>, M: Into<String>>(expression: E, message: M) -> Self {
        Self::InvalidPageRange {
            expression: expression.into(),
            message: message.into(),
        }
    }
}
