//! OCR subsystem.
//!
//! Pages without an embedded text layer and standalone JPEG/PNG uploads go
//! through a single process-wide [`OcrEngine`]. With the `ocr` feature the
//! bundled engine links Tesseract through `kreuzberg-tesseract`; embedders can
//! install their own with [`install_engine`].
//!
//! # Example
//!
//! ```rust,no_run
//! use docsift::core::config::OcrConfig;
//! use docsift::ocr;
//!
//! # fn example() -> Result<(), docsift::ocr::OcrError> {
//! let engine = ocr::initialize(&OcrConfig::default())?;
//! let image = image::open("scan.png").expect("readable image");
//! println!("{}", engine.recognize(&image)?);
//! # Ok(())
//! # }
//! ```
pub mod engine;
pub mod error;
#[cfg(feature = "ocr")]
pub mod tesseract;

pub use engine::{OcrEngine, engine, flatten_lines, initialize, install_engine, reset_engine};
pub use error::OcrError;
#[cfg(feature = "ocr")]
pub use tesseract::TesseractEngine;
