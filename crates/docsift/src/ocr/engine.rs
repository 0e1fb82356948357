//! OCR engine abstraction and the process-wide engine.
//!
//! Engine construction can be expensive (language model load), so one
//! engine is built per process and shared by every extraction call. If
//! construction fails the failure is cached: later calls get the same error
//! instead of retrying.

use super::error::OcrError;
#[cfg(feature = "ocr")]
use super::tesseract::TesseractEngine;
use crate::core::config::OcrConfig;
use image::DynamicImage;
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

/// Converts a rendered page or photo into plain text.
///
/// Implementations hold no per-call state: `recognize` may run concurrently
/// from several page workers.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize text in `image`. An image with no text yields an empty string.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

enum EngineState {
    Uninitialized,
    Ready(Arc<dyn OcrEngine>),
    Failed(String),
}

static ENGINE_STATE: Lazy<RwLock<EngineState>> = Lazy::new(|| RwLock::new(EngineState::Uninitialized));

fn build_engine(config: &OcrConfig) -> Result<Arc<dyn OcrEngine>, OcrError> {
    match config.backend.to_lowercase().as_str() {
        #[cfg(feature = "ocr")]
        "tesseract" => Ok(Arc::new(TesseractEngine::new(config)?)),
        #[cfg(not(feature = "ocr"))]
        "tesseract" => Err(OcrError::InitializationFailed(
            "docsift was built without the `ocr` feature; rebuild with `--features ocr`".to_string(),
        )),
        other => Err(OcrError::InvalidConfiguration(format!(
            "Unknown OCR backend '{}'. Supported backends: tesseract",
            other
        ))),
    }
}

/// Build the process-wide engine from `config`, or return the existing one.
pub fn initialize(config: &OcrConfig) -> Result<Arc<dyn OcrEngine>, OcrError> {
    {
        let state = ENGINE_STATE
            .read()
            .map_err(|e| OcrError::InitializationFailed(format!("OCR engine lock poisoned: {}", e)))?;
        match &*state {
            EngineState::Ready(engine) => return Ok(Arc::clone(engine)),
            EngineState::Failed(err) => return Err(OcrError::InitializationFailed(err.clone())),
            EngineState::Uninitialized => {}
        }
    }

    let mut state = ENGINE_STATE
        .write()
        .map_err(|e| OcrError::InitializationFailed(format!("OCR engine lock poisoned: {}", e)))?;

    // Another thread may have finished while we waited for the write lock.
    match &*state {
        EngineState::Ready(engine) => return Ok(Arc::clone(engine)),
        EngineState::Failed(err) => return Err(OcrError::InitializationFailed(err.clone())),
        EngineState::Uninitialized => {}
    }

    match build_engine(config) {
        Ok(engine) => {
            tracing::info!(engine = engine.name(), language = %config.language, "OCR engine initialized");
            *state = EngineState::Ready(Arc::clone(&engine));
            Ok(engine)
        }
        Err(err) => {
            tracing::error!("OCR engine initialization failed: {}", err);
            *state = EngineState::Failed(err.to_string());
            Err(err)
        }
    }
}

/// Replace the process-wide engine with a caller-supplied one.
pub fn install_engine(engine: Arc<dyn OcrEngine>) {
    let mut state = ENGINE_STATE.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *state = EngineState::Ready(engine);
}

/// The engine built by [`initialize`] or set by [`install_engine`].
pub fn engine() -> Result<Arc<dyn OcrEngine>, OcrError> {
    let state = ENGINE_STATE
        .read()
        .map_err(|e| OcrError::InitializationFailed(format!("OCR engine lock poisoned: {}", e)))?;
    match &*state {
        EngineState::Ready(engine) => Ok(Arc::clone(engine)),
        EngineState::Failed(err) => Err(OcrError::InitializationFailed(err.clone())),
        EngineState::Uninitialized => Err(OcrError::EngineNotInitialized),
    }
}

/// Forget the current engine so the next [`initialize`] builds a new one.
pub fn reset_engine() {
    let mut state = ENGINE_STATE.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *state = EngineState::Uninitialized;
}

/// Collapse recognized text into space-separated lines.
///
/// Words in a line are joined by single spaces and every non-empty line is
/// followed by one space, so a page reads as a single run of text.
pub fn flatten_lines(text: &str) -> String {
    let mut flattened = String::with_capacity(text.len());
    for line in text.lines() {
        let mut words = line.split_whitespace().peekable();
        if words.peek().is_none() {
            continue;
        }
        for (i, word) in words.enumerate() {
            if i > 0 {
                flattened.push(' ');
            }
            flattened.push_str(word);
        }
        flattened.push(' ');
    }
    flattened
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct FixedEngine(&'static str);

    impl OcrEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_flatten_lines() {
        assert_eq!(flatten_lines("Invoice  No. 42\n\n  Total:\t$10\n"), "Invoice No. 42 Total: $10 ");
        assert_eq!(flatten_lines("\n \n"), "");
    }

    #[test]
    #[serial]
    fn test_engine_uninitialized() {
        reset_engine();
        assert!(matches!(engine(), Err(OcrError::EngineNotInitialized)));
    }

    #[test]
    #[serial]
    fn test_installed_engine_is_returned() {
        install_engine(Arc::new(FixedEngine("scanned words")));
        let engine = engine().unwrap();
        assert_eq!(engine.name(), "fixed");
        let image = DynamicImage::new_rgb8(4, 4);
        assert_eq!(engine.recognize(&image).unwrap(), "scanned words");

        let same = initialize(&OcrConfig::default()).unwrap();
        assert_eq!(same.name(), "fixed");
        reset_engine();
    }

    #[test]
    #[serial]
    fn test_initialization_failure_is_cached() {
        reset_engine();
        let config = OcrConfig {
            backend: "paddle".to_string(),
            ..Default::default()
        };
        assert!(matches!(initialize(&config), Err(OcrError::InvalidConfiguration(_))));

        // A valid config does not trigger a retry.
        let err = initialize(&OcrConfig::default()).err().unwrap();
        assert!(matches!(err, OcrError::InitializationFailed(ref msg) if msg.contains("paddle")));
        assert!(engine().is_err());
        reset_engine();
    }
}
