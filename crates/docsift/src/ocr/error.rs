use std::fmt;

#[derive(Debug, Clone)]
pub enum OcrError {
    EngineNotInitialized,
    InitializationFailed(String),
    InvalidConfiguration(String),
    InvalidLanguageCode(String),
    ImageProcessingFailed(String),
    ProcessingFailed(String),
}

impl fmt::Display for OcrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EngineNotInitialized => write!(f, "OCR engine has not been initialized"),
            Self::InitializationFailed(msg) => write!(f, "OCR engine initialization failed: {}", msg),
            Self::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::InvalidLanguageCode(msg) => write!(f, "Invalid language code: {}", msg),
            Self::ImageProcessingFailed(msg) => write!(f, "Image processing failed: {}", msg),
            Self::ProcessingFailed(msg) => write!(f, "OCR processing failed: {}", msg),
        }
    }
}

impl std::error::Error for OcrError {}
