use std::fmt;

#[derive(Debug, Clone)]
pub enum PdfError {
    InvalidPdf(String),
    PasswordRequired,
    PageNotFound(usize),
    TextExtractionFailed(String),
    RenderingFailed(String),
    TableDetectionFailed(String),
    ImageExtractionFailed(String),
    IOError(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::InvalidPdf(msg) => write!(f, "Invalid PDF: {}", msg),
            PdfError::PasswordRequired => write!(f, "PDF is password-protected"),
            PdfError::PageNotFound(page) => write!(f, "Page {} not found", page),
            PdfError::TextExtractionFailed(msg) => write!(f, "Text extraction failed: {}", msg),
            PdfError::RenderingFailed(msg) => write!(f, "Page rendering failed: {}", msg),
            PdfError::TableDetectionFailed(msg) => write!(f, "Table detection failed: {}", msg),
            PdfError::ImageExtractionFailed(msg) => write!(f, "Image extraction failed: {}", msg),
            PdfError::IOError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for PdfError {}

// No From<std::io::Error>: IO errors bubble up as DocsiftError::Io.

impl From<lopdf::Error> for PdfError {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(io_err) => PdfError::IOError(io_err.to_string()),
            _ => PdfError::InvalidPdf(err.to_string()),
        }
    }
}

/// Map a pdfium load failure onto the matching variant.
pub(crate) fn classify_load_error(message: String) -> PdfError {
    if message.to_lowercase().contains("password") {
        PdfError::PasswordRequired
    } else {
        PdfError::InvalidPdf(message)
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;
