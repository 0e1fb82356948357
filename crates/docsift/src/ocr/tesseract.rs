//! Tesseract OCR through the native `kreuzberg-tesseract` bindings.
//!
//! Language data is looked up once when the engine is built: every language
//! in `ocr.language` (`eng+deu` style) must have a `*.traineddata` file in the
//! resolved tessdata directory. Each recognition gets its own
//! [`TesseractAPI`] handle, so pages on different workers never share one.

use super::engine::{OcrEngine, flatten_lines};
use super::error::OcrError;
use crate::core::config::OcrConfig;
use image::DynamicImage;
use kreuzberg_tesseract::{TessPageSegMode, TesseractAPI};
use std::path::{Path, PathBuf};

const TESSDATA_FALLBACK_PATHS: [&str; 9] = [
    "/opt/homebrew/share/tessdata",
    "/opt/homebrew/opt/tesseract/share/tessdata",
    "/usr/local/opt/tesseract/share/tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    r#"C:\Program Files\Tesseract-OCR\tessdata"#,
    r#"C:\ProgramData\Tesseract-OCR\tessdata"#,
];

/// Highest page segmentation mode Tesseract accepts.
const MAX_PSM: u8 = 13;

fn tessdata_install_message(language: &str) -> String {
    format!(
        "No tessdata directory with '{}' language data was found. \
Install: macOS: 'brew install tesseract', Linux: 'apt install tesseract-ocr tesseract-ocr-eng'. \
If the data lives in a custom location, set TESSDATA_PREFIX or ocr.tessdata_path.",
        language
    )
}

/// The tessdata directory: configured path, then `TESSDATA_PREFIX`, then
/// the first well-known install location that exists.
pub fn resolve_tessdata(config: &OcrConfig) -> Option<PathBuf> {
    config
        .tessdata_path
        .clone()
        .or_else(|| std::env::var_os("TESSDATA_PREFIX").map(PathBuf::from))
        .or_else(|| {
            TESSDATA_FALLBACK_PATHS
                .iter()
                .map(Path::new)
                .find(|p| p.is_dir())
                .map(Path::to_path_buf)
        })
}

/// Every `+`-separated language must have its traineddata file.
fn check_languages(tessdata: &Path, language: &str) -> Result<(), OcrError> {
    let mut seen = false;
    for lang in language.split('+').map(str::trim).filter(|l| !l.is_empty()) {
        seen = true;
        let traineddata = tessdata.join(format!("{}.traineddata", lang));
        if !traineddata.is_file() {
            return Err(OcrError::InvalidLanguageCode(format!(
                "Language '{}' not found. Traineddata file does not exist: {}",
                lang,
                traineddata.display()
            )));
        }
    }
    if !seen {
        return Err(OcrError::InvalidLanguageCode(
            "Language cannot be empty. Please specify a valid language code (e.g., 'eng')".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct TesseractEngine {
    tessdata: PathBuf,
    language: String,
    psm: u8,
}

impl TesseractEngine {
    /// Validate the settings and load the language models once.
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let engine = Self::from_parts(config)?;
        engine.open()?;
        tracing::debug!(
            version = %TesseractAPI::version(),
            tessdata = %engine.tessdata.display(),
            "Tesseract loaded"
        );
        Ok(engine)
    }

    /// Everything [`new`](Self::new) checks short of loading Tesseract.
    fn from_parts(config: &OcrConfig) -> Result<Self, OcrError> {
        if config.psm > MAX_PSM {
            return Err(OcrError::InvalidConfiguration(format!(
                "Page segmentation mode must be between 0 and {}, got {}",
                MAX_PSM, config.psm
            )));
        }

        let tessdata = resolve_tessdata(config)
            .ok_or_else(|| OcrError::InitializationFailed(tessdata_install_message(&config.language)))?;
        check_languages(&tessdata, &config.language)?;

        Ok(Self {
            tessdata,
            language: config.language.trim().to_string(),
            psm: config.psm,
        })
    }

    pub fn tessdata(&self) -> &Path {
        &self.tessdata
    }

    /// A fresh API handle with language data and page segmentation set.
    fn open(&self) -> Result<TesseractAPI, OcrError> {
        let api = TesseractAPI::new();
        api.init(&self.tessdata.to_string_lossy(), &self.language).map_err(|e| {
            OcrError::InitializationFailed(format!("Failed to initialize language '{}': {}", self.language, e))
        })?;
        api.set_page_seg_mode(TessPageSegMode::from_int(i32::from(self.psm)))
            .map_err(|e| OcrError::InvalidConfiguration(format!("Failed to set PSM mode: {}", e)))?;
        Ok(api)
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let bytes_per_pixel = 3u32;
        let dimension = |value: u32| {
            i32::try_from(value)
                .map_err(|_| OcrError::ImageProcessingFailed(format!("Image dimension {} is too large", value)))
        };
        let bytes_per_line = width
            .checked_mul(bytes_per_pixel)
            .ok_or_else(|| OcrError::ImageProcessingFailed(format!("Image width {} is too large", width)))?;

        let api = self.open()?;
        api.set_image(
            rgb.as_raw(),
            dimension(width)?,
            dimension(height)?,
            bytes_per_pixel as i32,
            dimension(bytes_per_line)?,
        )
        .map_err(|e| OcrError::ProcessingFailed(format!("Failed to set image: {}", e)))?;

        api.recognize()
            .map_err(|e| OcrError::ProcessingFailed(format!("Failed to recognize text: {}", e)))?;
        let text = api
            .get_utf8_text()
            .map_err(|e| OcrError::ProcessingFailed(format!("Failed to extract text: {}", e)))?;

        Ok(flatten_lines(&text))
    }
}
