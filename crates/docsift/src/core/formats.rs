//! File format classification.
//!
//! Documents are routed by extension alone, matched case-insensitively.

use crate::{DocsiftError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";
pub const DOCX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const LEGACY_WORD_MIME_TYPE: &str = "application/msword";
pub const EXCEL_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CSV_MIME_TYPE: &str = "text/csv";
pub const TSV_MIME_TYPE: &str = "text/tab-separated-values";
pub const JPEG_MIME_TYPE: &str = "image/jpeg";
pub const PNG_MIME_TYPE: &str = "image/png";

/// A supported input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Pdf,
    Doc,
    Docx,
    Csv,
    Tsv,
    Xlsx,
    Txt,
    Jpeg,
    Png,
}

static EXT_TO_FORMAT: Lazy<HashMap<&'static str, FileFormat>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("pdf", FileFormat::Pdf);

    m.insert("doc", FileFormat::Doc);
    m.insert("docx", FileFormat::Docx);

    m.insert("csv", FileFormat::Csv);
    m.insert("tsv", FileFormat::Tsv);
    m.insert("xlsx", FileFormat::Xlsx);

    m.insert("txt", FileFormat::Txt);

    m.insert("jpg", FileFormat::Jpeg);
    m.insert("jpeg", FileFormat::Jpeg);
    m.insert("png", FileFormat::Png);

    m
});

impl FileFormat {
    /// Every supported format, in display order.
    pub const ALL: [FileFormat; 9] = [
        FileFormat::Pdf,
        FileFormat::Doc,
        FileFormat::Docx,
        FileFormat::Csv,
        FileFormat::Tsv,
        FileFormat::Xlsx,
        FileFormat::Txt,
        FileFormat::Jpeg,
        FileFormat::Png,
    ];

    /// Classify a file by the extension of `filename`.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .ok_or_else(|| DocsiftError::UnsupportedFormat(format!("'{}' has no file extension", filename)))?;

        Self::from_extension(&extension)
            .ok_or_else(|| DocsiftError::UnsupportedFormat(format!("Unknown extension: .{}", extension)))
    }

    /// Look up an extension, with or without the leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_lowercase();
        EXT_TO_FORMAT.get(extension.as_str()).copied()
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileFormat::Pdf => &["pdf"],
            FileFormat::Doc => &["doc"],
            FileFormat::Docx => &["docx"],
            FileFormat::Csv => &["csv"],
            FileFormat::Tsv => &["tsv"],
            FileFormat::Xlsx => &["xlsx"],
            FileFormat::Txt => &["txt"],
            FileFormat::Jpeg => &["jpg", "jpeg"],
            FileFormat::Png => &["png"],
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileFormat::Pdf => PDF_MIME_TYPE,
            FileFormat::Doc => LEGACY_WORD_MIME_TYPE,
            FileFormat::Docx => DOCX_MIME_TYPE,
            FileFormat::Csv => CSV_MIME_TYPE,
            FileFormat::Tsv => TSV_MIME_TYPE,
            FileFormat::Xlsx => EXCEL_MIME_TYPE,
            FileFormat::Txt => PLAIN_TEXT_MIME_TYPE,
            FileFormat::Jpeg => JPEG_MIME_TYPE,
            FileFormat::Png => PNG_MIME_TYPE,
        }
    }

    /// Only PDFs honor page ranges and extraction categories.
    pub fn is_paged(&self) -> bool {
        matches!(self, FileFormat::Pdf)
    }

    pub fn is_image(&self) -> bool {
        matches!(self, FileFormat::Jpeg | FileFormat::Png)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extensions()[0])
    }
}
