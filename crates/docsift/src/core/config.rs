//! Configuration loading and management.
//!
//! Configuration comes from TOML or JSON files, from `docsift.toml`
//! discovered in the directory hierarchy, or is built programmatically.
//! Environment variables overlay the loaded values via
//! [`ExtractionConfig::apply_env`].

use crate::{DocsiftError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the file [`ExtractionConfig::discover`] looks for.
pub const CONFIG_FILE_NAME: &str = "docsift.toml";

/// Main extraction configuration.
///
/// # Example
///
/// ```rust
/// use docsift::core::config::ExtractionConfig;
///
/// let config = ExtractionConfig::default();
/// assert_eq!(config.pdf.parallel_page_threshold, 10);
///
/// // let config = ExtractionConfig::from_toml_file("docsift.toml")?;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub pdf: PdfConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub word: WordConfig,
}

/// PDF text, table and image extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Multiplier over 72 DPI used when rendering pages for OCR.
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,

    /// Ranges with more pages than this are split across workers.
    #[serde(default = "default_parallel_page_threshold")]
    pub parallel_page_threshold: usize,

    /// Worker count; defaults to available parallelism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,

    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Vertical distance, in PDF points, searched above and below a table
    /// for context text.
    #[serde(default = "default_table_context_buffer")]
    pub table_context_buffer: f32,
}

/// OCR engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default = "default_eng")]
    pub language: String,

    /// Tesseract page segmentation mode.
    #[serde(default = "default_psm")]
    pub psm: u8,

    /// Directory holding `*.traineddata`. Falls back to `TESSDATA_PREFIX`
    /// and the usual install locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tessdata_path: Option<PathBuf>,
}

/// How much of the bucket is cleared before an image upload run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetScope {
    /// Delete only objects under this run's key prefix.
    #[default]
    Namespace,
    /// Delete every object in the bucket.
    Bucket,
    /// Leave existing objects in place.
    Keep,
}

/// Object store settings for image uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    /// Custom S3-compatible endpoint (MinIO, LocalStack).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Base for returned URLs; `https://{bucket}.s3.amazonaws.com` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url_base: Option<String>,

    /// Namespace for uploaded keys. A fresh UUID is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,

    #[serde(default)]
    pub reset_scope: ResetScope,

    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
}

/// Legacy `.doc` conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antiword_path: Option<PathBuf>,

    #[serde(default = "default_word_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_render_scale() -> f32 {
    1.0
}
fn default_parallel_page_threshold() -> usize {
    10
}
fn default_table_context_buffer() -> f32 {
    25.0
}
fn default_backend() -> String {
    "tesseract".to_string()
}
fn default_eng() -> String {
    "eng".to_string()
}
fn default_psm() -> u8 {
    3
}
fn default_upload_concurrency() -> usize {
    8
}
fn default_word_timeout() -> u64 {
    60
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_scale: default_render_scale(),
            parallel_page_threshold: default_parallel_page_threshold(),
            max_workers: None,
            parallel: true,
            table_context_buffer: default_table_context_buffer(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            language: default_eng(),
            psm: default_psm(),
            tessdata_path: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            endpoint: None,
            region: None,
            public_url_base: None,
            key_prefix: None,
            reset_scope: ResetScope::default(),
            upload_concurrency: default_upload_concurrency(),
        }
    }
}

impl Default for WordConfig {
    fn default() -> Self {
        Self {
            antiword_path: None,
            timeout_secs: default_word_timeout(),
        }
    }
}

impl PdfConfig {
    /// Worker count for the parallel coordinator.
    pub fn worker_count(&self) -> usize {
        self.max_workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

impl ExtractionConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `DocsiftError::Validation` if the file is missing or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DocsiftError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| DocsiftError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DocsiftError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| DocsiftError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load from a file, choosing the parser by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(DocsiftError::validation(format!(
                "Unsupported config file format: {}. Expected .toml or .json",
                path.display()
            ))),
        }
    }

    /// Walk up from the current directory looking for `docsift.toml`.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(DocsiftError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(bucket) = non_empty("DOCSIFT_BUCKET").or_else(|| non_empty("BUCKET_NAME")) {
            self.storage.bucket = Some(bucket);
        }
        if let Some(endpoint) = non_empty("DOCSIFT_S3_ENDPOINT") {
            self.storage.endpoint = Some(endpoint);
        }
        if let Some(region) = non_empty("AWS_REGION") {
            self.storage.region = Some(region);
        }
        if let Some(path) = non_empty("TESSDATA_PREFIX") {
            self.ocr.tessdata_path = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty("ANTIWORD_PATH") {
            self.word.antiword_path = Some(PathBuf::from(path));
        }

        self
    }

    /// Reject settings that cannot produce a working pipeline.
    pub fn validate(&self) -> Result<()> {
        if !(self.pdf.render_scale.is_finite() && self.pdf.render_scale > 0.0) {
            return Err(DocsiftError::validation(format!(
                "pdf.render_scale must be positive, got {}",
                self.pdf.render_scale
            )));
        }
        if self.pdf.max_workers == Some(0) {
            return Err(DocsiftError::validation("pdf.max_workers must be at least 1"));
        }
        if !(self.pdf.table_context_buffer.is_finite() && self.pdf.table_context_buffer >= 0.0) {
            return Err(DocsiftError::validation(
                "pdf.table_context_buffer must be a non-negative number",
            ));
        }
        if self.ocr.language.trim().is_empty() {
            return Err(DocsiftError::validation("ocr.language must not be empty"));
        }
        if self.storage.upload_concurrency == 0 {
            return Err(DocsiftError::validation("storage.upload_concurrency must be at least 1"));
        }
        if self.word.timeout_secs == 0 {
            return Err(DocsiftError::validation("word.timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ExtractionConfig::default();
        assert_eq!(config.pdf.render_scale, 1.0);
        assert_eq!(config.pdf.table_context_buffer, 25.0);
        assert!(config.pdf.parallel);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.psm, 3);
        assert_eq!(config.storage.reset_scope, ResetScope::Namespace);
        assert_eq!(config.storage.upload_concurrency, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("docsift.toml");

        fs::write(
            &config_path,
            r#"
[pdf]
parallel_page_threshold = 4
max_workers = 2

[storage]
bucket = "extracted-images"
reset_scope = "bucket"
        "#,
        )
        .unwrap();

        let config = ExtractionConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.pdf.parallel_page_threshold, 4);
        assert_eq!(config.pdf.worker_count(), 2);
        assert_eq!(config.pdf.render_scale, 1.0);
        assert_eq!(config.storage.bucket.as_deref(), Some("extracted-images"));
        assert_eq!(config.storage.reset_scope, ResetScope::Bucket);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, r#"{"ocr": {"language": "deu", "psm": 6}}"#).unwrap();

        let config = ExtractionConfig::from_file(&config_path).unwrap();
        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.ocr.psm, 6);
        assert_eq!(config.ocr.backend, "tesseract");
    }

    #[test]
    fn test_invalid_toml_is_validation_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("docsift.toml");
        fs::write(&config_path, "[pdf\nrender_scale = ").unwrap();

        let err = ExtractionConfig::from_toml_file(&config_path).unwrap_err();
        assert!(matches!(err, DocsiftError::Validation { .. }));
    }

    #[test]
    fn test_unknown_config_extension() {
        assert!(ExtractionConfig::from_file("settings.yaml").is_err());
    }

    #[test]
    #[serial]
    fn test_discover_docsift_toml() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("docsift.toml"), "[pdf]\nparallel = false\n").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&nested).unwrap();

        let result = std::panic::catch_unwind(|| {
            let config = ExtractionConfig::discover().unwrap();
            assert!(config.is_some());
            assert!(!config.unwrap().pdf.parallel);
        });

        std::env::set_current_dir(&original_dir).unwrap();

        if let Err(e) = result {
            std::panic::resume_unwind(e);
        }
    }

    #[test]
    fn test_apply_env_overlay() {
        let vars: HashMap<&str, &str> = [
            ("BUCKET_NAME", "legacy-bucket"),
            ("AWS_REGION", "eu-west-1"),
            ("TESSDATA_PREFIX", "/opt/tesseract/share/tessdata"),
            ("DOCSIFT_S3_ENDPOINT", ""),
        ]
        .into_iter()
        .collect();

        let config = ExtractionConfig::default().apply_env_from(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.storage.bucket.as_deref(), Some("legacy-bucket"));
        assert_eq!(config.storage.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.storage.endpoint, None);
        assert_eq!(
            config.ocr.tessdata_path.as_deref(),
            Some(Path::new("/opt/tesseract/share/tessdata"))
        );
    }

    #[test]
    fn test_docsift_bucket_wins_over_bucket_name() {
        let config = ExtractionConfig::default().apply_env_from(|key| match key {
            "DOCSIFT_BUCKET" => Some("primary".to_string()),
            "BUCKET_NAME" => Some("legacy".to_string()),
            _ => None,
        });
        assert_eq!(config.storage.bucket.as_deref(), Some("primary"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ExtractionConfig::default();
        config.pdf.render_scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = ExtractionConfig::default();
        config.pdf.max_workers = Some(0);
        assert!(config.validate().is_err());

        let mut config = ExtractionConfig::default();
        config.ocr.language = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = ExtractionConfig::default();
        config.storage.upload_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
