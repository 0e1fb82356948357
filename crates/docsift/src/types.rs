//! Core data types shared by every extractor.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{DocsiftError, Result};

/// An uploaded document: raw bytes plus the declared filename.
///
/// Immutable once loaded. The extraction call that receives it owns it and
/// drops it when the call returns; blocking workers share the bytes through
/// [`Document::shared_content`].
#[derive(Debug, Clone)]
pub struct Document {
    filename: String,
    content: Arc<[u8]>,
}

impl Document {
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn shared_content(&self) -> Arc<[u8]> {
        Arc::clone(&self.content)
    }

    /// Lowercased extension without the leading dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Selects the PDF extraction strategy. Ignored for non-PDF formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionCategory {
    #[default]
    Text,
    Tables,
    Images,
}

impl ExtractionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionCategory::Text => "text",
            ExtractionCategory::Tables => "tables",
            ExtractionCategory::Images => "images",
        }
    }
}

impl fmt::Display for ExtractionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionCategory {
    type Err = DocsiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(ExtractionCategory::Text),
            "tables" | "table" => Ok(ExtractionCategory::Tables),
            "images" | "image" => Ok(ExtractionCategory::Images),
            other => Err(DocsiftError::validation(format!(
                "Unknown extraction category '{}'. Expected one of: text, tables, images",
                other
            ))),
        }
    }
}

/// Per-call extraction options supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// 1-based page expression such as `"1-3,5"`. `None` selects every page.
    #[serde(default)]
    pub page_range: Option<String>,

    #[serde(default)]
    pub category: ExtractionCategory,
}

impl ExtractionRequest {
    pub fn new(category: ExtractionCategory) -> Self {
        Self {
            page_range: None,
            category,
        }
    }

    pub fn with_page_range(mut self, expression: impl Into<String>) -> Self {
        self.page_range = Some(expression.into());
        self
    }

    /// The page expression as shown in user-facing messages.
    pub fn page_label(&self) -> &str {
        match self.page_range.as_deref().map(str::trim) {
            Some(expr) if !expr.is_empty() => expr,
            _ => "all",
        }
    }
}

/// Normalized output of a single extraction call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ExtractionResult {
    Text(String),
    TableSet(Vec<TableRecord>),
    ImageSet(Vec<ImageRecord>),
    /// Extraction succeeded but the requested category yielded nothing.
    NotFound {
        category: ExtractionCategory,
        message: String,
    },
}

impl ExtractionResult {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExtractionResult::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn tables(&self) -> &[TableRecord] {
        match self {
            ExtractionResult::TableSet(tables) => tables,
            _ => &[],
        }
    }

    pub fn images(&self) -> &[ImageRecord] {
        match self {
            ExtractionResult::ImageSet(images) => images,
            _ => &[],
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ExtractionResult::NotFound { .. })
    }
}

/// Result plus the human-readable summary line shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResponse {
    pub result: ExtractionResult,
    pub message: String,
}

/// A detected table with its surrounding page text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRecord {
    /// 1-based, in discovery order across the whole requested range.
    pub table_index: usize,
    pub context: String,
    pub parsing_report: ParsingReport,
    pub table_data: TableData,
}

/// A PDF image uploaded to the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// 1-based, in discovery order across the whole requested range.
    pub image_index: usize,
    pub image_url: String,
}

/// Diagnostic fields produced by table detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsingReport(BTreeMap<String, serde_json::Value>);

impl ParsingReport {
    /// Keys used during detection that never leave the crate.
    pub const INTERNAL_KEYS: [&'static str; 3] = ["whitespace", "order", "context"];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop the internal-only fields.
    pub fn strip_internal(mut self) -> Self {
        for key in Self::INTERNAL_KEYS {
            self.0.remove(key);
        }
        self
    }
}

/// Row-oriented table cells.
///
/// Serializes column-major as `{"0": {"0": cell, "1": cell}, "1": {...}}`,
/// the shape downstream consumers already read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    rows: Vec<Vec<String>>,
}

impl TableData {
    /// Build from rows, padding short rows so every row has the same width.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(column)).map(String::as_str)
    }
}

impl Serialize for TableData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let columns = self.column_count();
        let mut outer = serializer.serialize_map(Some(columns))?;
        for column in 0..columns {
            let values: BTreeMap<String, &str> = self
                .rows
                .iter()
                .enumerate()
                .map(|(row_idx, row)| (row_idx.to_string(), row[column].as_str()))
                .collect();
            outer.serialize_entry(&column.to_string(), &values)?;
        }
        outer.end()
    }
}
