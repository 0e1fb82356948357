//! Format-specific conversion to text.
//!
//! These functions do the actual work for the non-PDF formats; the
//! [`extractors`](crate::extractors) module wraps them behind a common trait.

pub mod spreadsheet;
pub mod table;
pub mod text;
pub mod word;

pub use spreadsheet::{delimited_to_markdown, xlsx_to_markdown};
pub use table::rows_to_markdown;
pub use text::extract_text;
pub use word::{extract_doc, extract_docx};
