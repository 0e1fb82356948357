//! Word documents.
//!
//! Legacy `.doc` files are converted by the `antiword` executable; its
//! stdout is the extracted text. `.docx` files are read natively: the body
//! paragraphs of `word/document.xml` are joined with newlines.
//!
//! # System Requirement
//!
//! `.doc` support needs `antiword` on `PATH`, in `ANTIWORD_PATH`, or set as
//! `word.antiword_path` in the configuration:
//! - **macOS**: `brew install antiword`
//! - **Linux**: `apt install antiword`

use crate::core::config::WordConfig;
use crate::core::process::{diagnostic_output, locate_binary};
use crate::{DocsiftError, Result};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

fn antiword_install_message() -> String {
    "antiword is required for .doc files. \
Install: macOS: 'brew install antiword', Linux: 'apt install antiword'. \
If it is installed in a custom location, set ANTIWORD_PATH to the executable."
        .to_string()
}

/// Locate `antiword` using the configured path, `ANTIWORD_PATH`, then `PATH`.
pub fn locate_antiword(config: &WordConfig) -> Result<PathBuf> {
    locate_binary("antiword", config.antiword_path.as_deref(), &["ANTIWORD_PATH"])
        .ok_or_else(|| DocsiftError::extraction_failed(antiword_install_message()))
}

/// Extract text from a legacy `.doc` file.
pub async fn extract_doc(bytes: &[u8], config: &WordConfig) -> Result<String> {
    let binary = locate_antiword(config)?;
    extract_doc_with(&binary, bytes, config.timeout_secs).await
}

/// Run `binary` on a spooled copy of `bytes` and return its stdout.
///
/// The spooled file is removed when this returns, whatever the outcome.
pub async fn extract_doc_with(binary: &Path, bytes: &[u8], timeout_secs: u64) -> Result<String> {
    let spool = tempfile::Builder::new()
        .prefix("docsift-doc-")
        .suffix(".doc")
        .tempfile()?;
    tokio::fs::write(spool.path(), bytes).await?;

    let child = Command::new(binary)
        .arg(spool.path())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            DocsiftError::extraction_failed(format!("Failed to execute antiword at '{}': {}", binary.display(), e))
        })?;

    let output = match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(DocsiftError::extraction_failed_with_source("Failed to wait for antiword", e));
        }
        Err(_) => {
            return Err(DocsiftError::extraction_failed(format!(
                "antiword timed out after {} seconds",
                timeout_secs
            )));
        }
    };

    if !output.status.success() {
        return Err(DocsiftError::extraction_failed(format!(
            "antiword failed with return code {}: {}",
            output.status.code().unwrap_or(-1),
            diagnostic_output(&output.stderr, &output.stdout)
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Extract body paragraphs from a `.docx` file, one per line.
pub fn extract_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DocsiftError::extraction_failed_with_source("Failed to open DOCX as ZIP", e))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| DocsiftError::extraction_failed_with_source("DOCX has no word/document.xml", e))?
        .read_to_string(&mut xml)
        .map_err(|e| DocsiftError::extraction_failed_with_source("Failed to read word/document.xml", e))?;

    paragraphs_from_document_xml(&xml).map(|paragraphs| paragraphs.join("\n"))
}

/// Text of each `w:p` directly under `w:body`, empty paragraphs included.
fn paragraphs_from_document_xml(xml: &str) -> Result<Vec<String>> {
    let document = roxmltree::Document::parse(xml)
        .map_err(|e| DocsiftError::extraction_failed_with_source("Malformed word/document.xml", e))?;

    let Some(body) = document
        .descendants()
        .find(|node| node.has_tag_name((WORDPROCESSING_NS, "body")))
    else {
        return Ok(Vec::new());
    };

    Ok(body
        .children()
        .filter(|node| node.has_tag_name((WORDPROCESSING_NS, "p")))
        .map(paragraph_text)
        .collect())
}

fn paragraph_text(paragraph: roxmltree::Node) -> String {
    let mut text = String::new();
    for node in paragraph.descendants() {
        if node.tag_name().namespace() != Some(WORDPROCESSING_NS) {
            continue;
        }
        match node.tag_name().name() {
            "t" => text.push_str(node.text().unwrap_or_default()),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}
