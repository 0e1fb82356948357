//! Page range expressions.
//!
//! Callers select PDF pages with a 1-based expression such as `"1-3,5"`.
//! [`PageRange::resolve`] turns that into sorted, deduplicated zero-based
//! indices bounded by the document's page count. Resolution is pure: no I/O
//! and no access to the document itself.
//!
//! # Rules
//!
//! - absent or blank expression selects every page
//! - `a-b` selects pages `a` through `b` inclusive; `a > b` is rejected
//! - indices outside the document are dropped silently
//! - the call fails if nothing survives the bounds filter

use crate::error::{DocsiftError, Result};
use std::collections::BTreeSet;

/// Sorted, deduplicated zero-based page indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    indices: Vec<usize>,
}

impl PageRange {
    /// Every page of a document with `page_count` pages.
    pub fn all(page_count: usize) -> Self {
        Self {
            indices: (0..page_count).collect(),
        }
    }

    /// Resolve an optional 1-based expression against `page_count`.
    pub fn resolve(expression: Option<&str>, page_count: usize) -> Result<Self> {
        let expression = expression.map(str::trim).unwrap_or_default();

        if expression.is_empty() {
            if page_count == 0 {
                return Err(DocsiftError::invalid_page_range("", "document has no pages"));
            }
            return Ok(Self::all(page_count));
        }

        let mut selected = BTreeSet::new();
        for segment in expression.split(',') {
            let segment = segment.trim();
            match segment.split_once('-') {
                Some((start, end)) => {
                    let start = parse_page_number(expression, start)?;
                    let end = parse_page_number(expression, end)?;
                    if start > end {
                        return Err(DocsiftError::invalid_page_range(
                            expression,
                            format!("range start {} is greater than end {}", start, end),
                        ));
                    }
                    let first = start.saturating_sub(1);
                    let last = end.min(page_count);
                    selected.extend(first..last);
                }
                None => {
                    let page = parse_page_number(expression, segment)?;
                    if let Some(index) = page.checked_sub(1)
                        && index < page_count
                    {
                        selected.insert(index);
                    }
                }
            }
        }

        if selected.is_empty() {
            return Err(DocsiftError::invalid_page_range(
                expression,
                format!(
                    "no pages within bounds; the document has {} page{}",
                    page_count,
                    if page_count == 1 { "" } else { "s" }
                ),
            ));
        }

        Ok(Self {
            indices: selected.into_iter().collect(),
        })
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }
}

impl<'a> IntoIterator for &'a PageRange {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter()
    }
}

fn parse_page_number(expression: &str, token: &str) -> Result<usize> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DocsiftError::invalid_page_range(
            expression,
            "empty page number; expected forms like '3' or '1-4'",
        ));
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DocsiftError::invalid_page_range(
            expression,
            format!("'{}' is not a page number", token),
        ));
    }
    token.parse::<usize>().map_err(|e| {
        DocsiftError::invalid_page_range(expression, format!("'{}' is not a page number: {}", token, e))
    })
}
