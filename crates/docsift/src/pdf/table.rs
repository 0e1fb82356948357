//! PDF table extraction from text positions.
//!
//! Detection follows the "stream" approach: no ruling lines are needed.
//! Lines whose words fall into two or more widely spaced cells are
//! candidate rows; runs of consecutive candidate rows whose cells line up
//! in shared columns become tables.
//!
//! Each table is paired with a context string built from the text blocks
//! just above and just below it, which usually carry the caption or the
//! sentence introducing the table.

use super::layout::{BoundingBox, PageLayout, TextBlock, TextLine, Word, group_lines_into_blocks};
use crate::types::{ParsingReport, TableData, TableRecord};
use std::cmp::Ordering;
use std::ops::Range;

/// Context used when no text sits near a table.
pub const NO_CONTEXT: &str = "No context provided";

/// Default vertical search distance for context text, in PDF points.
pub const DEFAULT_CONTEXT_BUFFER: f32 = 25.0;

#[derive(Debug, Clone)]
pub struct StreamDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Horizontal gap between words that separates two cells (points)
    pub min_column_gap: f32,
    /// Largest vertical gap between rows, as a multiple of row height
    pub max_row_gap_ratio: f32,
}

impl Default for StreamDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            min_column_gap: 10.0,
            max_row_gap_ratio: 2.0,
        }
    }
}

/// A table found on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    pub bbox: BoundingBox,
    pub rows: Vec<Vec<String>>,
    pub report: ParsingReport,
    /// Indices into the page's lines covered by this table.
    pub lines: Range<usize>,
}

/// Finds tables in a page layout.
pub trait TableDetector: Send + Sync {
    /// `page_index` is zero-based; detectors report it 1-based.
    fn detect(&self, layout: &PageLayout, lines: &[TextLine], page_index: usize) -> Vec<DetectedTable>;
}

#[derive(Debug, Clone, Default)]
pub struct StreamTableDetector {
    config: StreamDetectorConfig,
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    bbox: BoundingBox,
}

impl StreamTableDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StreamDetectorConfig) -> Self {
        Self { config }
    }

    fn split_cells(&self, line: &TextLine) -> Vec<Cell> {
        let mut cells: Vec<Cell> = Vec::new();
        let mut last: Option<&Word> = None;

        for word in &line.words {
            let starts_cell = last.is_none_or(|prev| word.bbox.left - prev.bbox.right > self.config.min_column_gap);
            match cells.last_mut() {
                Some(cell) if !starts_cell => {
                    cell.text.push(' ');
                    cell.text.push_str(&word.text);
                    cell.bbox = cell.bbox.union(&word.bbox);
                }
                _ => cells.push(Cell {
                    text: word.text.clone(),
                    bbox: word.bbox,
                }),
            }
            last = Some(word);
        }

        cells
    }

    /// Runs of consecutive multi-cell lines that are close enough vertically.
    fn candidate_runs(&self, lines: &[TextLine], cells: &[Vec<Cell>]) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut start: Option<usize> = None;

        for i in 0..=lines.len() {
            let is_candidate = i < lines.len() && cells[i].len() >= self.config.min_columns;
            let continues = match (start, is_candidate) {
                (Some(_), true) => {
                    let prev = &lines[i - 1];
                    let gap = lines[i].bbox.top - prev.bbox.bottom;
                    gap <= prev.height().max(lines[i].height()) * self.config.max_row_gap_ratio
                }
                _ => false,
            };

            if let Some(s) = start
                && !continues
            {
                if i - s >= self.config.min_rows {
                    runs.push(s..i);
                }
                start = None;
            }

            if is_candidate && start.is_none() {
                start = Some(i);
            }
        }

        runs
    }

    /// Column intervals from overlapping cell spans, left to right.
    fn column_intervals(cells: &[&Cell]) -> Vec<(f32, f32)> {
        let mut spans: Vec<(f32, f32)> = cells.iter().map(|c| (c.bbox.left, c.bbox.right)).collect();
        spans.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let mut merged: Vec<(f32, f32)> = Vec::new();
        for (left, right) in spans {
            match merged.last_mut() {
                Some(last) if left <= last.1 => last.1 = last.1.max(right),
                _ => merged.push((left, right)),
            }
        }
        merged
    }

    fn build_table(&self, lines: &[TextLine], cells: &[Vec<Cell>], run: Range<usize>) -> Option<(BoundingBox, Vec<Vec<String>>, f64, f64)> {
        let run_cells: Vec<&Cell> = cells[run.clone()].iter().flatten().collect();
        let columns = Self::column_intervals(&run_cells);
        if columns.len() < self.config.min_columns {
            return None;
        }

        let mut rows = Vec::with_capacity(run.len());
        let mut complete_rows = 0usize;
        let mut empty_cells = 0usize;

        for row_cells in &cells[run.clone()] {
            let mut row = vec![String::new(); columns.len()];
            for cell in row_cells {
                let center = (cell.bbox.left + cell.bbox.right) / 2.0;
                let column = columns
                    .iter()
                    .position(|(left, right)| center >= *left && center <= *right)
                    .unwrap_or(columns.len() - 1);
                if !row[column].is_empty() {
                    row[column].push(' ');
                }
                row[column].push_str(&cell.text);
            }

            let empty = row.iter().filter(|c| c.is_empty()).count();
            if empty == 0 {
                complete_rows += 1;
            }
            empty_cells += empty;
            rows.push(row);
        }

        let bbox = lines[run.clone()]
            .iter()
            .skip(1)
            .fold(lines[run.start].bbox, |acc, line| acc.union(&line.bbox));

        let total_cells = (rows.len() * columns.len()) as f64;
        let accuracy = round2(100.0 * complete_rows as f64 / rows.len() as f64);
        let whitespace = round2(100.0 * empty_cells as f64 / total_cells);

        Some((bbox, rows, accuracy, whitespace))
    }
}

impl TableDetector for StreamTableDetector {
    fn detect(&self, _layout: &PageLayout, lines: &[TextLine], page_index: usize) -> Vec<DetectedTable> {
        let cells: Vec<Vec<Cell>> = lines.iter().map(|line| self.split_cells(line)).collect();

        let mut tables = Vec::new();
        for run in self.candidate_runs(lines, &cells) {
            let Some((bbox, rows, accuracy, whitespace)) = self.build_table(lines, &cells, run.clone()) else {
                tracing::debug!(page = page_index + 1, ?run, "Rejected table candidate: too few columns");
                continue;
            };

            let mut report = ParsingReport::new();
            report.insert("accuracy", accuracy);
            report.insert("whitespace", whitespace);
            report.insert("order", tables.len() + 1);
            report.insert("page", page_index + 1);

            tables.push(DetectedTable {
                bbox,
                rows,
                report,
                lines: run,
            });
        }

        tables
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Text near a table: blocks overlapping its horizontal span whose bottom
/// edge lies within `buffer` above the table, or whose top edge lies within
/// `buffer` below it. Blocks are joined with spaces in reading order.
pub fn surrounding_text(blocks: &[TextBlock], table: &BoundingBox, buffer: f32) -> String {
    let mut nearby: Vec<&TextBlock> = blocks
        .iter()
        .filter(|block| {
            let b = &block.bbox;
            let horizontal = b.overlaps_horizontally(table);
            let above = b.bottom <= table.top && b.bottom >= table.top - buffer;
            let below = b.top >= table.bottom && b.top <= table.bottom + buffer;
            horizontal && (above || below)
        })
        .collect();

    nearby.sort_by(|a, b| {
        a.bbox
            .top
            .partial_cmp(&b.bbox.top)
            .unwrap_or(Ordering::Equal)
            .then(a.bbox.left.partial_cmp(&b.bbox.left).unwrap_or(Ordering::Equal))
    });

    nearby.iter().map(|b| b.text.as_str()).collect::<Vec<_>>().join(" ")
}

/// Detect tables on one page and attach context.
///
/// Lines that belong to a table are excluded from the context blocks, so a
/// caption sitting tight against a table is not swallowed into it.
pub fn tables_on_page(
    detector: &dyn TableDetector,
    layout: &PageLayout,
    page_index: usize,
    buffer: f32,
) -> Vec<(DetectedTable, String)> {
    let lines = layout.lines();
    let tables = detector.detect(layout, &lines, page_index);
    if tables.is_empty() {
        return Vec::new();
    }

    let free_lines: Vec<TextLine> = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| !tables.iter().any(|t| t.lines.contains(i)))
        .map(|(_, line)| line.clone())
        .collect();
    let blocks = group_lines_into_blocks(&free_lines);

    tables
        .into_iter()
        .map(|table| {
            let context = surrounding_text(&blocks, &table.bbox, buffer);
            (table, context)
        })
        .collect()
}

/// Number tables across pages, in page order, starting at 1.
///
/// `pages` yields `(page_index, layout)` in ascending page order.
pub fn collect_table_records<I>(detector: &dyn TableDetector, pages: I, buffer: f32) -> Vec<TableRecord>
where
    I: IntoIterator<Item = (usize, PageLayout)>,
{
    let mut records = Vec::new();
    for (page_index, layout) in pages {
        for (table, context) in tables_on_page(detector, &layout, page_index, buffer) {
            let mut report = table.report;
            report.insert("context", context.clone());
            records.push(TableRecord {
                table_index: records.len() + 1,
                context: if context.trim().is_empty() {
                    NO_CONTEXT.to_string()
                } else {
                    context
                },
                parsing_report: report.strip_internal(),
                table_data: TableData::from_rows(table.rows),
            });
        }
    }
    records
}
