//! Page layout reconstruction from positioned glyphs.
//!
//! Everything here works in page space with a top-left origin: `top < bottom`,
//! units are PDF points. The pdfium adapter flips coordinates once when it
//! builds [`Glyph`]s, so the geometric heuristics downstream never deal with
//! the bottom-left PDF convention.

use std::cmp::Ordering;

/// Spacing threshold for word boundary detection (in PDF units).
///
/// Characters separated by more than this distance are considered separate words.
const WORD_SPACING_THRESHOLD: f32 = 3.0;

/// Fraction of line height two words may differ by and still share a line.
const LINE_TOLERANCE_RATIO: f32 = 0.5;

/// Vertical gap, as a multiple of line height, that still joins two lines
/// into one block.
const BLOCK_GAP_RATIO: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Convert a bottom-left-origin rectangle into page space.
    pub fn from_pdf_rect(left: f32, bottom: f32, right: f32, top: f32, page_height: f32) -> Self {
        Self::new(left, page_height - top, right, page_height - bottom)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Strict overlap of the horizontal spans.
    pub fn overlaps_horizontally(&self, other: &BoundingBox) -> bool {
        self.left < other.right && self.right > other.left
    }
}

/// A single positioned character.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Sorted left to right.
    pub words: Vec<Word>,
    pub bbox: BoundingBox,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ")
    }

    pub fn height(&self) -> f32 {
        self.bbox.height()
    }
}

/// A run of vertically adjacent lines, the unit used for table context.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub bbox: BoundingBox,
}

/// Words of one page plus its dimensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub words: Vec<Word>,
}

impl PageLayout {
    pub fn from_glyphs(width: f32, height: f32, glyphs: &[Glyph]) -> Self {
        Self {
            width,
            height,
            words: group_glyphs_into_words(glyphs),
        }
    }

    pub fn lines(&self) -> Vec<TextLine> {
        group_words_into_lines(&self.words)
    }

    pub fn blocks(&self) -> Vec<TextBlock> {
        group_lines_into_blocks(&self.lines())
    }
}

/// Group characters into words.
///
/// Whitespace always ends a word; otherwise a new word starts when the next
/// glyph drops to another line or sits further than
/// [`WORD_SPACING_THRESHOLD`] from the previous one.
pub fn group_glyphs_into_words(glyphs: &[Glyph]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Vec<&Glyph> = Vec::new();

    for glyph in glyphs {
        if glyph.ch.is_whitespace() || glyph.ch.is_control() {
            if let Some(word) = finalize_word(&current) {
                words.push(word);
            }
            current.clear();
            continue;
        }

        if should_start_new_word(&current, glyph)
            && let Some(word) = finalize_word(&current)
        {
            words.push(word);
            current.clear();
        }

        current.push(glyph);
    }

    if let Some(word) = finalize_word(&current) {
        words.push(word);
    }

    words
}

fn should_start_new_word(current: &[&Glyph], next: &Glyph) -> bool {
    let Some(last) = current.last() else {
        return false;
    };

    let vertical_distance = (next.bbox.center_y() - last.bbox.center_y()).abs();
    if vertical_distance > last.bbox.height() * 0.5 {
        return true;
    }

    let horizontal_gap = next.bbox.left - last.bbox.right;
    horizontal_gap > WORD_SPACING_THRESHOLD || horizontal_gap < -last.bbox.width().max(1.0) * 2.0
}

fn finalize_word(glyphs: &[&Glyph]) -> Option<Word> {
    let first = glyphs.first()?;
    let text: String = glyphs.iter().map(|g| g.ch).collect();
    let bbox = glyphs.iter().skip(1).fold(first.bbox, |acc, g| acc.union(&g.bbox));
    Some(Word { text, bbox })
}

fn cmp_f32(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Group words into lines by vertical center, top to bottom.
pub fn group_words_into_lines(words: &[Word]) -> Vec<TextLine> {
    let mut sorted: Vec<&Word> = words.iter().collect();
    sorted.sort_by(|a, b| cmp_f32(a.bbox.center_y(), b.bbox.center_y()).then(cmp_f32(a.bbox.left, b.bbox.left)));

    let mut lines: Vec<TextLine> = Vec::new();
    for word in sorted {
        let joins_last = lines.last().is_some_and(|line| {
            let tolerance = line.bbox.height().max(word.bbox.height()) * LINE_TOLERANCE_RATIO;
            (word.bbox.center_y() - line.bbox.center_y()).abs() <= tolerance
        });

        match lines.last_mut() {
            Some(line) if joins_last => {
                line.bbox = line.bbox.union(&word.bbox);
                line.words.push(word.clone());
            }
            _ => lines.push(TextLine {
                words: vec![word.clone()],
                bbox: word.bbox,
            }),
        }
    }

    for line in &mut lines {
        line.words.sort_by(|a, b| cmp_f32(a.bbox.left, b.bbox.left));
    }

    lines
}

/// Merge consecutive lines separated by less than a line of whitespace.
pub fn group_lines_into_blocks(lines: &[TextLine]) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut previous: Option<&TextLine> = None;

    for line in lines {
        let text = line.text();
        let continues = match (previous, blocks.last()) {
            (Some(prev), Some(block)) => {
                let gap = line.bbox.top - prev.bbox.bottom;
                gap <= prev.height().max(line.height()) * BLOCK_GAP_RATIO && block.bbox.overlaps_horizontally(&line.bbox)
            }
            _ => false,
        };

        match blocks.last_mut() {
            Some(block) if continues => {
                block.text.push(' ');
                block.text.push_str(&text);
                block.bbox = block.bbox.union(&line.bbox);
            }
            _ => blocks.push(TextBlock { text, bbox: line.bbox }),
        }
        previous = Some(line);
    }

    blocks
}

/// Median line height, used as the body font size estimate.
pub fn median_line_height(lines: &[TextLine]) -> f32 {
    let mut heights: Vec<f32> = lines.iter().map(TextLine::height).filter(|h| *h > 0.0).collect();
    if heights.is_empty() {
        return 0.0;
    }
    heights.sort_by(|a, b| cmp_f32(*a, *b));
    heights[heights.len() / 2]
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Lay out `text` as monospaced glyphs starting at (`left`, `top`).
    pub fn glyphs(text: &str, left: f32, top: f32, size: f32) -> Vec<Glyph> {
        let advance = size * 0.6;
        text.chars()
            .enumerate()
            .map(|(i, ch)| {
                let x = left + i as f32 * advance;
                Glyph {
                    ch,
                    bbox: BoundingBox::new(x, top, x + advance * 0.9, top + size),
                }
            })
            .collect()
    }

    pub fn word(text: &str, left: f32, top: f32, size: f32) -> Word {
        let width = text.chars().count() as f32 * size * 0.6;
        Word {
            text: text.to_string(),
            bbox: BoundingBox::new(left, top, left + width, top + size),
        }
    }
}
