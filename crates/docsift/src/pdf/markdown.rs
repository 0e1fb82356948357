//! Markdown rendering of a page layout.
//!
//! The structure is inferred from geometry alone: lines noticeably taller
//! than the body text become headings, lines starting with a bullet glyph
//! become list items, and vertical gaps larger than a line split paragraphs.

use super::layout::{PageLayout, TextLine, median_line_height};

const H1_RATIO: f32 = 1.6;
const H2_RATIO: f32 = 1.3;
const PARAGRAPH_GAP_RATIO: f32 = 0.8;

const BULLETS: &[char] = &['•', '◦', '▪', '‣', '●', '■', '-', '*', '–'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Heading(u8),
    ListItem,
    Body,
}

/// Render one page as markdown. Non-empty output ends with a blank line.
pub fn page_to_markdown(layout: &PageLayout) -> String {
    let lines = layout.lines();
    if lines.is_empty() {
        return String::new();
    }

    let body_height = median_line_height(&lines);
    let mut out = String::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut previous: Option<&TextLine> = None;

    for line in &lines {
        let text = line.text();
        let kind = classify_line(line, &text, body_height);

        let gap_break = previous.is_some_and(|prev| {
            line.bbox.top - prev.bbox.bottom > prev.height().max(body_height) * PARAGRAPH_GAP_RATIO
        });

        if kind != LineKind::Body || gap_break {
            flush_paragraph(&mut out, &mut paragraph);
        }

        match kind {
            LineKind::Heading(level) => {
                out.push_str(&"#".repeat(level as usize));
                out.push(' ');
                out.push_str(&text);
                out.push_str("\n\n");
            }
            LineKind::ListItem => {
                out.push_str("- ");
                out.push_str(strip_bullet(&text));
                out.push('\n');
            }
            LineKind::Body => {
                if previous.is_some() && paragraph.is_empty() && out.ends_with('\n') && !out.ends_with("\n\n") {
                    out.push('\n');
                }
                paragraph.push(text);
            }
        }

        previous = Some(line);
    }

    flush_paragraph(&mut out, &mut paragraph);

    let trimmed = out.trim_end();
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{}\n\n", trimmed)
}

fn classify_line(line: &TextLine, text: &str, body_height: f32) -> LineKind {
    if starts_with_bullet(text) {
        return LineKind::ListItem;
    }
    if body_height > 0.0 {
        let ratio = line.height() / body_height;
        if ratio >= H1_RATIO {
            return LineKind::Heading(1);
        }
        if ratio >= H2_RATIO {
            return LineKind::Heading(2);
        }
    }
    LineKind::Body
}

fn starts_with_bullet(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) => BULLETS.contains(&first) && second.is_whitespace(),
        _ => false,
    }
}

fn strip_bullet(text: &str) -> &str {
    let mut chars = text.chars();
    chars.next();
    chars.as_str().trim_start()
}

fn flush_paragraph(out: &mut String, paragraph: &mut Vec<String>) {
    if paragraph.is_empty() {
        return;
    }
    out.push_str(&paragraph.join("\n"));
    out.push_str("\n\n");
    paragraph.clear();
}
