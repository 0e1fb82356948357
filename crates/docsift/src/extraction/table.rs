//! Markdown table rendering.
//!
//! The first row is the header. Short rows are padded with empty cells, and
//! `|` and `\` inside cells are escaped. Newlines inside a cell become spaces
//! so every row stays on one line.
//!
//! ```markdown
//! | Name | Qty |
//! | --- | --- |
//! | Bolt | 4 |
//! ```

/// Render `rows` as a GitHub-flavored markdown table, one `\n` per row.
///
/// Returns an empty string when there are no rows.
pub fn rows_to_markdown(rows: &[Vec<String>]) -> String {
    let Some(header) = rows.first() else {
        return String::new();
    };
    let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);

    let mut out = String::with_capacity(rows.len() * width * 12);
    push_row(&mut out, header, width);

    out.push('|');
    for _ in 0..width {
        out.push_str(" --- |");
    }
    out.push('\n');

    for row in &rows[1..] {
        push_row(&mut out, row, width);
    }
    out
}

fn push_row(out: &mut String, row: &[String], width: usize) {
    out.push('|');
    for i in 0..width {
        out.push(' ');
        if let Some(cell) = row.get(i) {
            escape_cell_into(out, cell);
        }
        out.push_str(" |");
    }
    out.push('\n');
}

/// Append `cell` with markdown table metacharacters escaped.
pub fn escape_cell_into(buffer: &mut String, cell: &str) {
    for ch in cell.trim().chars() {
        match ch {
            '|' => buffer.push_str("\\|"),
            '\\' => buffer.push_str("\\\\"),
            '\r' => {}
            '\n' => buffer.push(' '),
            _ => buffer.push(ch),
        }
    }
}
