//! CSV, TSV and XLSX to markdown.
//!
//! Delimited files become a single table. Workbooks become one `## {sheet}`
//! section per worksheet. The output always ends with a blank line.

use super::table::rows_to_markdown;
use crate::{DocsiftError, Result};
use calamine::{Data, Range, Reader, Xlsx};
use std::io::Cursor;

/// Render a delimited file (`,` or `\t`) as one markdown table.
pub fn delimited_to_markdown(bytes: &[u8], delimiter: u8) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            DocsiftError::extraction_failed_with_source(format!("Failed to parse delimited row {}", line + 1), e)
        })?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let mut markdown = rows_to_markdown(&rows);
    markdown.push('\n');
    Ok(markdown)
}

/// Render every worksheet of an XLSX workbook.
pub fn xlsx_to_markdown(bytes: &[u8]) -> Result<String> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| DocsiftError::extraction_failed(format!("Failed to parse XLSX: {}", e)))?;

    let mut markdown = String::new();
    for name in workbook.sheet_names() {
        match workbook.worksheet_range(&name) {
            Ok(range) => markdown.push_str(&sheet_to_markdown(&name, &range)),
            Err(err) => {
                tracing::warn!(sheet = %name, error = %err, "Skipping unreadable worksheet");
            }
        }
    }

    if markdown.is_empty() {
        markdown.push('\n');
    }
    Ok(markdown)
}

fn sheet_to_markdown(name: &str, range: &Range<Data>) -> String {
    let (rows, cols) = range.get_size();
    if rows == 0 || cols == 0 {
        return format!("## {}\n\n*Empty sheet*\n\n", name);
    }

    let cells: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(format_cell).collect())
        .collect();

    format!("## {}\n\n{}\n", name, rows_to_markdown(&cells))
}

fn format_cell(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{:.1}", f)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format!("{:?}", dt),
        },
        Data::Error(e) => format!("#ERR: {:?}", e),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => format!("DURATION: {}", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};

    #[test]
    fn test_csv_to_markdown() {
        let md = delimited_to_markdown(b"name,qty\nbolt,4\nnut,12\n", b',').unwrap();
        assert_eq!(md, "| name | qty |\n| --- | --- |\n| bolt | 4 |\n| nut | 12 |\n\n");
    }

    #[test]
    fn test_tsv_to_markdown() {
        let md = delimited_to_markdown(b"a\tb\n1\t2|3\n", b'\t').unwrap();
        assert_eq!(md, "| a | b |\n| --- | --- |\n| 1 | 2\\|3 |\n\n");
    }

    #[test]
    fn test_quoted_csv_fields() {
        let md = delimited_to_markdown(b"title,note\n\"Smith, J\",\"two\nlines\"\n", b',').unwrap();
        assert!(md.contains("| Smith, J | two lines |"));
    }

    #[test]
    fn test_ragged_csv() {
        let md = delimited_to_markdown(b"a,b,c\n1\n", b',').unwrap();
        assert!(md.contains("| 1 |  |  |"));
    }

    #[test]
    fn test_empty_csv() {
        assert_eq!(delimited_to_markdown(b"", b',').unwrap(), "\n");
    }

    #[test]
    fn test_invalid_utf8_csv_fails() {
        let err = delimited_to_markdown(b"a,b\n\xff\xfe,1\n", b',').unwrap_err();
        assert!(matches!(err, DocsiftError::ExtractionFailed { .. }));
    }

    #[test]
    fn test_invalid_xlsx_fails() {
        let err = xlsx_to_markdown(b"not a workbook").unwrap_err();
        assert!(matches!(err, DocsiftError::ExtractionFailed { .. }));
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&Data::Empty), "");
        assert_eq!(format_cell(&Data::Float(42.0)), "42.0");
        assert_eq!(format_cell(&Data::Float(1.25)), "1.25");
        assert_eq!(format_cell(&Data::Int(7)), "7");
        assert_eq!(format_cell(&Data::Bool(true)), "true");
        assert_eq!(format_cell(&Data::Error(CellErrorType::Div0)), "#ERR: Div0");
        assert_eq!(format_cell(&Data::DurationIso("PT1H".to_owned())), "DURATION: PT1H");

        let dt = Data::DateTime(ExcelDateTime::new(49353.5, ExcelDateTimeType::DateTime, false));
        assert_eq!(format_cell(&dt), "2035-02-13 12:00:00");
    }

    #[test]
    fn test_sheet_to_markdown() {
        let mut range = Range::new((0, 0), (1, 1));
        range.set_value((0, 0), Data::String("Name".to_owned()));
        range.set_value((0, 1), Data::String("Age".to_owned()));
        range.set_value((1, 0), Data::String("Alice".to_owned()));
        range.set_value((1, 1), Data::Int(30));

        assert_eq!(
            sheet_to_markdown("People", &range),
            "## People\n\n| Name | Age |\n| --- | --- |\n| Alice | 30 |\n\n"
        );
    }

    #[test]
    fn test_empty_sheet() {
        let range: Range<Data> = Range::empty();
        assert_eq!(sheet_to_markdown("Blank", &range), "## Blank\n\n*Empty sheet*\n\n");
    }
}
