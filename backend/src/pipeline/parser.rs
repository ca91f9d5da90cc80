//! Tabular file decoding.
//!
//! Turns uploaded bytes into an ordered sequence of raw rows keyed by the
//! header cells. Parsing is all-or-nothing: a corrupt file yields a single
//! `Parse` error and no partial output. Unknown headers are passed through
//! untouched so templates can gain columns without breaking older exports.

use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;

use crate::error::PipelineError;
use common::model::session::RawRow;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decodes `bytes` according to the file extension. Supports delimited text
/// (`.csv`, `.tsv`, `.txt`) and spreadsheets (`.xlsx`, `.xls`).
pub fn parse(bytes: &[u8], file_name: &str) -> Result<Vec<RawRow>, PipelineError> {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        parse_workbook(bytes)
    } else if lower.ends_with(".csv") || lower.ends_with(".tsv") || lower.ends_with(".txt") {
        parse_delimited(bytes)
    } else {
        Err(PipelineError::Parse(format!(
            "unsupported file type: {file_name} (expected .csv, .tsv, .txt, .xlsx or .xls)"
        )))
    }
}

/// Picks the candidate delimiter occurring most often in the header line.
fn detect_delimiter(header_line: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .into_iter()
        .max_by_key(|&d| header_line.matches(d as char).count())
        .unwrap_or(b',')
}

fn check_headers(headers: &[String]) -> Result<(), PipelineError> {
    if headers.iter().any(|h| h.is_empty()) {
        return Err(PipelineError::Parse(
            "header cells must not be empty".into(),
        ));
    }
    Ok(())
}

fn parse_delimited(bytes: &[u8]) -> Result<Vec<RawRow>, PipelineError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)
        .map_err(|_| PipelineError::Parse("file is not valid UTF-8".into()))?;
    let header_line = text.lines().next().ok_or(PipelineError::EmptyFile)?;
    let delimiter = detect_delimiter(header_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::Parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    check_headers(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PipelineError::Parse(e.to_string()))?;
        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            row.insert(header.clone(), record.get(i).unwrap_or_default().to_string());
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(PipelineError::EmptyFile);
    }
    Ok(rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        // Spreadsheets store integers as floats; render whole values
        // without the trailing ".0".
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

fn parse_workbook(bytes: &[u8]) -> Result<Vec<RawRow>, PipelineError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| PipelineError::Parse(format!("unreadable workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::Parse("workbook has no worksheets".into()))?
        .map_err(|e| PipelineError::Parse(format!("unreadable worksheet: {e}")))?;

    let mut row_iter = range.rows();
    let header_cells = row_iter.next().ok_or(PipelineError::EmptyFile)?;
    let headers: Vec<String> = header_cells.iter().map(cell_to_string).collect();
    check_headers(&headers)?;

    let mut rows = Vec::new();
    for cells in row_iter {
        // Trailing blank spreadsheet rows are not data.
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            let value = cells.get(i).map(cell_to_string).unwrap_or_default();
            row.insert(header.clone(), value);
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(PipelineError::EmptyFile);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_delimited_rows_in_order() {
        let data = b"campaign_name,budget\nAlpha,100\nBeta,200\n";
        let rows = parse(data, "ads.csv").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("campaign_name").unwrap(), "Alpha");
        assert_eq!(rows[1].get("budget").unwrap(), "200");
        // Header order is preserved in each row map.
        let keys: Vec<_> = rows[0].keys().collect();
        assert_eq!(keys, vec!["campaign_name", "budget"]);
    }

    #[test]
    fn detects_semicolon_delimiter_from_header() {
        let data = b"campaign_name;budget\nAlpha;100\n";
        let rows = parse(data, "ads.csv").unwrap();
        assert_eq!(rows[0].get("budget").unwrap(), "100");
    }

    #[test]
    fn strips_utf8_bom() {
        let data = b"\xEF\xBB\xBFcampaign_name\nAlpha\n";
        let rows = parse(data, "ads.csv").unwrap();
        assert_eq!(rows[0].get("campaign_name").unwrap(), "Alpha");
    }

    #[test]
    fn header_only_file_is_empty() {
        let data = b"campaign_name,budget\n";
        assert!(matches!(
            parse(data, "ads.csv"),
            Err(PipelineError::EmptyFile)
        ));
    }

    #[test]
    fn zero_byte_file_is_empty() {
        assert!(matches!(parse(b"", "ads.csv"), Err(PipelineError::EmptyFile)));
    }

    #[test]
    fn ragged_rows_fail_the_whole_parse() {
        let data = b"a,b\n1,2\n1,2,3\n";
        assert!(matches!(
            parse(data, "ads.csv"),
            Err(PipelineError::Parse(_))
        ));
    }

    #[test]
    fn empty_header_cell_is_a_parse_error() {
        let data = b"a,,c\n1,2,3\n";
        assert!(matches!(
            parse(data, "ads.csv"),
            Err(PipelineError::Parse(_))
        ));
    }

    #[test]
    fn unknown_headers_pass_through() {
        let data = b"campaign_name,mystery_column\nAlpha,42\n";
        let rows = parse(data, "ads.csv").unwrap();
        assert_eq!(rows[0].get("mystery_column").unwrap(), "42");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        assert!(matches!(
            parse(b"whatever", "ads.pdf"),
            Err(PipelineError::Parse(_))
        ));
    }

    #[test]
    fn garbage_workbook_bytes_are_a_parse_error() {
        assert!(matches!(
            parse(b"this is not a zip archive", "ads.xlsx"),
            Err(PipelineError::Parse(_))
        ));
    }

    #[test]
    fn whole_float_cells_render_without_decimal_point() {
        assert_eq!(cell_to_string(&Data::Float(1000.0)), "1000");
        assert_eq!(cell_to_string(&Data::Float(10.5)), "10.5");
    }
}
