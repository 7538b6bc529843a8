// Delimited text import/export

use std::path::Path;

use tablematch_recon::Frame;

use crate::loader::RawSheet;

const SNIFF_CANDIDATES: [u8; 4] = [b'\t', b';', b',', b'|'];
const SNIFF_LINES: usize = 10;

/// Read a file as text. Invalid UTF-8 is decoded as Windows-1252, the usual
/// encoding of spreadsheet-exported CSVs. A leading BOM is dropped.
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            decoded.into_owned()
        }
    };
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Pick the delimiter that splits the first lines into the most consistent,
/// widest records. Falls back to comma.
pub fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = (b',', 0usize);
    for delimiter in SNIFF_CANDIDATES {
        let widths: Vec<usize> = sample
            .iter()
            .map(|line| field_count(line, delimiter))
            .collect();
        let Some(&header_width) = widths.first() else {
            break;
        };
        if header_width <= 1 {
            continue;
        }
        let consistent = widths.iter().filter(|&&w| w == header_width).count();
        let score = consistent * header_width;
        if score > best.1 {
            best = (delimiter, score);
        }
    }
    best.0
}

fn field_count(line: &str, delimiter: u8) -> usize {
    ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// Split delimited text into a header and data rows. Empty fields are
/// missing values; a record wider than the header is an error.
pub fn parse(content: &str, delimiter: u8) -> Result<RawSheet, String> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers: Vec<Option<String>> = match records.next() {
        Some(record) => record
            .map_err(|e| e.to_string())?
            .iter()
            .map(cell)
            .collect(),
        None => return Err("file is empty".into()),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(format!(
                "line {line} has {} fields but the header has {}",
                record.len(),
                headers.len()
            ));
        }
        rows.push(record.iter().map(cell).collect());
    }

    Ok(RawSheet { headers, rows })
}

fn cell(field: &str) -> Option<String> {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

/// Write a frame as comma-separated text with a header row.
pub fn write_frame(frame: &Frame, path: &Path) -> Result<(), String> {
    let mut writer = ::csv::Writer::from_path(path).map_err(|e| e.to_string())?;
    writer
        .write_record(&frame.columns)
        .map_err(|e| e.to_string())?;
    for row in &frame.rows {
        writer.write_record(row).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
