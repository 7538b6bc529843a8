// Excel-family import (xlsx, xlsm, xls, xlsb, ods) and xlsx export

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use rust_xlsxwriter::{Format, Workbook};

use tablematch_recon::Frame;

use crate::loader::RawSheet;

/// Excel's maximum worksheet name length.
const MAX_SHEET_NAME: usize = 31;

/// Read one worksheet: the named one, or the first. The first non-empty row
/// is the header.
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<RawSheet, String> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| {
                format!(
                    "no sheet named '{wanted}' (available: {})",
                    sheet_names.join(", ")
                )
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| "Excel file contains no sheets".to_string())?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", name, e))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(Option::is_some));

    let headers = rows
        .next()
        .ok_or_else(|| format!("sheet '{name}' is empty"))?;
    let width = headers.len();

    // calamine ranges are rectangular; trailing blanks past the header are noise
    let rows = rows
        .map(|mut row| {
            while row.len() > width && row.last().is_some_and(Option::is_none) {
                row.pop();
            }
            row
        })
        .collect();

    Ok(RawSheet { headers, rows })
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            if s.is_empty() {
                None
            } else {
                Some(s.clone())
            }
        }
        Data::Float(n) => {
            // integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{}", n))
            }
        }
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Some(format!("#{:?}", e)),
        Data::DateTime(dt) => Some(serial_to_text(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Excel serial (1900 system) to `YYYY-MM-DD`, with ` HH:MM:SS` when the
/// serial carries a time of day.
fn serial_to_text(serial: f64) -> String {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
    // round once on the whole serial so a time of 23:59:59.6 rolls over
    let total = (serial * 86_400.0).round() as i64;
    let days = total.div_euclid(86_400);
    let seconds = total.rem_euclid(86_400);
    let Some(date) = epoch.checked_add_signed(Duration::days(days)) else {
        return serial.to_string();
    };
    if seconds == 0 {
        date.format("%Y-%m-%d").to_string()
    } else {
        let datetime = date.and_hms_opt(0, 0, 0).unwrap_or_default() + Duration::seconds(seconds);
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Make `name` acceptable as a worksheet name.
pub fn sheet_title(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    let cleaned = cleaned.trim_matches('\'').to_string();
    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

/// Write a frame as a single-sheet workbook: bold frozen header, every cell
/// as text.
pub fn write_frame(frame: &Frame, sheet_name: &str, path: &Path) -> Result<(), String> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook
        .add_worksheet()
        .set_name(sheet_title(sheet_name))
        .map_err(|e| format!("Failed to create sheet '{}': {}", sheet_name, e))?;

    for (col, name) in frame.columns.iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| "too many columns for xlsx".to_string())?;
        worksheet
            .write_string_with_format(0, col, name, &header)
            .map_err(|e| format!("Failed to write header: {}", e))?;
    }

    for (row_idx, row) in frame.rows.iter().enumerate() {
        let row32 = u32::try_from(row_idx + 1).map_err(|_| "too many rows for xlsx".to_string())?;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let col16 = u16::try_from(col).map_err(|_| "too many columns for xlsx".to_string())?;
            worksheet
                .write_string(row32, col16, value)
                .map_err(|e| format!("Failed to write row {}: {}", row_idx + 1, e))?;
        }
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("Failed to freeze header: {}", e))?;
    worksheet.autofit();

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    Ok(())
}
