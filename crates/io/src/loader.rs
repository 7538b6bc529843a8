//! Dataset loading: file → raw grid → pre-transforms → [`Table`] in display
//! form.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use tablematch_recon::config::{DateColumn, Datasets};
use tablematch_recon::model::{MATCHED_ID_COLUMN, MATCH_RULE_COLUMN};
use tablematch_recon::{normalize_for_display, DatasetConfig, Table};

use crate::error::IoError;

/// A sheet as read from disk, before any validation. `None` is an empty cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub headers: Vec<Option<String>>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Workbook,
}

impl SourceFormat {
    /// Detect by extension, case-insensitive.
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(SourceFormat::Delimited),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(SourceFormat::Workbook),
            _ => None,
        }
    }
}

/// Dates written back in this form.
const ISO_DATE: &str = "%Y-%m-%d";

/// Load one dataset and return it display-normalized, identifiers assigned.
///
/// `default_prefix` names the dataset when `config.prefix` is blank.
pub fn load_dataset(
    path: &Path,
    config: &DatasetConfig,
    default_prefix: &str,
) -> Result<Table, IoError> {
    let dataset = dataset_label(config, default_prefix);
    let (headers, mut rows) = read_columns(path, config, &dataset)?;

    for column in &config.digits_only {
        match headers.iter().position(|h| h == column) {
            Some(col) => keep_digits(&mut rows, col),
            None => log::debug!("{dataset}: digits_only column '{column}' not present"),
        }
    }
    for date in &config.dates {
        match headers.iter().position(|h| h == &date.column) {
            Some(col) => {
                let failed = rewrite_dates(&mut rows, col, date);
                if failed > 0 {
                    log::warn!(
                        "{dataset}: {failed} value(s) in '{}' do not match '{}' and were cleared",
                        date.column,
                        date.format
                    );
                }
            }
            None => log::debug!("{dataset}: date column '{}' not present", date.column),
        }
    }

    let table = Table::from_rows(&dataset, headers, rows)?;
    let table = normalize_for_display(table);
    log::info!(
        "loaded dataset {} from {}: {} rows, {} columns",
        table.prefix(),
        path.display(),
        table.len(),
        table.schema().len()
    );
    Ok(table)
}

/// Load both datasets, resolving their files against `base_dir`. Each side
/// is loaded independently so both failures can be reported.
pub fn load_pair(
    base_dir: &Path,
    datasets: &Datasets,
) -> (Result<Table, IoError>, Result<Table, IoError>) {
    let a = load_dataset(&resolve(base_dir, &datasets.a.file), &datasets.a, "A");
    let b = load_dataset(&resolve(base_dir, &datasets.b.file), &datasets.b, "B");
    (a, b)
}

pub fn resolve(base_dir: &Path, file: &str) -> PathBuf {
    let file = Path::new(file);
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base_dir.join(file)
    }
}

/// Column names of a dataset, as they will appear in the loaded table.
pub fn read_headers(
    path: &Path,
    config: &DatasetConfig,
    default_prefix: &str,
) -> Result<Vec<String>, IoError> {
    let dataset = dataset_label(config, default_prefix);
    let (headers, _) = read_columns(path, config, &dataset)?;
    Ok(headers)
}

fn dataset_label(config: &DatasetConfig, default_prefix: &str) -> String {
    let prefix = match config.prefix.trim() {
        "" => default_prefix.trim(),
        p => p,
    };
    prefix.to_uppercase()
}

/// Named headers and rows, minus the columns the table model assigns itself.
fn read_columns(
    path: &Path,
    config: &DatasetConfig,
    dataset: &str,
) -> Result<(Vec<String>, Vec<Vec<Option<String>>>), IoError> {
    let raw = read_raw(path, config, dataset)?;
    let headers = header_names(raw.headers);
    Ok(drop_system_columns(dataset, headers, raw.rows))
}

/// A file exported by an earlier run carries `ID_<PREFIX>`, `MATCHED_ID` and
/// `MATCH_RULE`. Those are dropped so identifiers and match state start fresh.
fn drop_system_columns(
    dataset: &str,
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
) -> (Vec<String>, Vec<Vec<Option<String>>>) {
    let id_column = format!("ID_{dataset}");
    let system = [id_column.as_str(), MATCHED_ID_COLUMN, MATCH_RULE_COLUMN];
    let dropped: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| system.contains(&h.as_str()))
        .map(|(i, _)| i)
        .collect();
    if dropped.is_empty() {
        return (headers, rows);
    }

    log::warn!(
        "{dataset}: ignoring column(s) {} from a previous run",
        dropped
            .iter()
            .map(|&i| headers[i].as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let keep = |i: &usize| !dropped.contains(i);
    let headers = headers
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep(i))
        .map(|(_, h)| h)
        .collect();
    let rows = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .filter(|(i, _)| keep(i))
                .map(|(_, v)| v)
                .collect()
        })
        .collect();
    (headers, rows)
}

fn read_raw(path: &Path, config: &DatasetConfig, dataset: &str) -> Result<RawSheet, IoError> {
    let dataset = dataset.to_string();
    let format = SourceFormat::detect(path).ok_or_else(|| IoError::UnsupportedFormat {
        dataset: dataset.clone(),
        path: path.to_path_buf(),
    })?;

    if !path.exists() {
        return Err(IoError::Read {
            dataset,
            path: path.to_path_buf(),
            message: "file not found".into(),
        });
    }

    match format {
        SourceFormat::Delimited => {
            let content = crate::csv::read_file_as_utf8(path).map_err(|message| IoError::Read {
                dataset: dataset.clone(),
                path: path.to_path_buf(),
                message,
            })?;
            let delimiter = match config.delimiter {
                Some(c) if c.is_ascii() => c as u8,
                Some(c) => {
                    return Err(IoError::Parse {
                        dataset,
                        path: path.to_path_buf(),
                        message: format!("delimiter '{c}' is not a single-byte character"),
                    })
                }
                None => {
                    let sniffed = crate::csv::sniff_delimiter(&content);
                    log::debug!(
                        "{dataset}: sniffed delimiter {:?} for {}",
                        sniffed as char,
                        path.display()
                    );
                    sniffed
                }
            };
            crate::csv::parse(&content, delimiter).map_err(|message| IoError::Parse {
                dataset,
                path: path.to_path_buf(),
                message,
            })
        }
        SourceFormat::Workbook => crate::xlsx::read_sheet(path, config.sheet.as_deref())
            .map_err(|message| IoError::Parse {
                dataset,
                path: path.to_path_buf(),
                message,
            }),
    }
}

/// Blank headers become `Unnamed: <n>`; repeated ones get `.1`, `.2`, ...
fn header_names(raw: Vec<Option<String>>) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for (i, header) in raw.into_iter().enumerate() {
        let base = match header.as_deref().map(str::trim) {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => format!("Unnamed: {i}"),
        };
        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = format!("{base}.{n}");
            n += 1;
        }
        names.push(name);
    }
    names
}

fn keep_digits(rows: &mut [Vec<Option<String>>], col: usize) {
    for row in rows.iter_mut() {
        if let Some(cell) = row.get_mut(col) {
            *cell = cell
                .as_deref()
                .map(|v| v.chars().filter(char::is_ascii_digit).collect::<String>())
                .filter(|v| !v.is_empty());
        }
    }
}

/// Rewrite one column as ISO dates. Returns how many non-empty values could
/// not be parsed.
fn rewrite_dates(rows: &mut [Vec<Option<String>>], col: usize, date: &DateColumn) -> usize {
    let mut failed = 0;
    for row in rows.iter_mut() {
        let Some(cell) = row.get_mut(col) else {
            continue;
        };
        let Some(value) = cell.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
            *cell = None;
            continue;
        };
        match parse_date(value, &date.format) {
            Some(d) => *cell = Some(d.format(ISO_DATE).to_string()),
            None => {
                failed += 1;
                *cell = None;
            }
        }
    }
    failed
}

/// Parse with the configured format, then the ISO forms workbook cells are
/// read as.
fn parse_date(value: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, format)
        .or_else(|_| NaiveDateTime::parse_from_str(value, format).map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(value, ISO_DATE))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .ok()
}
