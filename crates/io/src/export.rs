//! Writes the three result tables of a reconciliation pass.

use std::path::{Path, PathBuf};

use tablematch_recon::{ExportFormat, Frame, ReconResult};

use crate::error::IoError;

pub const MATCHES_STEM: &str = "matching_records";

pub fn write_xlsx(frame: &Frame, sheet_name: &str, path: &Path) -> Result<(), IoError> {
    crate::xlsx::write_frame(frame, sheet_name, path).map_err(|message| IoError::Write {
        path: path.to_path_buf(),
        message,
    })
}

pub fn write_csv(frame: &Frame, path: &Path) -> Result<(), IoError> {
    crate::csv::write_frame(frame, path).map_err(|message| IoError::Write {
        path: path.to_path_buf(),
        message,
    })
}

/// File stem for the unmatched rows of the dataset with this prefix.
pub fn only_in_stem(prefix: &str) -> String {
    format!("only_in_{}", prefix.to_lowercase())
}

/// Write `matching_records`, `only_in_<a>` and `only_in_<b>` into `dir`,
/// creating it if needed. Returns the written paths in that order.
pub fn export_result(
    result: &ReconResult,
    dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>, IoError> {
    std::fs::create_dir_all(dir).map_err(|e| IoError::Write {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let outputs = [
        (
            MATCHES_STEM.to_string(),
            "Matching records".to_string(),
            result.matches_frame(),
        ),
        (
            only_in_stem(result.only_a.prefix()),
            format!("Only in {}", result.only_a.prefix()),
            result.only_a.to_frame(),
        ),
        (
            only_in_stem(result.only_b.prefix()),
            format!("Only in {}", result.only_b.prefix()),
            result.only_b.to_frame(),
        ),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (stem, sheet, frame) in outputs {
        let path = dir.join(format!("{stem}.{}", format.extension()));
        match format {
            ExportFormat::Xlsx => write_xlsx(&frame, &sheet, &path)?,
            ExportFormat::Csv => write_csv(&frame, &path)?,
        }
        log::info!("wrote {} rows to {}", frame.len(), path.display());
        written.push(path);
    }
    Ok(written)
}
