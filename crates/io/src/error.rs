use std::path::PathBuf;

use tablematch_recon::ReconError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    /// File missing, unreadable or not decodable.
    #[error("dataset '{dataset}': cannot read {}: {message}", .path.display())]
    Read {
        dataset: String,
        path: PathBuf,
        message: String,
    },
    /// Extension not recognized as delimited text or a workbook.
    #[error(
        "dataset '{dataset}': unsupported file type {} (expected csv, tsv, txt, xlsx, xlsm, xls, xlsb or ods)",
        .path.display()
    )]
    UnsupportedFormat { dataset: String, path: PathBuf },
    /// File read but its contents are malformed.
    #[error("dataset '{dataset}': {}: {message}", .path.display())]
    Parse {
        dataset: String,
        path: PathBuf,
        message: String,
    },
    /// Parsed rows rejected by the table model.
    #[error(transparent)]
    Table(#[from] ReconError),
    /// Export target could not be written.
    #[error("cannot write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}
