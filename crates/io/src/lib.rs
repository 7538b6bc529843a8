//! `tablematch-io` — dataset loading and result export.
//!
//! Reads delimited text and Excel-family workbooks into [`tablematch_recon::Table`]s
//! and writes result frames back out as xlsx or csv.

pub mod csv;
pub mod error;
pub mod export;
pub mod loader;
pub mod xlsx;

pub use error::IoError;
pub use export::{export_result, write_csv, write_xlsx};
pub use loader::{load_dataset, load_pair, read_headers, RawSheet, SourceFormat};
