//! `tablematch-recon` — two-table reconciliation by priority-ordered
//! composite-key rules.
//!
//! Pure engine crate: receives loaded tables, returns matched pairs and the
//! leftovers of each side. No file IO.

pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod model;
pub mod normalize;
pub mod rules;

pub use config::{DatasetConfig, ExportFormat, ReconConfig};
pub use engine::{apply_matching_rules, run};
pub use error::ReconError;
pub use model::{Frame, MatchedPair, ReconResult, ReconSummary, Record, Schema, Table};
pub use normalize::{normalize_for_display, normalize_for_matching};
pub use rules::{Rule, RuleSet};
