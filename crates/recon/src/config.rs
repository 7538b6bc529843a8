use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ReconError;
use crate::rules::{default_rule_name, Rule};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub datasets: Datasets,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_name() -> String {
    "reconciliation".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Datasets {
    pub a: DatasetConfig,
    pub b: DatasetConfig,
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetConfig {
    /// Source file, relative to the config file's directory.
    pub file: String,
    /// Identifier prefix. Defaults to `A` / `B`.
    #[serde(default)]
    pub prefix: String,
    /// Field delimiter for text files. Sniffed when unset.
    #[serde(default)]
    pub delimiter: Option<char>,
    /// Worksheet to read from a workbook. First sheet when unset.
    #[serde(default)]
    pub sheet: Option<String>,
    /// Columns reduced to their ASCII digits before normalization.
    #[serde(default)]
    pub digits_only: Vec<String>,
    /// Columns rewritten as `YYYY-MM-DD`.
    #[serde(default)]
    pub dates: Vec<DateColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DateColumn {
    pub column: String,
    /// chrono format string the source values are written in.
    #[serde(default = "default_date_format")]
    pub format: String,
}

fn default_date_format() -> String {
    "%Y-%m-%d".into()
}

impl DatasetConfig {
    /// Config for a file with no pre-transforms.
    pub fn for_file(file: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            prefix: prefix.into(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown export format '{other}' (expected xlsx or csv)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default)]
    pub format: ExportFormat,
}

fn default_output_dir() -> String {
    ".".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: ExportFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let mut config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.apply_defaults();
        config.validate()?;
        Ok(config)
    }

    fn apply_defaults(&mut self) {
        for (dataset, fallback) in [(&mut self.datasets.a, "A"), (&mut self.datasets.b, "B")] {
            dataset.prefix = if dataset.prefix.trim().is_empty() {
                fallback.to_string()
            } else {
                dataset.prefix.trim().to_uppercase()
            };
        }
        for (i, rule) in self.rules.iter_mut().enumerate() {
            if rule.name.trim().is_empty() {
                rule.name = default_rule_name(i);
            }
        }
    }

    /// Checks that need no data. Column presence is checked once the
    /// datasets are loaded, see [`crate::RuleSet::build`].
    pub fn validate(&self) -> Result<(), ReconError> {
        for (side, dataset) in [("a", &self.datasets.a), ("b", &self.datasets.b)] {
            if dataset.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "datasets.{side}: file is required"
                )));
            }
            if dataset.prefix.chars().any(char::is_whitespace) {
                return Err(ReconError::ConfigValidation(format!(
                    "datasets.{side}: prefix '{}' contains whitespace",
                    dataset.prefix
                )));
            }
        }

        if self.datasets.a.prefix == self.datasets.b.prefix {
            return Err(ReconError::ConfigValidation(format!(
                "datasets a and b share the prefix '{}'",
                self.datasets.a.prefix
            )));
        }

        if self.rules.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one [[rules]] entry is required".into(),
            ));
        }

        for (i, rule) in self.rules.iter().enumerate() {
            rule.check_shape()?;
            if self.rules[..i].iter().any(|r| r.name == rule.name) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate rule name '{}'",
                    rule.name
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
