use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (missing dataset, duplicate rule name, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Rule lists of unequal length, or an empty side.
    #[error("rule '{rule}': {a} column(s) on dataset A but {b} on dataset B")]
    ColumnCountMismatch { rule: String, a: usize, b: usize },
    /// Rule references a column the dataset does not have.
    #[error("rule '{rule}': dataset '{dataset}' has no column '{column}'")]
    UnknownColumn {
        rule: String,
        dataset: String,
        column: String,
    },
    /// Table shape rejected at load time.
    #[error("dataset '{dataset}': {message}")]
    InvalidTable { dataset: String, message: String },
}

impl ReconError {
    pub(crate) fn table(dataset: &str, message: impl Into<String>) -> Self {
        Self::InvalidTable {
            dataset: dataset.to_string(),
            message: message.into(),
        }
    }
}
