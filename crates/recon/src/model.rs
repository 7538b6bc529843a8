use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::ReconError;

/// Column holding the identifier of the paired record in the other table.
pub const MATCHED_ID_COLUMN: &str = "MATCHED_ID";
/// Column holding the name of the rule that produced the pairing.
pub const MATCH_RULE_COLUMN: &str = "MATCH_RULE";

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Ordered, duplicate-free data columns of a table. Every column is text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl Schema {
    fn new(columns: Vec<String>) -> Result<Self, String> {
        let mut index = HashMap::with_capacity(columns.len());
        for (pos, name) in columns.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(format!("column {} has a blank header", pos + 1));
            }
            if index.insert(name.clone(), pos).is_some() {
                return Err(format!("duplicate column '{name}'"));
            }
        }
        Ok(Self { columns, index })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Records + Table
// ---------------------------------------------------------------------------

/// One row. `values` is positionally aligned with the owning table's schema;
/// `None` is a missing cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub values: Vec<Option<String>>,
    pub matched_id: Option<String>,
    pub match_rule: Option<String>,
}

/// A loaded dataset: declared schema plus rows carrying their system columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    prefix: String,
    schema: Schema,
    records: Vec<Record>,
}

impl Table {
    /// Build a table from a header row and data rows, assigning identifiers
    /// `<PREFIX>_000000`, `<PREFIX>_000001`, ... in row order.
    ///
    /// This is the one place a table's shape is checked. Short rows are padded
    /// with missing cells; rows longer than the header are rejected.
    pub fn from_rows(
        prefix: &str,
        headers: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    ) -> Result<Self, ReconError> {
        let prefix = prefix.trim().to_uppercase();
        if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
            return Err(ReconError::table(
                &prefix,
                "dataset prefix must be non-empty and contain no whitespace",
            ));
        }

        let id_column = id_column_for(&prefix);
        for reserved in [id_column.as_str(), MATCHED_ID_COLUMN, MATCH_RULE_COLUMN] {
            if headers.iter().any(|h| h == reserved) {
                return Err(ReconError::table(
                    &prefix,
                    format!("column '{reserved}' is reserved"),
                ));
            }
        }

        let schema = Schema::new(headers).map_err(|msg| ReconError::table(&prefix, msg))?;
        if schema.is_empty() {
            return Err(ReconError::table(&prefix, "no columns"));
        }

        let width = schema.len();
        let mut records = Vec::with_capacity(rows.len());
        for (i, mut values) in rows.into_iter().enumerate() {
            if values.len() > width {
                return Err(ReconError::table(
                    &prefix,
                    format!(
                        "row {} has {} values but the header has {width} columns",
                        i + 1,
                        values.len()
                    ),
                ));
            }
            values.resize(width, None);
            records.push(Record {
                id: format!("{prefix}_{i:06}"),
                values,
                matched_id: None,
                match_rule: None,
            });
        }

        Ok(Self {
            prefix,
            schema,
            records,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Name of the identifier column, `ID_<PREFIX>`.
    pub fn id_column(&self) -> String {
        id_column_for(&self.prefix)
    }

    /// Cell value by row position and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let pos = self.schema.position(column)?;
        self.records.get(row)?.values.get(pos)?.as_deref()
    }

    /// Copy of this table keeping only the records `keep` accepts, in order.
    pub(crate) fn retain_copy(&self, keep: impl Fn(&Record) -> bool) -> Table {
        Table {
            prefix: self.prefix.clone(),
            schema: self.schema.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Column names as they appear when flattened: data columns, then the
    /// identifier, matched-id and match-rule columns.
    pub fn frame_columns(&self) -> Vec<String> {
        let mut columns = self.schema.columns().to_vec();
        columns.push(self.id_column());
        columns.push(MATCHED_ID_COLUMN.to_string());
        columns.push(MATCH_RULE_COLUMN.to_string());
        columns
    }

    pub fn to_frame(&self) -> Frame {
        Frame {
            columns: self.frame_columns(),
            rows: self.records.iter().map(flatten_record).collect(),
        }
    }
}

fn id_column_for(prefix: &str) -> String {
    format!("ID_{prefix}")
}

fn flatten_record(record: &Record) -> Vec<String> {
    let mut row: Vec<String> = record
        .values
        .iter()
        .map(|v| v.clone().unwrap_or_default())
        .collect();
    row.push(record.id.clone());
    row.push(record.matched_id.clone().unwrap_or_default());
    row.push(record.match_rule.clone().unwrap_or_default());
    row
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Flattened string grid handed to presentation and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column(column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPair {
    pub rule: String,
    pub a: Record,
    pub b: Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleCount {
    pub rule: String,
    pub matched: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub rows_a: usize,
    pub rows_b: usize,
    pub matched: usize,
    pub only_a: usize,
    pub only_b: usize,
    pub per_rule: Vec<RuleCount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconResult {
    /// Pairs in dataset A's row order.
    pub matches: Vec<MatchedPair>,
    pub only_a: Table,
    pub only_b: Table,
    pub summary: ReconSummary,
}

impl ReconResult {
    /// The joined matches table: every A column followed by every B column.
    /// Names present on both sides get a `_<PREFIX>` suffix; a name that is
    /// still taken keeps getting its side's suffix until it is unique.
    pub fn matches_frame(&self) -> Frame {
        let a_columns = self.only_a.frame_columns();
        let b_columns = self.only_b.frame_columns();

        let mut taken: HashSet<String> = HashSet::new();
        let mut columns = Vec::with_capacity(a_columns.len() + b_columns.len());
        let sides = [
            (&a_columns, &b_columns, self.only_a.prefix()),
            (&b_columns, &a_columns, self.only_b.prefix()),
        ];
        for (own, other, prefix) in sides {
            for c in own {
                let mut name = if other.contains(c) {
                    format!("{c}_{prefix}")
                } else {
                    c.clone()
                };
                while !taken.insert(name.clone()) {
                    name = format!("{name}_{prefix}");
                }
                columns.push(name);
            }
        }

        let rows = self
            .matches
            .iter()
            .map(|pair| {
                let mut row = flatten_record(&pair.a);
                row.extend(flatten_record(&pair.b));
                row
            })
            .collect();

        Frame { columns, rows }
    }
}
