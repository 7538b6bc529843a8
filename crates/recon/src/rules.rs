use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::Schema;

/// A composite-key matching rule. Column lists pair up positionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub name: String,
    pub a_columns: Vec<String>,
    pub b_columns: Vec<String>,
}

impl Rule {
    pub fn new(name: impl Into<String>, a_columns: Vec<String>, b_columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            a_columns,
            b_columns,
        }
    }

    /// Both sides non-empty and of equal length.
    pub fn check_shape(&self) -> Result<(), ReconError> {
        if self.a_columns.is_empty()
            || self.b_columns.is_empty()
            || self.a_columns.len() != self.b_columns.len()
        {
            return Err(ReconError::ColumnCountMismatch {
                rule: self.name.clone(),
                a: self.a_columns.len(),
                b: self.b_columns.len(),
            });
        }
        Ok(())
    }

    /// Shape check plus column presence against both schemas.
    pub fn validate(&self, a: &Schema, b: &Schema) -> Result<(), ReconError> {
        self.check_shape()?;
        let sides = [("A", a, &self.a_columns), ("B", b, &self.b_columns)];
        for (dataset, schema, columns) in sides {
            if let Some(missing) = columns.iter().find(|c| !schema.contains(c.as_str())) {
                return Err(ReconError::UnknownColumn {
                    rule: self.name.clone(),
                    dataset: dataset.to_string(),
                    column: missing.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Name given to a rule added without one: `Rule <n>`, 1-based.
pub fn default_rule_name(position: usize) -> String {
    format!("Rule {}", position + 1)
}

/// Priority-ordered rules, each validated against the two schemas when added.
#[derive(Debug, Clone)]
pub struct RuleSet {
    schema_a: Schema,
    schema_b: Schema,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(schema_a: &Schema, schema_b: &Schema) -> Self {
        Self {
            schema_a: schema_a.clone(),
            schema_b: schema_b.clone(),
            rules: Vec::new(),
        }
    }

    /// Validate every rule in order; fails on the first bad one.
    pub fn build(
        rules: impl IntoIterator<Item = Rule>,
        schema_a: &Schema,
        schema_b: &Schema,
    ) -> Result<Self, ReconError> {
        let mut set = Self::new(schema_a, schema_b);
        for rule in rules {
            set.push(rule)?;
        }
        Ok(set)
    }

    /// Append at the lowest priority. A blank name becomes `Rule <n>`.
    pub fn push(&mut self, mut rule: Rule) -> Result<(), ReconError> {
        if rule.name.trim().is_empty() {
            rule.name = default_rule_name(self.rules.len());
        }
        if self.rules.iter().any(|r| r.name == rule.name) {
            return Err(ReconError::ConfigValidation(format!(
                "duplicate rule name '{}'",
                rule.name
            )));
        }
        rule.validate(&self.schema_a, &self.schema_b)?;
        self.rules.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
