use std::collections::HashMap;

use crate::model::{MatchedPair, ReconSummary, RuleCount, Table};
use crate::rules::Rule;

/// Row counts for one pass. `per_rule` follows rule order and lists rules
/// that produced nothing.
pub fn compute_summary(
    rows_a: usize,
    rows_b: usize,
    matches: &[MatchedPair],
    only_a: &Table,
    only_b: &Table,
    rules: &[Rule],
) -> ReconSummary {
    let mut by_rule: HashMap<&str, usize> = HashMap::new();
    for pair in matches {
        *by_rule.entry(pair.rule.as_str()).or_insert(0) += 1;
    }

    let per_rule = rules
        .iter()
        .map(|r| RuleCount {
            rule: r.name.clone(),
            matched: by_rule.get(r.name.as_str()).copied().unwrap_or(0),
        })
        .collect();

    ReconSummary {
        rows_a,
        rows_b,
        matched: matches.len(),
        only_a: only_a.len(),
        only_b: only_b.len(),
        per_rule,
    }
}
