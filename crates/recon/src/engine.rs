use std::collections::{HashMap, HashSet, VecDeque};

use crate::evidence::compute_summary;
use crate::model::{MatchedPair, ReconResult, Record, Schema, Table};
use crate::normalize::normalize_rule_columns;
use crate::rules::{Rule, RuleSet};

/// Separator between the fields of a composite key.
pub const KEY_DELIMITER: char = '|';

/// Identifiers paired so far in one pass. Lives only as long as the call.
#[derive(Debug, Default)]
struct MatchState {
    matched_a: HashSet<String>,
    matched_b: HashSet<String>,
}

/// Key-normalize the rule columns of both tables, then match.
pub fn run(table_a: &Table, table_b: &Table, rules: &RuleSet) -> ReconResult {
    let (a, b) = normalize_rule_columns(table_a.clone(), table_b.clone(), rules.rules());
    apply_matching_rules(&a, &b, rules.rules())
}

/// Apply `rules` in priority order and partition both tables into matched
/// pairs and leftovers.
///
/// Rule columns must already be key-normalized and every rule must have
/// passed validation. The inputs are not modified.
pub fn apply_matching_rules(table_a: &Table, table_b: &Table, rules: &[Rule]) -> ReconResult {
    let mut work_a = table_a.clone();
    let mut work_b = table_b.clone();
    let mut state = MatchState::default();

    for rule in rules {
        let paired = apply_rule(&mut work_a, &mut work_b, rule, &mut state);
        log::debug!(
            "rule '{}': {} pair(s), {} unmatched in {}, {} unmatched in {}",
            rule.name,
            paired,
            work_a.len() - state.matched_a.len(),
            work_a.prefix(),
            work_b.len() - state.matched_b.len(),
            work_b.prefix(),
        );
    }

    let result = prepare_results(&work_a, &work_b, &state, rules);
    log::info!(
        "reconciled {} x {} rows with {} rule(s): {} matched, {} only in {}, {} only in {}",
        work_a.len(),
        work_b.len(),
        rules.len(),
        result.summary.matched,
        result.summary.only_a,
        work_a.prefix(),
        result.summary.only_b,
        work_b.prefix(),
    );
    result
}

/// One rule over the rows still unmatched on both sides. Returns the number
/// of pairs it produced.
fn apply_rule(a: &mut Table, b: &mut Table, rule: &Rule, state: &mut MatchState) -> usize {
    let a_positions = positions(a.schema(), &rule.a_columns);
    let b_positions = positions(b.schema(), &rule.b_columns);

    // Unmatched B rows by key; each queue holds row positions in original order,
    // so the front is always the first eligible row for that key.
    let mut candidates: HashMap<String, VecDeque<usize>> = HashMap::new();
    for (i, record) in b.records().iter().enumerate() {
        if state.matched_b.contains(&record.id) {
            continue;
        }
        candidates
            .entry(composite_key(record, &b_positions))
            .or_default()
            .push_back(i);
    }

    let b_records = b.records_mut();
    let mut paired = 0;

    for a_record in a.records_mut().iter_mut() {
        if state.matched_a.contains(&a_record.id) {
            continue;
        }
        let key = composite_key(a_record, &a_positions);
        let Some(bi) = candidates.get_mut(&key).and_then(VecDeque::pop_front) else {
            continue;
        };

        let b_record = &mut b_records[bi];
        a_record.matched_id = Some(b_record.id.clone());
        a_record.match_rule = Some(rule.name.clone());
        b_record.matched_id = Some(a_record.id.clone());
        b_record.match_rule = Some(rule.name.clone());
        state.matched_a.insert(a_record.id.clone());
        state.matched_b.insert(b_record.id.clone());
        paired += 1;
    }

    paired
}

fn positions(schema: &Schema, columns: &[String]) -> Vec<Option<usize>> {
    columns.iter().map(|c| schema.position(c)).collect()
}

/// Values at `positions` joined with [`KEY_DELIMITER`]. Missing cells count
/// as empty text.
fn composite_key(record: &Record, positions: &[Option<usize>]) -> String {
    let mut key = String::new();
    for (i, pos) in positions.iter().enumerate() {
        if i > 0 {
            key.push(KEY_DELIMITER);
        }
        if let Some(value) = pos.and_then(|p| record.values.get(p)).and_then(|v| v.as_deref()) {
            key.push_str(value);
        }
    }
    key
}

fn prepare_results(a: &Table, b: &Table, state: &MatchState, rules: &[Rule]) -> ReconResult {
    let only_a = a.retain_copy(|r| !state.matched_a.contains(&r.id));
    let only_b = b.retain_copy(|r| !state.matched_b.contains(&r.id));

    let b_by_id: HashMap<&str, &Record> = b
        .records()
        .iter()
        .filter(|r| state.matched_b.contains(&r.id))
        .map(|r| (r.id.as_str(), r))
        .collect();

    let matches: Vec<MatchedPair> = a
        .records()
        .iter()
        .filter(|r| state.matched_a.contains(&r.id))
        .filter_map(|ra| {
            let rb = b_by_id.get(ra.matched_id.as_deref()?)?;
            Some(MatchedPair {
                rule: ra.match_rule.clone().unwrap_or_default(),
                a: ra.clone(),
                b: (*rb).clone(),
            })
        })
        .collect();

    let summary = compute_summary(a.len(), b.len(), &matches, &only_a, &only_b, rules);

    ReconResult {
        matches,
        only_a,
        only_b,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_for_matching;

    fn table(prefix: &str, headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_rows(
            prefix,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| Some(v.to_string())).collect())
                .collect(),
        )
        .unwrap()
    }

    fn rule(name: &str, a: &[&str], b: &[&str]) -> Rule {
        Rule::new(
            name,
            a.iter().map(|c| c.to_string()).collect(),
            b.iter().map(|c| c.to_string()).collect(),
        )
    }

    fn ids(t: &Table) -> Vec<&str> {
        t.records().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn single_rule_scenario() {
        let a = table("A", &["NAME", "DOC"], &[&["JOAO", "111"], &["MARIA", "222"]]);
        let b = table("B", &["NAME", "DOC"], &[&["JOAO", "111"], &["PEDRO", "333"]]);
        let out = apply_matching_rules(&a, &b, &[rule("R1", &["NAME", "DOC"], &["NAME", "DOC"])]);

        assert_eq!(out.matches.len(), 1);
        let pair = &out.matches[0];
        assert_eq!(pair.a.id, "A_000000");
        assert_eq!(pair.b.id, "B_000000");
        assert_eq!(pair.rule, "R1");
        assert_eq!(pair.a.matched_id.as_deref(), Some("B_000000"));
        assert_eq!(pair.b.matched_id.as_deref(), Some("A_000000"));
        assert_eq!(pair.b.match_rule.as_deref(), Some("R1"));
        assert_eq!(ids(&out.only_a), vec!["A_000001"]);
        assert_eq!(ids(&out.only_b), vec!["B_000001"]);
        assert_eq!(out.only_a.value(0, "NAME"), Some("MARIA"));
        assert_eq!(out.only_b.value(0, "NAME"), Some("PEDRO"));
    }

    #[test]
    fn first_unmatched_b_row_wins_ties() {
        let a = table("A", &["K"], &[&["X"], &["X"], &["X"]]);
        let b = table("B", &["K"], &[&["Y"], &["X"], &["X"]]);
        let out = apply_matching_rules(&a, &b, &[rule("R", &["K"], &["K"])]);

        let pairs: Vec<_> = out
            .matches
            .iter()
            .map(|p| (p.a.id.as_str(), p.b.id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A_000000", "B_000001"), ("A_000001", "B_000002")]);
        assert_eq!(ids(&out.only_a), vec!["A_000002"]);
        assert_eq!(ids(&out.only_b), vec!["B_000000"]);
    }

    #[test]
    fn earlier_rule_takes_precedence() {
        let a = table("A", &["DOC", "NAME"], &[&["1", "ANA"], &["2", "ANA"]]);
        let b = table("B", &["DOC", "NAME"], &[&["1", "ANA"], &["9", "ANA"]]);
        let rules = [
            rule("BY_DOC", &["DOC"], &["DOC"]),
            rule("BY_NAME", &["NAME"], &["NAME"]),
        ];
        let out = apply_matching_rules(&a, &b, &rules);

        assert_eq!(out.matches.len(), 2);
        assert_eq!(out.matches[0].rule, "BY_DOC");
        assert_eq!(out.matches[0].b.id, "B_000000");
        // B_000000 already consumed, so the name rule falls through to B_000001.
        assert_eq!(out.matches[1].rule, "BY_NAME");
        assert_eq!(out.matches[1].a.id, "A_000001");
        assert_eq!(out.matches[1].b.id, "B_000001");
        assert_eq!(out.summary.per_rule[0].matched, 1);
        assert_eq!(out.summary.per_rule[1].matched, 1);
    }

    #[test]
    fn zero_rules_leave_tables_untouched() {
        let a = table("A", &["K"], &[&["1"], &["2"]]);
        let b = table("B", &["K"], &[&["1"]]);
        let out = apply_matching_rules(&a, &b, &[]);
        assert!(out.matches.is_empty());
        assert_eq!(out.only_a, a);
        assert_eq!(out.only_b, b);
    }

    #[test]
    fn inputs_are_not_mutated() {
        let a = table("A", &["K"], &[&["1"]]);
        let b = table("B", &["K"], &[&["1"]]);
        let (a_before, b_before) = (a.clone(), b.clone());
        let out = apply_matching_rules(&a, &b, &[rule("R", &["K"], &["K"])]);
        assert_eq!(out.matches.len(), 1);
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn composite_key_respects_column_order() {
        let a = table("A", &["X", "Y"], &[&["1", "2"]]);
        let b = table("B", &["P", "Q"], &[&["2", "1"]]);
        let out = apply_matching_rules(&a, &b, &[rule("R", &["X", "Y"], &["P", "Q"])]);
        assert!(out.matches.is_empty());
        let out = apply_matching_rules(&a, &b, &[rule("R", &["X", "Y"], &["Q", "P"])]);
        assert_eq!(out.matches.len(), 1);
    }

    #[test]
    fn run_normalizes_rule_columns_first() {
        let a = table("A", &["CPF"], &[&["123.456.789-00"]]);
        let b = table("B", &["cpfusu"], &[&["123 456 789 00"]]);
        let rules = RuleSet::build([rule("CPF", &["CPF"], &["cpfusu"])], a.schema(), b.schema())
            .unwrap();
        let out = run(&a, &b, &rules);
        assert_eq!(out.matches.len(), 1);
        assert_eq!(out.matches[0].a.values[0].as_deref(), Some("12345678900"));
        // caller's tables keep their raw values
        assert_eq!(a.value(0, "CPF"), Some("123.456.789-00"));
    }

    #[test]
    fn unnormalized_keys_do_not_match() {
        let a = table("A", &["K"], &[&["a-1"]]);
        let b = table("B", &["K"], &[&["A1"]]);
        let r = [rule("R", &["K"], &["K"])];
        assert!(apply_matching_rules(&a, &b, &r).matches.is_empty());
        let a = normalize_for_matching(a, &["K"]);
        assert_eq!(apply_matching_rules(&a, &b, &r).matches.len(), 1);
    }

    #[test]
    fn matches_frame_suffixes_shared_columns() {
        let a = table("A", &["NAME", "DOC"], &[&["JOAO", "111"]]);
        let b = table("B", &["NAME", "CPF"], &[&["JOAO", "111"]]);
        let out = apply_matching_rules(&a, &b, &[rule("R1", &["NAME"], &["NAME"])]);
        let frame = out.matches_frame();
        assert_eq!(
            frame.columns,
            vec![
                "NAME_A", "DOC", "ID_A", "MATCHED_ID_A", "MATCH_RULE_A",
                "NAME_B", "CPF", "ID_B", "MATCHED_ID_B", "MATCH_RULE_B",
            ]
        );
        assert_eq!(frame.cell(0, "MATCHED_ID_A"), Some("B_000000"));
        assert_eq!(frame.cell(0, "MATCHED_ID_B"), Some("A_000000"));
        assert_eq!(frame.cell(0, "MATCH_RULE_B"), Some("R1"));
    }

    #[test]
    fn matches_frame_suffix_never_clashes_with_existing_column() {
        let a = table("A", &["NAME", "NAME_B"], &[&["JOAO", "X"]]);
        let b = table("B", &["NAME"], &[&["JOAO"]]);
        let out = apply_matching_rules(&a, &b, &[rule("R1", &["NAME"], &["NAME"])]);
        let frame = out.matches_frame();
        assert_eq!(
            frame.columns,
            vec![
                "NAME_A", "NAME_B", "ID_A", "MATCHED_ID_A", "MATCH_RULE_A",
                "NAME_B_B", "ID_B", "MATCHED_ID_B", "MATCH_RULE_B",
            ]
        );
        assert_eq!(frame.cell(0, "NAME_B"), Some("X"));
        assert_eq!(frame.cell(0, "NAME_B_B"), Some("JOAO"));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let a = table("A", &["K"], &[&["1"], &["1"], &["2"]]);
        let b = table("B", &["K"], &[&["2"], &["1"], &["1"]]);
        let r = [rule("R", &["K"], &["K"])];
        let first = apply_matching_rules(&a, &b, &r);
        for _ in 0..5 {
            assert_eq!(apply_matching_rules(&a, &b, &r), first);
        }
    }
}
