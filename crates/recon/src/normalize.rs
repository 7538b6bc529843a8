//! Value canonicalization.
//!
//! Two transforms with different jobs:
//!
//! - **display**: applied to every column of a freshly loaded table. Missing
//!   cells become empty text, values are uppercased, trimmed and runs of
//!   internal whitespace collapse to a single space.
//! - **key**: applied only to columns used by a matching rule. Values are
//!   uppercased, every whitespace character is deleted and anything that is
//!   not alphanumeric is stripped, so `"123.456-78"` and `"123 456 78"` compare
//!   equal.
//!
//! Both are idempotent and both ignore columns the table does not have.

use crate::model::Table;
use crate::rules::Rule;

/// Display form of a single value.
pub fn display_value(value: &str) -> String {
    let upper = value.to_uppercase();
    upper.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key form of a single value.
pub fn key_value(value: &str) -> String {
    value
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Display-normalize every column of `table`.
pub fn normalize_for_display(mut table: Table) -> Table {
    for record in table.records_mut() {
        for value in record.values.iter_mut() {
            *value = Some(display_value(value.as_deref().unwrap_or("")));
        }
    }
    table
}

/// Key-normalize the named columns of `table`. Unknown names are skipped.
pub fn normalize_for_matching<S: AsRef<str>>(mut table: Table, columns: &[S]) -> Table {
    let mut positions = Vec::with_capacity(columns.len());
    for column in columns {
        match table.schema().position(column.as_ref()) {
            Some(pos) if !positions.contains(&pos) => positions.push(pos),
            Some(_) => {}
            None => log::debug!(
                "dataset '{}': no column '{}', key normalization skipped",
                table.prefix(),
                column.as_ref()
            ),
        }
    }

    for record in table.records_mut() {
        for &pos in &positions {
            if let Some(value) = record.values[pos].as_mut() {
                *value = key_value(value);
            }
        }
    }
    table
}

/// Key-normalize every column any rule refers to, on both sides.
pub fn normalize_rule_columns(a: Table, b: Table, rules: &[Rule]) -> (Table, Table) {
    let a_columns: Vec<&str> = rules
        .iter()
        .flat_map(|r| r.a_columns.iter().map(String::as_str))
        .collect();
    let b_columns: Vec<&str> = rules
        .iter()
        .flat_map(|r| r.b_columns.iter().map(String::as_str))
        .collect();

    log::debug!(
        "key-normalizing {} column reference(s) on '{}' and {} on '{}'",
        a_columns.len(),
        a.prefix(),
        b_columns.len(),
        b.prefix()
    );

    (
        normalize_for_matching(a, &a_columns),
        normalize_for_matching(b, &b_columns),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[[Option<&str>; 2]]) -> Table {
        Table::from_rows(
            "A",
            vec!["NAME".into(), "DOC".into()],
            rows.iter()
                .map(|r| r.iter().map(|v| v.map(str::to_string)).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn display_collapses_and_uppercases() {
        assert_eq!(display_value("  joão   da\tsilva \n"), "JOÃO DA SILVA");
        assert_eq!(display_value(""), "");
        assert_eq!(display_value("123.456-78"), "123.456-78");
    }

    #[test]
    fn key_strips_whitespace_and_punctuation() {
        assert_eq!(key_value("123.456-78"), "12345678");
        assert_eq!(key_value("123 456 78"), "12345678");
        assert_eq!(key_value(" joão da silva "), "JOÃODASILVA");
        assert_eq!(key_value("a/b\\c_d"), "ABCD");
        assert_eq!(key_value("--"), "");
    }

    #[test]
    fn both_transforms_are_idempotent() {
        for raw in ["  Maria  José ", "123.456.789-00", "\tfoo\u{a0}bar ", "ß straße", ""] {
            let d = display_value(raw);
            assert_eq!(display_value(&d), d);
            let k = key_value(raw);
            assert_eq!(key_value(&k), k);
        }
    }

    #[test]
    fn display_fills_missing_cells() {
        let t = normalize_for_display(table(&[[Some(" ana  maria "), None]]));
        assert_eq!(t.value(0, "NAME"), Some("ANA MARIA"));
        assert_eq!(t.value(0, "DOC"), Some(""));
    }

    #[test]
    fn matching_touches_only_named_columns() {
        let t = normalize_for_matching(table(&[[Some("Ana Maria"), Some("1.2-3")]]), &["DOC"]);
        assert_eq!(t.value(0, "NAME"), Some("Ana Maria"));
        assert_eq!(t.value(0, "DOC"), Some("123"));
    }

    #[test]
    fn absent_columns_are_a_no_op() {
        let before = table(&[[Some("x"), Some("y")]]);
        let after = normalize_for_matching(before.clone(), &["MISSING"]);
        assert_eq!(before, after);
        let after = normalize_for_matching(before.clone(), &Vec::<String>::new());
        assert_eq!(before, after);
    }

    #[test]
    fn rule_columns_are_normalized_on_both_sides() {
        let a = table(&[[Some("ana maria"), Some("1.2")]]);
        let b = Table::from_rows(
            "B",
            vec!["nome".into()],
            vec![vec![Some("Ana-Maria".to_string())]],
        )
        .unwrap();
        let rules = vec![Rule::new("R1", vec!["NAME".into()], vec!["nome".into()])];
        let (a, b) = normalize_rule_columns(a, b, &rules);
        assert_eq!(a.value(0, "NAME"), Some("ANAMARIA"));
        assert_eq!(a.value(0, "DOC"), Some("1.2"));
        assert_eq!(b.value(0, "nome"), Some("ANAMARIA"));
    }
}
