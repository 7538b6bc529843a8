use tablematch_recon::normalize::normalize_for_display;
use tablematch_recon::{run, ReconConfig, RuleSet, Table};

fn table(prefix: &str, headers: &[&str], rows: &[&[&str]]) -> Table {
    let table = Table::from_rows(
        prefix,
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|r| r.iter().map(|v| Some(v.to_string())).collect())
            .collect(),
    )
    .unwrap();
    normalize_for_display(table)
}

const CONFIG: &str = r#"
name = "Beneficiaries vs payroll"

[datasets.a]
file = "a.csv"

[datasets.b]
file = "b.csv"

[[rules]]
name = "CPF e NOME"
a_columns = ["CPF", "NOME"]
b_columns = ["cpfusu", "nome"]

[[rules]]
name = "NOME e NASCIMENTO"
a_columns = ["NOME", "NASCIMENTO"]
b_columns = ["nome", "dt_nasc"]

[[rules]]
a_columns = ["CPF"]
b_columns = ["cpfusu"]
"#;

fn datasets() -> (Table, Table) {
    let a = table(
        "A",
        &["CPF", "NOME", "NASCIMENTO"],
        &[
            &["123.456.789-00", "João  da Silva", "1980-01-02"],
            &["987.654.321-00", "maria souza", "1975-05-06"],
            &["111.222.333-44", "Pedro Lima", "1990-09-09"],
            &["555.666.777-88", "Ana Paula", "2000-12-31"],
        ],
    );
    let b = table(
        "B",
        &["cpfusu", "nome", "dt_nasc"],
        &[
            &["12345678900", "JOAO DA SILVA", "1980-01-02"],
            &["00000000000", "Maria Souza", "1975-05-06"],
            &["11122233344", "P. Lima", "1990-09-09"],
            &["99999999999", "Carlos", "1970-01-01"],
        ],
    );
    (a, b)
}

#[test]
fn config_rules_run_in_priority_order() {
    let config = ReconConfig::from_toml(CONFIG).unwrap();
    let (a, b) = datasets();
    let rules = RuleSet::build(config.rules.clone(), a.schema(), b.schema()).unwrap();
    let result = run(&a, &b, &rules);

    let pairs: Vec<_> = result
        .matches
        .iter()
        .map(|p| (p.a.id.as_str(), p.b.id.as_str(), p.rule.as_str()))
        .collect();
    // "JOÃO" keeps its accent, so the name differs from "JOAO" and only the
    // CPF-only rule pairs that row.
    assert_eq!(
        pairs,
        vec![
            ("A_000000", "B_000000", "Rule 3"),
            ("A_000001", "B_000001", "NOME e NASCIMENTO"),
            ("A_000002", "B_000002", "Rule 3"),
        ]
    );

    assert_eq!(result.only_a.len(), 1);
    assert_eq!(result.only_a.records()[0].id, "A_000003");
    assert_eq!(result.only_b.len(), 1);
    assert_eq!(result.only_b.records()[0].id, "B_000003");

    let s = &result.summary;
    assert_eq!((s.rows_a, s.rows_b, s.matched, s.only_a, s.only_b), (4, 4, 3, 1, 1));
    let per_rule: Vec<_> = s.per_rule.iter().map(|c| c.matched).collect();
    assert_eq!(per_rule, vec![0, 1, 2]);
}

#[test]
fn unmatched_rows_show_display_form() {
    let config = ReconConfig::from_toml(CONFIG).unwrap();
    let (a, b) = datasets();
    let rules = RuleSet::build(config.rules, a.schema(), b.schema()).unwrap();
    let result = run(&a, &b, &rules);

    let frame = result.only_b.to_frame();
    // rule columns carry their key form, others their display form
    assert_eq!(frame.cell(0, "nome"), Some("CARLOS"));
    assert_eq!(frame.cell(0, "dt_nasc"), Some("19700101"));
    assert_eq!(frame.cell(0, "ID_B"), Some("B_000003"));
    assert_eq!(frame.cell(0, "MATCHED_ID"), Some(""));

    let matches = result.matches_frame();
    assert_eq!(matches.len(), 3);
    assert_eq!(matches.cell(1, "MATCH_RULE_A"), Some("NOME e NASCIMENTO"));
    assert_eq!(matches.cell(1, "ID_B"), Some("B_000001"));
}

#[test]
fn rules_referencing_unknown_columns_are_rejected_before_running() {
    let config = ReconConfig::from_toml(&CONFIG.replace("\"dt_nasc\"", "\"birth\"")).unwrap();
    let (a, b) = datasets();
    let err = RuleSet::build(config.rules, a.schema(), b.schema()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "rule 'NOME e NASCIMENTO': dataset 'B' has no column 'birth'"
    );
}

#[test]
fn same_tables_can_be_reconciled_again_with_other_rules() {
    let config = ReconConfig::from_toml(CONFIG).unwrap();
    let (a, b) = datasets();

    let all = RuleSet::build(config.rules.clone(), a.schema(), b.schema()).unwrap();
    let first = run(&a, &b, &all);

    let last_only = RuleSet::build(config.rules[2..].to_vec(), a.schema(), b.schema()).unwrap();
    let second = run(&a, &b, &last_only);

    assert_eq!(first.summary.matched, 3);
    assert_eq!(second.summary.matched, 2);
    assert!(second.matches.iter().all(|p| p.rule == "Rule 3"));
}

#[test]
fn summary_serializes_for_reporting() {
    let config = ReconConfig::from_toml(CONFIG).unwrap();
    let (a, b) = datasets();
    let rules = RuleSet::build(config.rules, a.schema(), b.schema()).unwrap();
    let result = run(&a, &b, &rules);

    let json = serde_json::to_value(&result.summary).unwrap();
    assert_eq!(json["matched"], 3);
    assert_eq!(json["only_a"], 1);
    assert_eq!(json["per_rule"][1]["rule"], "NOME e NASCIMENTO");
}
