//! Scripted rules over on-disk pipelines.

use pretty_assertions::assert_eq;
use reft_driver::Session;
use reft_lint::{run_lint, LintOptions, ScriptError};
use std::fs;

const RULES: &str = r#"
fn has_label(directives) {
    directives.label.len() > 0
}

fn rule_has_label_or_cpus(m) {
    for p in m.processes {
        if !(has_label(p.directives) || p.directives.cpus.len() > 0) {
            fatal("process", p.name, "has no label or cpus directive");
        }
    }
}

fn rule_container_registry(m) {
    for p in m.processes {
        for c in p.directives.container {
            if re::is_match("^quay\\.io/", c.name) {
                error("process", p.name, "pulls from quay.io");
            } else {
                print(`${p.name}: ${c.name}`);
            }
        }
    }
}
"#;

fn pipeline() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("modules")).unwrap();
    fs::write(
        dir.path().join("modules/a.nf"),
        "process A {\n    label 'process_low'\n    container 'biocontainers/a:1.0'\n}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("modules/b.nf"),
        "process B {\n    container 'quay.io/biocontainers/b:2.0'\n}\n",
    )
    .unwrap();
    fs::write(dir.path().join("rules.rhai"), RULES).unwrap();
    dir
}

fn options(dir: &std::path::Path) -> LintOptions {
    LintOptions::default()
        .with_rules_file(dir.join("rules.rhai"))
        .with_directory(dir.join("modules"))
}

#[test]
fn test_rules_over_directory() {
    let dir = pipeline();
    let report = run_lint(&options(dir.path()), &Session::default()).unwrap();

    let a = std::path::absolute(dir.path().join("modules/a.nf")).unwrap().display().to_string();
    let b = std::path::absolute(dir.path().join("modules/b.nf")).unwrap().display().to_string();

    let registry = &report.rules["container_registry"];
    assert_eq!(registry[&a].outputs, vec!["A: biocontainers/a:1.0"]);
    assert_eq!(registry[&b].errors, vec!["process B pulls from quay.io"]);

    let labels = &report.rules["has_label_or_cpus"];
    assert!(labels[&a].errors.is_empty());
    assert_eq!(labels[&b].errors, vec!["process B has no label or cpus directive"]);

    assert_eq!(report.exit_code(), 1);
}

#[test]
fn test_single_rule() {
    let dir = pipeline();
    let report = run_lint(
        &options(dir.path()).with_rule("has_label_or_cpus"),
        &Session::default(),
    )
    .unwrap();
    assert_eq!(report.rules.len(), 1);

    let mut rendered = Vec::new();
    report.render(&mut rendered).unwrap();
    let rendered = String::from_utf8(rendered).unwrap();
    assert!(rendered.contains("Rule: has_label_or_cpus\n"));
    assert!(rendered.contains("    Error: process B has no label or cpus directive\n"));
}

#[test]
fn test_missing_rules_file() {
    let dir = pipeline();
    let options = options(dir.path()).with_rules_file(dir.path().join("nope.rhai"));
    let err = run_lint(&options, &Session::default()).unwrap_err();
    assert!(matches!(err, ScriptError::RulesNotFound(_)));
    assert!(err.to_string().starts_with("rules file not found: "));
}

#[test]
fn test_directory_errors_abort() {
    let dir = pipeline();
    fs::write(dir.path().join("modules/c.nf"), "nextflow.enable.dsl = 1\n").unwrap();
    let err = run_lint(&options(dir.path()), &Session::default()).unwrap_err();
    assert!(matches!(err, ScriptError::Driver(_)));
    assert!(err.to_string().contains("only DSL2 scripts are supported"));
}
