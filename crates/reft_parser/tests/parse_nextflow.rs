//! Integration tests for parsing whole Nextflow files.

use pretty_assertions::assert_eq;
use reft_ast::{ExprKind, Item, MethodCall, SourceFile, Stmt};
use reft_lexer::{Lexer, TokenKind};
use reft_parser::parse_source;

const FASTQC: &str = r#"process FASTQC {
    tag "$meta.id"
    label 'process_medium'

    conda "${moduleDir}/environment.yml"
    container "${ workflow.containerEngine == 'singularity' && !task.ext.singularity_pull_docker_container ?
        'https://depot.galaxyproject.org/singularity/fastqc:0.12.1--hdfd78af_0' :
        'biocontainers/fastqc:0.12.1--hdfd78af_0' }"

    input:
    tuple val(meta), path(reads)

    output:
    tuple val(meta), path("*.html"), emit: html
    tuple val(meta), path("*.zip") , emit: zip
    path  "versions.yml"           , emit: versions

    when:
    task.ext.when == null || task.ext.when

    script:
    def args = task.ext.args ?: ''
    def prefix = task.ext.prefix ?: "${meta.id}"
    """
    fastqc $args --threads $task.cpus ${prefix}.fastq.gz

    cat <<-END_VERSIONS > versions.yml
    "${task.process}":
        fastqc: \$( fastqc --version | sed '/FastQC v/!d; s/.*v//' )
    END_VERSIONS
    """

    stub:
    """
    touch ${prefix}.html
    """
}
"#;

const CONFIG: &str = r#"params {
    outdir = 'results'
    max_cpus = 16
}

process {
    cpus   = { 1 * task.attempt }
    memory = { 6.GB * task.attempt }

    withLabel:process_high {
        cpus   = { 12 * task.attempt }
        memory = 72.GB
    }
    withName: 'FASTQC' {
        ext.args = '--quiet'
    }
}

profiles {
    docker {
        docker.enabled = true
    }
}
"#;

fn top_call(stmt: &Stmt) -> &MethodCall {
    stmt.as_expr()
        .and_then(|expr| expr.as_method_call())
        .expect("top-level method call")
}

fn statements(file: &SourceFile) -> Vec<&Stmt> {
    file.statements().collect()
}

#[test]
fn test_nf_core_module_parses() {
    let file = parse_source(FASTQC).unwrap();
    let stmts = statements(&file);
    assert_eq!(stmts.len(), 1);

    let process = top_call(stmts[0]);
    assert_eq!(process.method, "process");
    let name = process.args()[0].as_method_call().expect("process name call");
    assert_eq!(name.method, "FASTQC");

    let closure = name.closure_arg().expect("process body");
    let ExprKind::Closure { body, .. } = &closure.kind else {
        unreachable!();
    };
    let labels: Vec<&str> = body
        .block_stmts()
        .iter()
        .flat_map(|stmt| stmt.labels.iter().map(String::as_str))
        .collect();
    assert_eq!(labels, vec!["input", "output", "when", "script", "stub"]);
}

#[test]
fn test_spans_agree_with_tokens() {
    let source = "\n\n  process FOO {\n    cpus 2\n  }\n";
    let tokens = Lexer::new(source).tokenize().unwrap();
    let process = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Ident("process".to_string()))
        .expect("process token");

    let file = parse_source(source).unwrap();
    let stmt = statements(&file)[0];
    assert_eq!(stmt.span.line, process.span.line);
    assert_eq!(stmt.span.column, process.span.column);
    assert_eq!((stmt.line(), process.span.column), (3, 3));
}

#[test]
fn test_config_parses() {
    let file = parse_source(CONFIG).unwrap();
    let scopes: Vec<&str> = statements(&file)
        .into_iter()
        .map(|stmt| top_call(stmt).method.as_str())
        .collect();
    assert_eq!(scopes, vec!["params", "process", "profiles"]);
}

#[test]
fn test_functions_and_statements_are_separated() {
    let source = "def greet(name) {\n    \"hello ${name}\"\n}\n\nworkflow {\n    greet('x')\n}\n";
    let file = parse_source(source).unwrap();
    assert_eq!(file.functions().count(), 1);
    assert_eq!(statements(&file).len(), 1);
    assert!(matches!(file.items[0], Item::Function(_)));
}

#[test]
fn test_syntax_error_carries_location() {
    let source = "workflow {\n    FOO(\n}\n";
    let err = parse_source(source).unwrap_err();
    let span = err.span();

    let syntax = err.into_syntax_error("main.nf");
    assert_eq!(syntax.file.to_str(), Some("main.nf"));
    assert_eq!((syntax.line, syntax.column), (span.line, span.column));
    assert!(syntax.line >= 2);
    assert!(syntax
        .to_string()
        .starts_with(&format!("syntax error at main.nf:{}:{}: ", syntax.line, syntax.column)));
}
