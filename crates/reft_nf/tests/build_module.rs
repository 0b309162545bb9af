//! End-to-end module builds over realistic pipeline sources.

use pretty_assertions::assert_eq;
use reft_nf::{
    Container, ConfigFile, DirectiveKind, InputKind, ModuleBuilder, ModuleError, OutputKind,
    ScriptKind,
};
use std::fs;

const MAIN_NF: &str = r#"#!/usr/bin/env nextflow
nextflow.enable.dsl = 2

include { FASTQC  } from './modules/nf-core/fastqc/main'
include { MULTIQC as MULTIQC_RUN } from './modules/nf-core/multiqc/main'

params.input = null

process SAMTOOLS_SORT {
    tag "$meta.id"
    label 'process_medium'
    memory 6.GB
    cpus 4
    publishDir "${params.outdir}/samtools", mode: 'copy'
    container "${ workflow.containerEngine == 'singularity' && !task.ext.singularity_pull_docker_container ?
        'https://depot.galaxyproject.org/singularity/samtools:1.17--h00cdaf9_0' :
        'biocontainers/samtools:1.17--h00cdaf9_0' }"

    input:
    tuple val(meta), path(bam)
    path fasta

    output:
    tuple val(meta), path("*.bam"), emit: bam
    path "versions.yml"           , emit: versions

    when:
    task.ext.when == null || task.ext.when

    script:
    def prefix = task.ext.prefix ?: "${meta.id}"
    """
    samtools sort -@ $task.cpus -o ${prefix}.bam $bam
    """
}

workflow PIPELINE {
    take:
    reads

    main:
    FASTQC(reads)
    SAMTOOLS_SORT(reads, params.fasta)

    emit:
    bam = SAMTOOLS_SORT.out.bam
}

workflow {
    PIPELINE(Channel.fromPath(params.input))
}
"#;

#[test]
fn test_pipeline_module() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.nf");
    fs::write(&path, MAIN_NF).unwrap();

    let module = ModuleBuilder::new(&path).build_file().unwrap();
    assert_eq!(module.path, path);
    assert_eq!(module.dsl_version, 2);

    let includes: Vec<_> = module
        .includes
        .iter()
        .map(|i| (i.line, i.module_path.as_str(), i.items[0].alias.as_deref()))
        .collect();
    assert_eq!(
        includes,
        vec![
            (4, "./modules/nf-core/fastqc/main", None),
            (5, "./modules/nf-core/multiqc/main", Some("MULTIQC_RUN")),
        ]
    );

    let params: Vec<_> = module.params.iter().map(|p| (p.name.as_str(), p.line)).collect();
    assert_eq!(params, vec![("input", 7), ("outdir", 14), ("fasta", 43)]);

    let process = module.process("SAMTOOLS_SORT").unwrap();
    assert_eq!(process.line, 9);
    let names: Vec<_> = process.directives.iter().map(|d| d.name()).collect();
    assert_eq!(
        names,
        vec!["tag", "label", "memory", "cpus", "publishDir", "container"]
    );
    let DirectiveKind::Memory(memory) = &process.directives[2].kind else {
        panic!("expected memory");
    };
    assert_eq!(memory.gigabytes(), 6.0);
    let DirectiveKind::PublishDir(publish) = &process.directives[4].kind else {
        panic!("expected publishDir");
    };
    assert_eq!(publish.mode.as_deref(), Some("copy"));

    assert!(matches!(process.inputs[0].kind, InputKind::Tuple { .. }));
    assert!(matches!(process.inputs[1].kind, InputKind::Path { ref path, .. } if path == "fasta"));
    assert!(matches!(process.outputs[0].kind, OutputKind::Tuple { .. }));
    assert_eq!(process.outputs[1].emit.as_deref(), Some("versions"));
    assert_eq!(process.script_kind, Some(ScriptKind::Script));
    assert!(process.when.is_some());

    let named = module.workflow("PIPELINE").unwrap();
    assert_eq!(named.takes, vec!["reads"]);
    assert_eq!(named.emits, vec!["bam"]);
    assert_eq!(named.body.len(), 2);
    let entry = module.workflow("").unwrap();
    assert!(entry.takes.is_empty());
}

#[test]
fn test_directive_and_io_lines_increase() {
    let module = ModuleBuilder::new("main.nf").build_source(MAIN_NF).unwrap();
    for process in &module.processes {
        let inputs: Vec<u32> = process.inputs.iter().map(|i| i.line).collect();
        let outputs: Vec<u32> = process.outputs.iter().map(|o| o.line).collect();
        let directives: Vec<u32> = process.directives.iter().map(|d| d.line).collect();
        assert!(inputs.windows(2).all(|w| w[0] < w[1]));
        assert!(outputs.windows(2).all(|w| w[0] < w[1]));
        assert!(directives.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn test_unbalanced_container_quotes() {
    let source = "process FOO {\n    container \"ubuntu\"latest\"\"\n    script:\n    \"\"\"\n    echo\n    \"\"\"\n}\n";
    let err = ModuleBuilder::new("foo.nf").build_source(source).unwrap_err();
    let ModuleError::Syntax(syntax) = err else {
        panic!("expected a syntax error, got {:?}", err);
    };
    assert_eq!(syntax.message, "too many quotes found when specifying container");
    assert_eq!((syntax.line, syntax.column), (2, 15));
    assert_eq!(syntax.file.to_str(), Some("foo.nf"));
}

#[test]
fn test_ternary_container() {
    let source = "process FOO {\n    container \"${ workflow.containerEngine == 'singularity' ? 'https://depot.galaxyproject.org/singularity/x:1.0' : 'org/x:1.0' }\"\n}\n";
    let module = ModuleBuilder::new("foo.nf").build_source(source).unwrap();
    let DirectiveKind::Container(container) = &module.processes[0].directives[0].kind else {
        panic!("expected container");
    };
    assert!(matches!(container, Container::Ternary { .. }));
    assert_eq!(
        container.names(),
        vec!["https://depot.galaxyproject.org/singularity/x:1.0", "org/x:1.0"]
    );
}

#[test]
fn test_bad_memory_unit() {
    let err = ModuleBuilder::new("p.nf")
        .build_source("process P { memory '3 GBB' }")
        .unwrap_err();
    assert!(err.to_string().contains("unknown memory unit: GBB"));
}

#[test]
fn test_workflow_sections() {
    let module = ModuleBuilder::new("w.nf")
        .build_source("workflow { take: x; y; main: P(x,y); emit: out = P.out }")
        .unwrap();
    let wf = &module.workflows[0];
    assert_eq!(wf.takes, vec!["x", "y"]);
    assert_eq!(wf.emits, vec!["out"]);
    assert!(wf.errors.is_empty());

    let module = ModuleBuilder::new("w.nf")
        .build_source("workflow { take: x; y; emit: out = P.out; main: P(x,y) }")
        .unwrap();
    assert_eq!(
        module.workflows[0].errors,
        vec!["main: cannot come after emit:".to_string()]
    );
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModuleBuilder::new(dir.path().join("absent.nf"))
        .build_file()
        .unwrap_err();
    assert!(matches!(err, ModuleError::Io { .. }));
}

#[test]
fn test_json_projection() {
    let module = ModuleBuilder::new("main.nf").build_source(MAIN_NF).unwrap();
    let json = serde_json::to_value(&module).unwrap();
    assert_eq!(json["dsl_version"], 2);
    let directive = &json["processes"][0]["directives"][2];
    assert_eq!(directive["type"], "memory");
    assert_eq!(directive["line"], 12);
    assert_eq!(json["processes"][0]["directives"][5]["format"], "ternary");
    assert!(json.get("ast").is_none());
}

#[test]
fn test_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("base.config");
    fs::write(
        &path,
        "process {\n    cpus   = { check_max( 1    * task.attempt, 'cpus'   ) }\n    withLabel:process_single {\n        memory = { check_max( 6.GB * task.attempt, 'memory' ) }\n    }\n}\n",
    )
    .unwrap();
    let config = ConfigFile::from_file(&path).unwrap();
    assert_eq!(config.process_scopes[0].directives[0].name, "cpus");
    assert_eq!(config.process_scopes[0].named_scopes[0].name, "process_single");
    assert!(config.params.is_empty());
}
